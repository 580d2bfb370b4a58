use std::{fs::File, time::Duration};

use anyhow::{ensure, Context};
use serde::Deserialize;
use ticker_grid::{
    poll::{DEFAULT_ERROR_TEXT, DEFAULT_UPDATE_TIME},
    PollConfig, DEFAULT_COLUMNS,
};
use toolset::{deser_duration_from_integer, deser_url};
use url::Url;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "deser_url")]
    pub api_host: Url,
    /// Milliseconds between ticker refreshes.
    #[serde(deserialize_with = "deser_duration_from_integer")]
    pub update_time: Duration,
    pub columns: usize,
    pub error_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: Url::parse(poloniex::DEFAULT_API_HOST)
                .expect("default api host is a valid url"),
            update_time: DEFAULT_UPDATE_TIME,
            columns: DEFAULT_COLUMNS,
            error_text: DEFAULT_ERROR_TEXT.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let config: Config = match path {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("Cannot open {path}"))?;
                serde_yaml::from_reader(file).with_context(|| format!("Cannot parse {path}"))?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.columns >= 2, "columns must be at least 2, got {}", self.columns);
        ensure!(!self.update_time.is_zero(), "update_time must be positive");
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            update_time: self.update_time,
            columns: self.columns,
            error_text: self.error_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.api_host.as_str(), "https://poloniex.com/");
        assert_eq!(config.update_time, Duration::from_millis(5000));
        assert_eq!(config.columns, 3);
        assert_eq!(config.error_text, "Ошибка");
    }

    #[test]
    fn overrides() {
        let raw = "api_host: http://localhost:8080\nupdate_time: 1500\nerror_text: Error\n";
        let config: Config = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.api_host.as_str(), "http://localhost:8080/");
        assert_eq!(config.poll_config().update_time, Duration::from_millis(1500));
        assert_eq!(config.poll_config().error_text, "Error");
        assert_eq!(config.poll_config().columns, 3);
    }

    #[test]
    fn validation() {
        let config: Config = serde_yaml::from_str("columns: 1").unwrap();
        assert!(config.validate().is_err());

        let config: Config = serde_yaml::from_str("update_time: 0").unwrap();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn missing_file() {
        assert!(Config::load(Some("/definitely/not/here.yaml")).is_err());
        assert!(Config::load(None).is_ok());
    }
}
