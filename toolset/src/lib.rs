use std::{borrow::Cow, time::Duration};

use serde::{de, Deserialize, Deserializer};
use url::Url;

pub fn deser_duration_from_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Duration, D::Error> {
    let number = <u64>::deserialize(deserializer)?;
    Ok(Duration::from_millis(number))
}

pub fn deser_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Url, D::Error> {
    let s = Cow::<str>::deserialize(deserializer)?;
    s.as_ref().parse().map_err(de::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Accepts either a JSON string or a JSON number and keeps its textual form.
/// Exchanges are not consistent about quoting ids and flags.
pub fn deser_string_from_any<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    let value = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Str(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
        StringOrNumber::Float(n) => n.to_string(),
    };
    Ok(value)
}
