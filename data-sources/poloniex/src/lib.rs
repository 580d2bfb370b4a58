use tracing::{debug, warn};
use url::Url;

use crate::protocol::{PublicQuery, Response};

pub mod error;
pub mod protocol;
pub mod ticker;

pub use error::Error;
pub use ticker::{TickerRecord, TickerSnapshot};

pub const DEFAULT_API_HOST: &str = "https://poloniex.com";

/// Decodes a `returnTicker` body. An `error` key at the top level
/// short-circuits into [`Error::Api`] with the whole payload.
pub fn parse_ticker(text: &str) -> Result<TickerSnapshot, Error> {
    let response = serde_json::from_str::<Response<TickerSnapshot>>(text)
        .map_err(|e| Error::Decode(e, text.to_string()))?;

    response.into_result().map_err(|payload| {
        warn!(%payload, "Poloniex answered with an error");
        Error::Api(payload)
    })
}

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    api_host: Url,
}

impl Default for Client {
    fn default() -> Self {
        let api_host = Url::parse(DEFAULT_API_HOST).expect("default api host is a valid url");
        Self::new(api_host)
    }
}

impl Client {
    pub fn new(api_host: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_host,
        }
    }

    pub fn api_host(&self) -> &Url {
        &self.api_host
    }

    fn ticker_url(&self) -> Result<Url, Error> {
        let mut url = self.api_host.join("/public")?;
        let qs = serde_qs::to_string(&PublicQuery::return_ticker())?;
        url.set_query(Some(&qs));
        Ok(url)
    }

    /// Single attempt: no retry, no backoff, no timeout of our own.
    pub async fn fetch_ticker(&self) -> Result<TickerSnapshot, Error> {
        let url = self.ticker_url()?;
        debug!(%url, "Fetch ticker");

        let text = self.http.get(url).send().await?.text().await?;
        let snapshot = parse_ticker(&text)?;

        debug!(symbols = snapshot.len(), "Ticker fetched");
        Ok(snapshot)
    }
}

pub async fn fetch_ticker(api_host: Url) -> Result<TickerSnapshot, Error> {
    Client::new(api_host).fetch_ticker().await
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PAIRS: &str = r#"{
        "BTC_ETH": {"id": 148, "last": "0.07612000", "lowestAsk": "0.07613000",
            "highestBid": "0.07608000", "percentChange": "0.01144230",
            "baseVolume": "312.04159813", "quoteVolume": "4104.12823071",
            "isFrozen": "0", "postOnly": "0", "high24hr": "0.07700000", "low24hr": "0.07450000"},
        "USDT_BTC": {"id": "121", "last": "19211.00000000", "lowestAsk": "19215.10000000",
            "highestBid": "19211.00000000", "percentChange": "-0.00312000",
            "baseVolume": "2113459.14", "quoteVolume": "110.03", "isFrozen": "0",
            "postOnly": "0", "high24hr": "19400.00000000", "low24hr": "19001.00000000"}
    }"#;

    #[test]
    fn parse_snapshot() {
        let snapshot = parse_ticker(TWO_PAIRS).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["USDT_BTC"].last, "19211.00000000");
        assert_eq!(snapshot["BTC_ETH"].id, "148");
    }

    #[test]
    fn parse_empty_snapshot() {
        let snapshot = parse_ticker("{}").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn error_payload_short_circuits() {
        let err = parse_ticker(r#"{"error": "Invalid command."}"#).unwrap_err();
        match err {
            Error::Api(payload) => assert_eq!(payload["error"], "Invalid command."),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = parse_ticker("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Decode(_, body) if body.contains("bad gateway")));
    }

    #[test]
    fn ticker_url_has_command() {
        let client = Client::default();
        let url = client.ticker_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://poloniex.com/public?command=returnTicker"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let host = Url::parse("http://127.0.0.1:9").unwrap();
        let err = fetch_ticker(host).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
