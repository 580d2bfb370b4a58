use async_trait::async_trait;
use poloniex::TickerSnapshot;

#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch_ticker(&self) -> Result<TickerSnapshot, poloniex::Error>;
}

#[async_trait]
impl TickerSource for poloniex::Client {
    async fn fetch_ticker(&self) -> Result<TickerSnapshot, poloniex::Error> {
        poloniex::Client::fetch_ticker(self).await
    }
}
