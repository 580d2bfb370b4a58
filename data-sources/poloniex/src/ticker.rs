use std::{
    collections::HashMap,
    ops::Deref,
};

use serde::{Deserialize, Serialize};
use toolset::deser_string_from_any;

/// One instrument as `returnTicker` reports it. Values stay the decimal
/// strings the exchange sent.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TickerRecord {
    pub base_volume: String,
    pub high24hr: String,
    pub highest_bid: String,
    #[serde(deserialize_with = "deser_string_from_any")]
    pub id: String,
    pub is_frozen: String,
    pub last: String,
    pub low24hr: String,
    pub lowest_ask: String,
    pub percent_change: String,
    pub post_only: String,
    pub quote_volume: String,
}

/// Symbol (`BTC_ETH`) to ticker. Built once per fetch and never mutated.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TickerSnapshot(HashMap<String, TickerRecord>);

impl TickerSnapshot {
    pub fn into_inner(self) -> HashMap<String, TickerRecord> {
        self.0
    }
}

impl Deref for TickerSnapshot {
    type Target = HashMap<String, TickerRecord>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<HashMap<String, TickerRecord>> for TickerSnapshot {
    fn from(map: HashMap<String, TickerRecord>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, TickerRecord)> for TickerSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, TickerRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TickerSnapshot {
    type Item = (String, TickerRecord);
    type IntoIter = std::collections::hash_map::IntoIter<String, TickerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
