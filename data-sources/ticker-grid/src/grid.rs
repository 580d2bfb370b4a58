use std::collections::HashSet;

use poloniex::{TickerRecord, TickerSnapshot};
use serde::Serialize;

pub const DEFAULT_COLUMNS: usize = 3;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    pub label: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub symbol: String,
    #[serde(flatten)]
    pub record: TickerRecord,
}

/// One cell of the fixed-column list. Headers are a layout trick: every
/// visual row starts with one, their labels only need to be unique keys.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayRow {
    Header(HeaderRow),
    Data(DataRow),
}

impl DisplayRow {
    fn header(n: usize) -> Self {
        DisplayRow::Header(HeaderRow {
            label: format!("#head-{n}"),
        })
    }

    pub fn is_header(&self) -> bool {
        matches!(self, DisplayRow::Header(_))
    }

    /// Unique list key. Header labels start with `#`, symbols never do.
    pub fn key(&self) -> &str {
        match self {
            DisplayRow::Header(h) => &h.label,
            DisplayRow::Data(d) => &d.symbol,
        }
    }

    pub fn as_data(&self) -> Option<&DataRow> {
        match self {
            DisplayRow::Data(d) => Some(d),
            DisplayRow::Header(_) => None,
        }
    }
}

/// Flattens a snapshot into grid order: symbols ascending, a leading header,
/// then one more header before every `columns - 1` data rows that follow.
pub fn shape_for_grid(snapshot: TickerSnapshot, columns: usize) -> Vec<DisplayRow> {
    let group = columns.saturating_sub(1).max(1);

    let mut pairs: Vec<(String, TickerRecord)> = snapshot.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut rows = Vec::with_capacity(1 + pairs.len() + pairs.len() / group);
    let mut headers = 0;
    rows.push(DisplayRow::header(headers));

    for (i, (symbol, record)) in pairs.into_iter().enumerate() {
        if i > 0 && i % group == 0 {
            headers += 1;
            rows.push(DisplayRow::header(headers));
        }
        rows.push(DisplayRow::Data(DataRow { symbol, record }));
    }

    rows
}

fn displayed_fields(record: &TickerRecord) -> (&str, &str, &str) {
    (&record.last, &record.highest_bid, &record.percent_change)
}

/// Symbols whose visible fields differ from the previous frame. New symbols
/// count as changed.
pub fn changed_symbols(previous: &[DisplayRow], next: &[DisplayRow]) -> HashSet<String> {
    let before = previous
        .iter()
        .filter_map(DisplayRow::as_data)
        .map(|d| (d.symbol.as_str(), displayed_fields(&d.record)))
        .collect::<std::collections::HashMap<_, _>>();

    next.iter()
        .filter_map(DisplayRow::as_data)
        .filter(|d| before.get(d.symbol.as_str()) != Some(&displayed_fields(&d.record)))
        .map(|d| d.symbol.clone())
        .collect()
}
