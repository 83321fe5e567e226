use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use super::indicator::PriceField;

/// A single OHLCV bar. Timestamps are timezone-naive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }
}

/// All bars for all symbols, grouped per symbol and sorted by timestamp.
///
/// Iteration order is `(symbol, timestamp)` ascending and each
/// `(symbol, timestamp)` pair appears at most once.
#[derive(Debug, Clone, Default)]
pub struct BarTable {
    series: BTreeMap<String, Vec<Bar>>,
}

impl BarTable {
    /// Build a table from rows in any order. Duplicate `(symbol, timestamp)`
    /// rows keep the first occurrence.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Bar)>,
    {
        let mut series: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        for (symbol, bar) in rows {
            series.entry(symbol).or_default().push(bar);
        }
        for bars in series.values_mut() {
            // Stable sort keeps input order among equal timestamps
            bars.sort_by_key(|b| b.timestamp);
            bars.dedup_by_key(|b| b.timestamp);
        }
        BarTable { series }
    }

    /// Bars of one symbol, empty if the symbol is unknown.
    pub fn symbol(&self, symbol: &str) -> &[Bar] {
        self.series.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// History of `symbol` up to and including `end`, plus the index range of
    /// the rows falling in `[start, end]`.
    ///
    /// An `end` at midnight is a date and covers that whole day, so intraday
    /// bars of the last day stay in the window.
    pub fn window(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> (&[Bar], Range<usize>) {
        let bars = self.symbol(symbol);
        let hi = if end.time() == NaiveTime::MIN {
            match end.checked_add_signed(TimeDelta::days(1)) {
                Some(next_day) => bars.partition_point(|b| b.timestamp < next_day),
                None => bars.len(),
            }
        } else {
            bars.partition_point(|b| b.timestamp <= end)
        };
        let lo = bars[..hi].partition_point(|b| b.timestamp < start);
        (&bars[..hi], lo..hi)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bar)> {
        self.series
            .iter()
            .flat_map(|(symbol, bars)| bars.iter().map(move |b| (symbol.as_str(), b)))
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(Vec::is_empty)
    }
}
