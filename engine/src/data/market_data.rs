// In-memory per-symbol store of daily series, feeding the pipeline.
use std::collections::{BTreeMap, HashMap};

use shared::models::{DateRange, TimeSeries};

pub struct MarketDataStore {
    // Daily bars per symbol, kept sorted and unique by date
    data: HashMap<String, TimeSeries>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore { data: HashMap::new() }
    }

    /// Merges `series` into what is already stored for its symbol.
    /// On a date clash the bar that was stored first wins.
    pub fn add_series(&mut self, series: TimeSeries) {
        let symbol = series.symbol.clone();
        let stored = self
            .data
            .entry(symbol.clone())
            .or_insert_with(|| TimeSeries::new(symbol.clone(), Vec::new()));

        stored.bars.extend(series.bars);
        stored.bars.sort_by_key(|b| b.date);
        stored.bars.dedup_by_key(|b| b.date);

        tracing::debug!(symbol = %symbol, bars = stored.bars.len(), "Stored series");
    }

    pub fn get_series(&self, symbol: &str, range: &DateRange) -> Option<TimeSeries> {
        self.data.get(symbol).map(|series| {
            TimeSeries::new(
                series.symbol.clone(),
                series.bars.iter().filter(|b| range.contains(b.date)).copied().collect(),
            )
        })
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Collects the requested symbols into a pipeline batch.
    ///
    /// A symbol the store does not hold still gets an entry, with no bars, so
    /// the pipeline reports it next to the others instead of aborting the batch.
    pub fn to_batch(&self, symbols: &[String], range: &DateRange) -> BTreeMap<String, TimeSeries> {
        symbols
            .iter()
            .map(|symbol| {
                let series = self.get_series(symbol, range).unwrap_or_else(|| {
                    tracing::warn!(symbol = %symbol, "Symbol not found in loaded data");
                    TimeSeries::new(symbol.clone(), Vec::new())
                });
                (symbol.clone(), series)
            })
            .collect()
    }
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::models::Bar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn store_with(symbol: &str, days: &[(u32, f64)]) -> MarketDataStore {
        let mut store = MarketDataStore::new();
        let bars = days.iter().map(|&(day, close)| Bar::from_close(d(day), close)).collect();
        store.add_series(TimeSeries::new(symbol, bars));
        store
    }

    #[test]
    fn add_series_merges_sorts_and_dedups() {
        let mut store = store_with("INFY.NS", &[(3, 3.0), (1, 1.0)]);
        store.add_series(TimeSeries::new(
            "INFY.NS",
            vec![Bar::from_close(d(2), 2.0), Bar::from_close(d(3), 99.0)],
        ));

        let series = store.get_series("INFY.NS", &DateRange::default()).unwrap();
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn get_series_applies_range() {
        let store = store_with("TCS.NS", &[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        let series = store.get_series("TCS.NS", &DateRange::new(Some(d(2)), Some(d(3)))).unwrap();
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![2.0, 3.0]);
        assert!(store.get_series("MISSING", &DateRange::default()).is_none());
    }

    #[test]
    fn to_batch_keeps_unknown_symbols_as_empty_series() {
        let mut store = store_with("B", &[(1, 1.0)]);
        store.add_series(TimeSeries::new("A", vec![Bar::from_close(d(1), 5.0)]));
        assert_eq!(store.symbols(), vec!["A", "B"]);

        let batch = store.to_batch(&["A".to_string(), "C".to_string()], &DateRange::default());
        assert_eq!(batch.keys().cloned().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(batch["A"].len(), 1);
        assert_eq!(batch["C"].symbol, "C");
        assert!(batch["C"].is_empty());
    }
}
