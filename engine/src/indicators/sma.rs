// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Bar;

pub struct Sma {
    name: String,
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("SMA({})", window),
            window,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "window": self.window })
    }

    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        if self.window == 0 || data.len() < self.window {
            return vec![None; data.len()];
        }

        let closes: Vec<f64> = data.iter().map(|b| b.close).collect();
        let mut results = vec![None; self.window - 1]; // No SMA until the first full window

        // Each window is summed from scratch so the result never depends on
        // what was added and subtracted before it.
        results.extend(
            closes
                .windows(self.window)
                .map(|w| Some(w.iter().sum::<f64>() / self.window as f64)),
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_values_close, bars_from_closes};

    #[test]
    fn test_sma_calculation() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0, 40.0]);
        let results = Sma::new(3).calculate(&bars);
        assert_eq!(results, vec![None, None, Some(20.0), Some(30.0)]);
    }

    #[test]
    fn test_sma_trailing_only() {
        // A spike at the end must not leak into earlier values
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 1000.0]);
        let results = Sma::new(2).calculate(&bars);
        assert_values_close(&results, &[None, Some(1.5), Some(2.5), Some(3.5), Some(502.0)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let bars = bars_from_closes(&[1.0, 2.0]);
        let results = Sma::new(3).calculate(&bars);
        assert_eq!(results, vec![None, None]);
    }

    #[test]
    fn test_sma_window_equals_length() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        let results = Sma::new(3).calculate(&bars);
        assert_eq!(results, vec![None, None, Some(2.0)]);
    }

    #[test]
    fn test_sma_period_one() {
        // SMA(1) is just the close price
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        let results = Sma::new(1).calculate(&bars);
        assert_eq!(results, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_empty_data() {
        let results = Sma::new(3).calculate(&[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_sma_is_repeatable() {
        let bars = bars_from_closes(&[0.1, 0.2, 0.3, 0.7, 1.1, 0.9, 0.4]);
        let sma = Sma::new(3);
        let first = sma.calculate(&bars);
        let second = sma.calculate(&bars);
        let bits = |v: &[Option<f64>]| v.iter().map(|x| x.map(f64::to_bits)).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }
}
