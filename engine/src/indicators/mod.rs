// Technical indicators module
pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::Ema;
pub use rsi::Rsi;
pub use sma::Sma;

use serde_json::Value;
use shared::models::{Bar, Indicator, IndicatorSpec};

use crate::error::EngineError;

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    // One entry per bar; None where the indicator is undefined (not enough history)
    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>>;

    fn to_indicator(&self, data: &[Bar]) -> Indicator {
        Indicator {
            name: self.name().to_string(),
            parameters: self.parameters(),
            values: self.calculate(data),
        }
    }
}

/// Builds the calculator for `spec`, rejecting zero-length lookbacks.
pub fn build_calculator(spec: &IndicatorSpec) -> Result<Box<dyn IndicatorCalculator>, EngineError> {
    if spec.lookback() == 0 {
        return Err(EngineError::IndicatorError(format!("{} has a lookback of 0", spec)));
    }
    let calculator: Box<dyn IndicatorCalculator> = match *spec {
        IndicatorSpec::Sma { window } => Box::new(Sma::new(window)),
        IndicatorSpec::Ema { span } => Box::new(Ema::new(span)),
        IndicatorSpec::Rsi { window } => Box::new(Rsi::new(window)),
    };
    Ok(calculator)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Days, NaiveDate};
    use shared::models::Bar;

    /// Consecutive-day bars with flat OHLC at each close.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar::from_close(start + Days::new(i as u64), close))
            .collect()
    }

    pub fn assert_values_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
        assert_eq!(actual.len(), expected.len(), "Vectors differ in length");
        for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            match (a, e) {
                (None, None) => {}
                (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, a, e),
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, a, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::bars_from_closes;

    #[test]
    fn builds_named_calculators() {
        let sma = build_calculator(&IndicatorSpec::Sma { window: 50 }).unwrap();
        let ema = build_calculator(&IndicatorSpec::Ema { span: 20 }).unwrap();
        let rsi = build_calculator(&IndicatorSpec::Rsi { window: 14 }).unwrap();
        assert_eq!(sma.name(), "SMA(50)");
        assert_eq!(ema.name(), "EMA(20)");
        assert_eq!(rsi.name(), "RSI(14)");
        assert_eq!(ema.parameters(), serde_json::json!({ "span": 20 }));
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let err = build_calculator(&IndicatorSpec::Rsi { window: 0 }).err().unwrap();
        assert!(matches!(err, EngineError::IndicatorError(_)));
    }

    #[test]
    fn to_indicator_keeps_bar_alignment() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        let indicator = Sma::new(2).to_indicator(&bars);
        assert_eq!(indicator.name, "SMA(2)");
        assert_eq!(indicator.values.len(), bars.len());
    }
}
