// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Bar;

pub struct Ema {
    name: String,
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            name: format!("EMA({})", span),
            span,
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "span": self.span })
    }

    // Recursive form seeded at the first close (no bias correction):
    //   EMA[0] = close[0]
    //   EMA[i] = alpha * close[i] + (1 - alpha) * EMA[i-1]
    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        if self.span == 0 || data.len() < self.span {
            return vec![None; data.len()];
        }

        let alpha = self.alpha();
        let mut results = Vec::with_capacity(data.len());
        let mut previous_ema = data[0].close;
        results.push(Some(previous_ema));

        for bar in &data[1..] {
            let ema = alpha * bar.close + (1.0 - alpha) * previous_ema;
            results.push(Some(ema));
            previous_ema = ema;
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_values_close, bars_from_closes};

    #[test]
    fn test_ema_calculation() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0]);
        let results = Ema::new(3).calculate(&bars);
        // alpha = 0.5: 0.5*20 + 0.5*10 = 15; 0.5*30 + 0.5*15 = 22.5
        assert_eq!(results, vec![Some(10.0), Some(15.0), Some(22.5)]);
    }

    #[test]
    fn test_ema_seeds_at_first_value() {
        // The bias-corrected form would give 16.666.. at index 1; the recursive one gives 15.
        let bars = bars_from_closes(&[10.0, 20.0, 30.0, 40.0]);
        let results = Ema::new(3).calculate(&bars);
        assert_values_close(&results, &[Some(10.0), Some(15.0), Some(22.5), Some(31.25)]);
    }

    #[test]
    fn test_ema_span_longer_than_series() {
        let bars = bars_from_closes(&[10.0, 20.0]);
        let results = Ema::new(5).calculate(&bars);
        assert_eq!(results, vec![None, None]);
    }

    #[test]
    fn test_ema_span_one_tracks_close() {
        let bars = bars_from_closes(&[3.0, 7.0, 5.0]);
        let results = Ema::new(1).calculate(&bars);
        assert_eq!(results, vec![Some(3.0), Some(7.0), Some(5.0)]);
    }

    #[test]
    fn test_ema_alpha() {
        assert_eq!(Ema::new(3).alpha(), 0.5);
        assert!((Ema::new(20).alpha() - 2.0 / 21.0).abs() < 1e-15);
    }
}
