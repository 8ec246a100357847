// Relative Strength Index (RSI) indicator implementation
//
// Average gain and average loss are plain trailing means over `window` price
// changes (not Wilder's smoothing), so the first value lands at index `window`.
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Bar;

pub struct Rsi {
    name: String,
    window: usize,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("RSI({})", window),
            window,
        }
    }
}

/// RSI from average gain and loss. No losses means RSI 100, including a flat window.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "window": self.window })
    }

    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        if self.window == 0 || data.len() <= self.window {
            return vec![None; data.len()];
        }

        // deltas[k] is the change into bar k + 1
        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1].close - w[0].close;
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let window = self.window as f64;
        let mut results = vec![None; self.window]; // bar 0 has no change, then window - 1 partial windows
        results.extend(gains.windows(self.window).zip(losses.windows(self.window)).map(|(g, l)| {
            let avg_gain = g.iter().sum::<f64>() / window;
            let avg_loss = l.iter().sum::<f64>() / window;
            Some(rsi_from_averages(avg_gain, avg_loss))
        }));
        results
    }
}
