// Pairwise close-price correlation across instruments (heatmap data).
use std::collections::HashMap;

use chrono::NaiveDate;
use shared::models::{CorrelationMatrix, TimeSeries};

/// Pearson correlation of Close for every pair of `series`.
///
/// Each pair uses only the dates both instruments trade on. A pair with fewer
/// than two shared dates, or with a constant close on either side, is `None`.
pub fn correlation_matrix(series: &[TimeSeries]) -> CorrelationMatrix {
    let symbols: Vec<String> = series.iter().map(|s| s.symbol.clone()).collect();
    let by_date: Vec<HashMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| s.bars.iter().map(|b| (b.date, b.close)).collect())
        .collect();

    let n = series.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = diagonal(&series[i]);
        for j in (i + 1)..n {
            let (xs, ys) = aligned_closes(&series[i], &by_date[j]);
            let r = pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    tracing::debug!(instruments = n, "Computed correlation matrix");
    CorrelationMatrix { symbols, values }
}

fn diagonal(series: &TimeSeries) -> Option<f64> {
    let closes: Vec<f64> = series.closes().collect();
    pearson(&closes, &closes).map(|_| 1.0)
}

fn aligned_closes(left: &TimeSeries, right: &HashMap<NaiveDate, f64>) -> (Vec<f64>, Vec<f64>) {
    left.bars
        .iter()
        .filter_map(|b| right.get(&b.date).map(|&other| (b.close, other)))
        .unzip()
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    // Rounding can push |r| a hair past 1.
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
