// Calendar resampling of daily bars into weekly / monthly bars.
use shared::models::{Bar, Timeframe};
use shared::utils::period_end;

use crate::error::EngineError;

/// Aggregates ordered daily bars into `timeframe` buckets.
///
/// Each output bar is dated at its bucket's period end. Open comes from the
/// first bar in the bucket and Close from the last. High and Low are the
/// extremes, and Volume is the sum. Only buckets that contain bars are
/// emitted. `Timeframe::Daily` returns the input unchanged.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Result<Vec<Bar>, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptyInputError(format!("cannot resample zero bars to {}", timeframe)));
    }
    if timeframe == Timeframe::Daily {
        return Ok(bars.to_vec());
    }

    let mut aggregated: Vec<Bar> = Vec::new();
    let mut current_bucket: Option<Bar> = None;

    for bar in bars {
        let bucket_end = period_end(bar.date, timeframe).ok_or_else(|| {
            EngineError::ProcessingError(format!("no {} period end for {}", timeframe, bar.date))
        })?;

        match current_bucket {
            Some(ref mut agg) if agg.date == bucket_end => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume = agg.volume.saturating_add(bar.volume);
            }
            _ => {
                // New bucket - save current and start new
                if let Some(done) = current_bucket.replace(Bar { date: bucket_end, ..*bar }) {
                    aggregated.push(done);
                }
            }
        }
    }

    if let Some(last) = current_bucket {
        aggregated.push(last);
    }

    tracing::debug!(
        %timeframe,
        input_bars = bars.len(),
        output_bars = aggregated.len(),
        "Resampled series"
    );
    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Weekday};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
        Bar::new(date, open, high, low, close, volume)
    }

    // Weekdays from 2024-01-01 (Monday) for `days` calendar days.
    fn weekday_bars(days: u64) -> Vec<Bar> {
        (0..days)
            .map(|i| d(2024, 1, 1) + chrono::Days::new(i))
            .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
            .enumerate()
            .map(|(i, date)| {
                let base = 100.0 + i as f64;
                bar(date, base, base + 2.0 + (i % 3) as f64, base - 1.0 - (i % 2) as f64, base + 0.5, 1_000 + i as u64)
            })
            .collect()
    }

    #[test]
    fn daily_is_identity() {
        let bars = weekday_bars(20);
        assert_eq!(resample(&bars, Timeframe::Daily).unwrap(), bars);
    }

    #[test]
    fn empty_input_is_an_error() {
        for timeframe in [Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly] {
            let err = resample(&[], timeframe).unwrap_err();
            assert!(matches!(err, EngineError::EmptyInputError(_)));
        }
    }

    #[test]
    fn weekly_aggregates_ohlcv() {
        let bars = vec![
            bar(d(2024, 1, 2), 10.0, 12.0, 9.0, 11.0, 100),  // Tue
            bar(d(2024, 1, 3), 11.0, 15.0, 10.0, 14.0, 200), // Wed
            bar(d(2024, 1, 5), 14.0, 14.5, 8.0, 13.0, 300),  // Fri
            bar(d(2024, 1, 8), 13.0, 13.5, 12.0, 12.5, 50),  // next Mon
        ];
        let weekly = resample(&bars, Timeframe::Weekly).unwrap();
        assert_eq!(
            weekly,
            vec![
                bar(d(2024, 1, 7), 10.0, 15.0, 8.0, 13.0, 600),
                bar(d(2024, 1, 14), 13.0, 13.5, 12.0, 12.5, 50),
            ]
        );
    }

    #[test]
    fn weekly_buckets_respect_constituents() {
        let bars = weekday_bars(60);
        let weekly = resample(&bars, Timeframe::Weekly).unwrap();
        assert!(weekly.len() <= (bars.len() + 4) / 5 + 1);

        for week in &weekly {
            let members: Vec<&Bar> = bars
                .iter()
                .filter(|b| period_end(b.date, Timeframe::Weekly) == Some(week.date))
                .collect();
            assert!(!members.is_empty());
            let max_high = members.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let min_low = members.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            assert!(week.high >= max_high);
            assert!(week.low <= min_low);
            assert_eq!(week.open, members[0].open);
            assert_eq!(week.close, members[members.len() - 1].close);
            assert_eq!(week.volume, members.iter().map(|b| b.volume).sum::<u64>());
        }
    }

    #[test]
    fn monthly_skips_empty_months() {
        // Nothing in February: no zero-filled February bar
        let bars = vec![
            bar(d(2024, 1, 30), 1.0, 2.0, 0.5, 1.5, 10),
            bar(d(2024, 1, 31), 1.5, 3.0, 1.0, 2.5, 20),
            bar(d(2024, 3, 1), 2.5, 2.6, 2.0, 2.2, 30),
        ];
        let monthly = resample(&bars, Timeframe::Monthly).unwrap();
        assert_eq!(
            monthly,
            vec![
                bar(d(2024, 1, 31), 1.0, 3.0, 0.5, 2.5, 30),
                bar(d(2024, 3, 31), 2.5, 2.6, 2.0, 2.2, 30),
            ]
        );
    }

    #[test]
    fn trailing_partial_week_is_kept() {
        let bars = vec![
            bar(d(2024, 1, 5), 1.0, 1.0, 1.0, 1.0, 1),
            bar(d(2024, 1, 8), 2.0, 2.0, 2.0, 2.0, 1),
        ];
        let weekly = resample(&bars, Timeframe::Weekly).unwrap();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[1].date, d(2024, 1, 14));
    }

    #[test]
    fn volume_sum_saturates() {
        let bars = vec![
            bar(d(2024, 1, 2), 1.0, 1.0, 1.0, 1.0, u64::MAX),
            bar(d(2024, 1, 3), 1.0, 1.0, 1.0, 1.0, 10),
        ];
        let weekly = resample(&bars, Timeframe::Weekly).unwrap();
        assert_eq!(weekly[0].volume, u64::MAX);
    }
}
