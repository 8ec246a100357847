//! Resample-then-indicators pipeline.
//!
//! Every entry point is a pure function of its arguments: callers pass the
//! raw daily series together with a [`PipelineParams`] and get a freshly built
//! [`DerivedSeries`] back. Nothing is cached between calls.

pub mod resample;

pub use resample::resample;

use std::collections::BTreeMap;

use shared::models::{Bar, DerivedSeries, Indicator, IndicatorSelection, PipelineParams, TimeSeries};

use crate::error::EngineError;
use crate::indicators::build_calculator;

/// Checks the series invariants: strictly increasing dates and positive, finite prices.
pub fn validate_series(series: &TimeSeries) -> Result<(), EngineError> {
    for pair in series.bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(EngineError::UnorderedInputError(format!(
                "'{}' has {} after {}",
                series.symbol, pair[1].date, pair[0].date
            )));
        }
    }
    for bar in &series.bars {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(EngineError::InvalidBarError(format!(
                "'{}' on {} has a non-positive or non-finite price",
                series.symbol, bar.date
            )));
        }
    }
    Ok(())
}

/// Computes every enabled indicator against `bars`, in selection order.
pub fn compute_indicators(bars: &[Bar], selection: &IndicatorSelection) -> Result<Vec<Indicator>, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptyInputError("cannot compute indicators on zero bars".to_string()));
    }
    // Build every calculator first so a bad spec fails before any work is done.
    let calculators = selection.iter().map(build_calculator).collect::<Result<Vec<_>, _>>()?;
    Ok(calculators.iter().map(|calc| calc.to_indicator(bars)).collect())
}

/// Runs the full pipeline for one instrument: date filter, resample, indicators.
pub fn derive_series(series: &TimeSeries, params: &PipelineParams) -> Result<DerivedSeries, EngineError> {
    if series.is_empty() {
        return Err(EngineError::EmptyInputError(format!("series '{}' has no bars", series.symbol)));
    }
    validate_series(series)?;

    let filtered: Vec<Bar> = series
        .bars
        .iter()
        .filter(|b| params.date_range.contains(b.date))
        .copied()
        .collect();
    if filtered.is_empty() {
        return Err(EngineError::EmptyInputError(format!(
            "series '{}' has no bars in the selected range",
            series.symbol
        )));
    }

    let bars = resample(&filtered, params.timeframe)?;
    let indicators = compute_indicators(&bars, &params.indicators)?;

    tracing::debug!(
        symbol = %series.symbol,
        timeframe = %params.timeframe,
        bars = bars.len(),
        indicators = indicators.len(),
        "Derived series"
    );

    Ok(DerivedSeries {
        symbol: series.symbol.clone(),
        timeframe: params.timeframe,
        bars,
        indicators,
    })
}

/// Runs [`derive_series`] for each instrument independently.
///
/// A failure for one instrument is recorded under its key and never stops
/// the others.
pub fn derive_batch(
    inputs: &BTreeMap<String, TimeSeries>,
    params: &PipelineParams,
) -> BTreeMap<String, Result<DerivedSeries, EngineError>> {
    inputs
        .iter()
        .map(|(symbol, series)| {
            let result = derive_series(series, params);
            if let Err(e) = &result {
                if e.is_data_error() {
                    tracing::warn!(symbol = %symbol, error = %e, "Skipping instrument");
                } else {
                    tracing::error!(symbol = %symbol, error = %e, "Pipeline failed for instrument");
                }
            }
            (symbol.clone(), result)
        })
        .collect()
}
