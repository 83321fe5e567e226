use std::ops::Range;

use crate::models::bar::Bar;
use crate::models::indicator::{IndicatorKind, IndicatorSpec};

/// One derived column, aligned row-for-row with the window bars it was
/// computed for. Warm-up rows are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Compute every indicator for the rows `window` of one symbol's `history`.
///
/// `history` must hold a single symbol's bars in timestamp order. Rows after
/// `window.end` are never read, so values carry no look-ahead; rows before
/// `window.start` only serve as warm-up.
pub fn compute_window(
    history: &[Bar],
    window: Range<usize>,
    specs: &[IndicatorSpec],
) -> Vec<IndicatorSeries> {
    let visible = &history[..window.end];
    specs
        .iter()
        .map(|spec| {
            let field = spec.parameters.source;
            let source: Vec<f64> = visible.iter().map(|b| b.price(field)).collect();
            let full = compute_indicator(spec, &source);
            IndicatorSeries {
                name: spec.column_name(),
                values: full[window.start..].to_vec(),
            }
        })
        .collect()
}

/// Compute one indicator over a price series.
pub fn compute_indicator(spec: &IndicatorSpec, data: &[f64]) -> Vec<f64> {
    let period = spec.parameters.period;
    match spec.name {
        IndicatorKind::SMA => sma(data, period),
        IndicatorKind::EMA => ema(data, period),
    }
}

// ── SMA ──

/// Simple Moving Average. First `period-1` values are NaN.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let len = data.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period {
        return result;
    }
    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..len {
        sum += data[i] - data[i - period];
        result[i] = sum / period as f64;
    }
    result
}

// ── EMA ──

/// Exponential Moving Average seeded with the SMA of the first `period`
/// values. First `period-1` values are NaN.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let len = data.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period {
        return result;
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed: f64 = data[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;
    for i in period..len {
        result[i] = (data[i] - result[i - 1]) * multiplier + result[i - 1];
    }
    result
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
