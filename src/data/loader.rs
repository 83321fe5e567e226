use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info};

use super::schema::{BAR_SCHEMA, WINDOW_SCHEMA};
use crate::errors::AppError;
use crate::models::bar::{Bar, BarTable};
use crate::models::config::GeneralConfig;
use crate::models::symbol::{span_around, SymbolWindow};

/// Suffix appended to the index file stem to locate the daily bars.
pub const BARS_SUFFIX: &str = "_data";
/// Suffix appended to the index file stem to locate the minute bars.
pub const MINUTE_SUFFIX: &str = "_min";

/// Files backing one data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub index: PathBuf,
    pub daily_bars: PathBuf,
    pub minute_bars: PathBuf,
}

impl DataSources {
    /// `data/default.feather` gives `data/default_data.feather` and
    /// `data/default_min.feather`.
    pub fn from_config(general: &GeneralConfig) -> Self {
        let index = general.data_path.join(&general.data_filename);
        DataSources {
            daily_bars: counterpart(&index, BARS_SUFFIX),
            minute_bars: counterpart(&index, MINUTE_SUFFIX),
            index,
        }
    }
}

/// Sibling file of `path` with `suffix` inserted before the extension.
pub fn counterpart(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.feather", stem, suffix))
}

/// Read a whole feather (Arrow IPC) file into memory.
pub fn read_feather(path: &Path) -> Result<DataFrame, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    let df = IpcReader::new(file).finish()?;
    debug!("Read {} rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Load and validate a bar table.
pub fn load_bars(path: &Path) -> Result<BarTable, AppError> {
    let df = read_feather(path)?;
    let table = bars_from_dataframe(&df)?;
    info!(
        "Loaded {} bars for {} symbols from {}",
        table.len(),
        table.symbols().count(),
        path.display()
    );
    Ok(table)
}

/// Validate a bar DataFrame and convert it into a sorted, de-duplicated table.
pub fn bars_from_dataframe(df: &DataFrame) -> Result<BarTable, AppError> {
    BAR_SCHEMA.validate(df)?;

    let tickers = required(text_values(df, "ticker")?, "ticker")?;
    let dates = required(timestamp_values(df, "date")?, "date")?;
    let open = required(float_values(df, "open")?, "open")?;
    let high = required(float_values(df, "high")?, "high")?;
    let low = required(float_values(df, "low")?, "low")?;
    let close = required(float_values(df, "close")?, "close")?;
    let volume = required(int_values(df, "volume")?, "volume")?;

    let rows = df.height();
    let table = BarTable::from_rows(tickers.into_iter().enumerate().map(|(i, ticker)| {
        (
            ticker,
            Bar {
                timestamp: dates[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            },
        )
    }));
    if table.len() < rows {
        info!("Dropped {} duplicate (ticker, date) rows", rows - table.len());
    }
    Ok(table)
}

/// Load the symbol-window index, newest window first.
pub fn load_windows(path: &Path, window_days: i64) -> Result<Vec<SymbolWindow>, AppError> {
    let df = read_feather(path)?;
    let windows = windows_from_dataframe(&df, window_days)?;
    info!("Loaded {} chart windows from {}", windows.len(), path.display());
    Ok(windows)
}

/// Validate an index DataFrame and convert it into windows sorted by date,
/// newest first. Rows without explicit `start_date`/`end_date` span
/// `window_days` on either side of `date`.
pub fn windows_from_dataframe(
    df: &DataFrame,
    window_days: i64,
) -> Result<Vec<SymbolWindow>, AppError> {
    WINDOW_SCHEMA.validate(df)?;

    let tickers = required(text_values(df, "ticker")?, "ticker")?;
    let dates = required(timestamp_values(df, "date")?, "date")?;
    let starts = optional_column(df, "start_date", timestamp_values)?;
    let ends = optional_column(df, "end_date", timestamp_values)?;
    let mut watermarks = optional_column(df, "watermark", text_values)?;

    let mut seen = HashSet::new();
    let mut windows = Vec::with_capacity(tickers.len());
    for (i, symbol) in tickers.into_iter().enumerate() {
        let date = dates[i];
        if !seen.insert((symbol.clone(), date)) {
            continue;
        }
        let (start, end) = match (starts[i], ends[i]) {
            (Some(start), Some(end)) => (start, end),
            (start, end) => {
                let (lo, hi) = span_around(date, window_days)?;
                (start.unwrap_or(lo), end.unwrap_or(hi))
            }
        };
        windows.push(SymbolWindow {
            start,
            end,
            watermark: watermarks[i].take(),
            symbol,
            date,
        });
    }
    // Stable: equal dates keep file order
    windows.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(windows)
}

// ── Column extraction ──

fn required<T>(values: Vec<Option<T>>, column: &str) -> Result<Vec<T>, AppError> {
    let total = values.len();
    let present: Vec<T> = values.into_iter().flatten().collect();
    if present.len() != total {
        return Err(AppError::NullValues {
            column: column.to_string(),
            count: total - present.len(),
        });
    }
    Ok(present)
}

/// Values of an optional column, all `None` when the column is absent.
fn optional_column<T>(
    df: &DataFrame,
    name: &str,
    extract: fn(&DataFrame, &str) -> Result<Vec<Option<T>>, AppError>,
) -> Result<Vec<Option<T>>, AppError> {
    if df.column(name).is_err() {
        return Ok(std::iter::repeat_with(|| None).take(df.height()).collect());
    }
    extract(df, name)
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, AppError> {
    let column = df.column(name)?;
    let strings = match column.dtype() {
        DataType::String => column.clone(),
        _ => column.cast(&DataType::String)?,
    };
    let values = strings
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AppError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?.into_iter().collect();
    Ok(values)
}

fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, AppError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column.i64()?.into_iter().collect();
    Ok(values)
}

/// Timestamps as naive values. Timezone-aware columns are converted to UTC
/// wall time; `Date` columns become midnight.
fn timestamp_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>, AppError> {
    let column = df.column(name)?;
    match column.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = column.cast(&DataType::Int64)?;
            let values = physical
                .i64()?
                .into_iter()
                .map(|v| v.map(|v| from_epoch(v, unit)).transpose())
                .collect();
            values
        }
        DataType::Date => {
            let physical = column.cast(&DataType::Int32)?;
            let values = physical
                .i32()?
                .into_iter()
                .map(|v| v.map(from_epoch_days).transpose())
                .collect();
            values
        }
        other => Err(AppError::ColumnType {
            column: name.to_string(),
            expected: "datetime or date",
            found: other.to_string(),
        }),
    }
}

fn from_epoch(value: i64, unit: TimeUnit) -> Result<NaiveDateTime, AppError> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    datetime
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AppError::Dataframe(format!("timestamp {} out of range", value)))
}

fn from_epoch_days(days: i32) -> Result<NaiveDateTime, AppError> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::Dataframe(format!("date {} out of range", days)))
}
