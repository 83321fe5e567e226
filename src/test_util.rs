//! Shared fixtures for unit tests.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::AppError;
use crate::models::bar::{Bar, BarTable};
use crate::models::symbol::SymbolWindow;
use crate::ui::surface::{ChartSurface, LegendOptions, LineId, LinePoint, Screenshot, Watermark};

/// Midnight of a `YYYY-MM-DD` date.
pub(crate) fn ts(date: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub(crate) fn bar(date: &str, close: f64) -> Bar {
    Bar {
        timestamp: ts(date),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One daily bar per day of January 2023 for each symbol, closes rising from
/// `base`.
pub(crate) fn january_table(symbols: &[(&str, f64)]) -> BarTable {
    BarTable::from_rows(symbols.iter().flat_map(|&(symbol, base)| {
        (1..=31).map(move |d| {
            (
                symbol.to_string(),
                bar(&format!("2023-01-{:02}", d), base + d as f64),
            )
        })
    }))
}

pub(crate) fn windows(symbols: &[&str]) -> Vec<SymbolWindow> {
    symbols
        .iter()
        .map(|s| SymbolWindow::around(*s, ts("2023-01-15"), 5).unwrap())
        .collect()
}

/// Chart surface that records every call it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub bar_updates: Vec<usize>,
    pub created_lines: Vec<String>,
    pub line_updates: Vec<(LineId, usize)>,
    pub watermarks: Vec<String>,
    pub legend_calls: usize,
    pub screenshots: usize,
    /// Makes `screenshot` fail like an unwritable target.
    pub fail_screenshot: bool,
}

impl ChartSurface for RecordingSurface {
    fn set_bars(&mut self, bars: &[Bar]) -> Result<(), AppError> {
        self.bar_updates.push(bars.len());
        Ok(())
    }

    fn create_line(&mut self, name: &str) -> Result<LineId, AppError> {
        self.created_lines.push(name.to_string());
        Ok(LineId(self.created_lines.len() - 1))
    }

    fn set_line(&mut self, line: LineId, points: &[LinePoint]) -> Result<(), AppError> {
        self.line_updates.push((line, points.len()));
        Ok(())
    }

    fn set_watermark(&mut self, watermark: &Watermark) -> Result<(), AppError> {
        self.watermarks.push(watermark.text.clone());
        Ok(())
    }

    fn set_legend(&mut self, _legend: &LegendOptions) -> Result<(), AppError> {
        self.legend_calls += 1;
        Ok(())
    }

    fn screenshot(&mut self) -> Result<Screenshot, AppError> {
        if self.fail_screenshot {
            return Err(AppError::FileWrite("screenshot target unavailable".into()));
        }
        self.screenshots += 1;
        Ok(Screenshot {
            bytes: b"fake_image_data".to_vec(),
            extension: "png",
        })
    }
}
