use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;

use super::indicators::{compute_window, IndicatorSeries};
use crate::errors::AppError;
use crate::models::bar::{Bar, BarTable};
use crate::models::config::DisplayTimeframe;
use crate::models::indicator::IndicatorSpec;
use crate::models::symbol::SymbolWindow;

/// Data resolution a navigator was built for.
///
/// Only minute-resolution charts carry a selectable display timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Daily,
    Minute { timeframe: DisplayTimeframe },
}

/// Display metadata for the current window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMetadata {
    pub symbol: String,
    pub date: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timeframe: DisplayTimeframe,
    pub index: usize,
    pub watermark: Option<String>,
}

impl ChartMetadata {
    /// `YYYY-MM-DD` of the window date.
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn range_label(&self) -> String {
        format!(
            "{} .. {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    /// Override text when the window has one, otherwise `"<symbol> <tf> <date>"`.
    pub fn watermark_text(&self) -> String {
        match &self.watermark {
            Some(text) => text.clone(),
            None => format!("{} {} {}", self.symbol, self.timeframe, self.date_label()),
        }
    }
}

/// Bars of the current window with indicator columns and metadata.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub bars: Vec<Bar>,
    pub indicators: Vec<IndicatorSeries>,
    pub metadata: ChartMetadata,
}

impl ChartView {
    pub fn row_count(&self) -> usize {
        self.bars.len()
    }
}

/// Cursor over an ordered collection of symbol windows.
///
/// Navigation clamps at both ends. Window and bar data are shared read-only,
/// so several navigators can browse the same data independently.
#[derive(Debug, Clone)]
pub struct ChartNavigator {
    windows: Arc<[SymbolWindow]>,
    bars: Arc<BarTable>,
    indicators: Arc<[IndicatorSpec]>,
    cursor: usize,
    resolution: Resolution,
}

impl ChartNavigator {
    pub fn new(
        windows: Arc<[SymbolWindow]>,
        bars: Arc<BarTable>,
        indicators: Arc<[IndicatorSpec]>,
        resolution: Resolution,
    ) -> Result<Self, AppError> {
        if windows.is_empty() {
            return Err(AppError::InvalidConfig(
                "symbol window collection is empty".into(),
            ));
        }
        for window in windows.iter() {
            window.validate()?;
        }
        Ok(ChartNavigator {
            windows,
            bars,
            indicators,
            cursor: 0,
            resolution,
        })
    }

    pub fn daily(
        windows: Arc<[SymbolWindow]>,
        bars: Arc<BarTable>,
        indicators: Arc<[IndicatorSpec]>,
    ) -> Result<Self, AppError> {
        Self::new(windows, bars, indicators, Resolution::Daily)
    }

    /// Minute-resolution navigator, starting on the `1M` display timeframe.
    pub fn minute(
        windows: Arc<[SymbolWindow]>,
        bars: Arc<BarTable>,
        indicators: Arc<[IndicatorSpec]>,
    ) -> Result<Self, AppError> {
        Self::new(
            windows,
            bars,
            indicators,
            Resolution::Minute {
                timeframe: DisplayTimeframe::M1,
            },
        )
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn window(&self) -> &SymbolWindow {
        &self.windows[self.cursor]
    }

    pub fn indicators(&self) -> &[IndicatorSpec] {
        &self.indicators
    }

    pub fn timeframe(&self) -> DisplayTimeframe {
        match self.resolution {
            Resolution::Daily => DisplayTimeframe::D1,
            Resolution::Minute { timeframe } => timeframe,
        }
    }

    pub fn supports_timeframes(&self) -> bool {
        matches!(self.resolution, Resolution::Minute { .. })
    }

    pub fn metadata(&self) -> ChartMetadata {
        let window = self.window();
        ChartMetadata {
            symbol: window.symbol.clone(),
            date: window.date,
            start: window.start,
            end: window.end,
            timeframe: self.timeframe(),
            index: self.cursor,
            watermark: window.watermark.clone(),
        }
    }

    /// Bars and indicators of the current window.
    pub fn current(&self) -> ChartView {
        let window = self.window();
        let (history, range) = self.bars.window(&window.symbol, window.start, window.end);
        let indicators = compute_window(history, range.clone(), &self.indicators);
        ChartView {
            bars: history[range].to_vec(),
            indicators,
            metadata: self.metadata(),
        }
    }

    /// Advance one window; stays on the last one.
    pub fn next(&mut self) -> ChartView {
        if self.cursor + 1 < self.windows.len() {
            self.cursor += 1;
        } else {
            debug!("Already at last window ({})", self.cursor);
        }
        self.current()
    }

    /// Go back one window; stays on the first one.
    pub fn previous(&mut self) -> ChartView {
        if self.cursor > 0 {
            self.cursor -= 1;
        } else {
            debug!("Already at first window");
        }
        self.current()
    }

    /// Jump to `index`, clamped to the last window.
    pub fn seek(&mut self, index: usize) -> ChartView {
        let last = self.windows.len() - 1;
        if index > last {
            debug!("Seek to {} clamped to {}", index, last);
        }
        self.cursor = index.min(last);
        self.current()
    }

    /// Change the display timeframe. The label is validated before any state
    /// changes, and daily charts reject the call.
    pub fn set_timeframe(&mut self, label: &str) -> Result<(), AppError> {
        let parsed: DisplayTimeframe = label.parse()?;
        match &mut self.resolution {
            Resolution::Daily => Err(AppError::TimeframeUnsupported),
            Resolution::Minute { timeframe } => {
                *timeframe = parsed;
                Ok(())
            }
        }
    }
}
