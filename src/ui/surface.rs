//! Boundary to the charting widget.
//!
//! Everything that draws implements [`ChartSurface`]; the binding layer only
//! talks to this trait.

use chrono::NaiveDateTime;

use crate::errors::AppError;
use crate::models::bar::Bar;

/// Handle of a line overlay created on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(pub usize);

/// One point of a line overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Pair `values` with the bar timestamps, skipping warm-up NaNs.
pub fn line_points(bars: &[Bar], values: &[f64]) -> Vec<LinePoint> {
    bars.iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(b, &value)| LinePoint {
            time: b.timestamp,
            value,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorzAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertAlign {
    Top,
    Center,
    Bottom,
}

/// On-chart label, distinct from indicator overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub font_size: u32,
    pub color: String,
    pub horz_align: HorzAlign,
    pub vert_align: VertAlign,
}

impl Watermark {
    pub fn new(text: impl Into<String>) -> Self {
        Watermark {
            text: text.into(),
            font_size: 44,
            color: "rgba(180, 180, 200, 0.5)".to_string(),
            horz_align: HorzAlign::Center,
            vert_align: VertAlign::Center,
        }
    }

    pub fn vert_align(mut self, align: VertAlign) -> Self {
        self.vert_align = align;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendOptions {
    pub visible: bool,
    pub ohlc: bool,
    pub lines: bool,
    pub font_family: String,
    pub font_size: u32,
    pub percent: bool,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            visible: true,
            ohlc: true,
            lines: true,
            font_family: "arial".to_string(),
            font_size: 12,
            percent: false,
        }
    }
}

/// Captured image of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `png`.
    pub extension: &'static str,
}

/// A chart widget the binding layer can drive.
pub trait ChartSurface {
    /// Replace the candlestick series in place.
    fn set_bars(&mut self, bars: &[Bar]) -> Result<(), AppError>;

    /// Create a new line overlay. Each call adds another overlay.
    fn create_line(&mut self, name: &str) -> Result<LineId, AppError>;

    /// Replace the points of an existing overlay.
    fn set_line(&mut self, line: LineId, points: &[LinePoint]) -> Result<(), AppError>;

    fn set_watermark(&mut self, watermark: &Watermark) -> Result<(), AppError>;

    fn set_legend(&mut self, legend: &LegendOptions) -> Result<(), AppError>;

    fn screenshot(&mut self) -> Result<Screenshot, AppError>;

    /// Called once after a full frame of updates.
    fn refresh(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::bar;

    #[test]
    fn test_line_points_skip_warmup() {
        let bars = vec![bar("2023-01-01", 1.0), bar("2023-01-02", 2.0), bar("2023-01-03", 3.0)];
        let points = line_points(&bars, &[f64::NAN, 1.5, 2.5]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, bars[1].timestamp);
        assert_eq!(points[1].value, 2.5);
    }

    #[test]
    fn test_watermark_defaults() {
        let wm = Watermark::new("AAPL 1D 2023-01-15").vert_align(VertAlign::Top);
        assert_eq!(wm.font_size, 44);
        assert_eq!(wm.color, "rgba(180, 180, 200, 0.5)");
        assert_eq!(wm.horz_align, HorzAlign::Center);
        assert_eq!(wm.vert_align, VertAlign::Top);
    }
}
