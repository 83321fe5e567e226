use chrono::{NaiveDateTime, TimeDelta};

use crate::errors::AppError;

/// One row of the index table: a symbol shown over an inclusive date range.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolWindow {
    pub symbol: String,
    /// Reference date of the window, shown in the watermark.
    pub date: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Replaces the generated watermark text when set.
    pub watermark: Option<String>,
}

impl SymbolWindow {
    /// Window spanning `days` on either side of `date`.
    pub fn around(
        symbol: impl Into<String>,
        date: NaiveDateTime,
        days: i64,
    ) -> Result<Self, AppError> {
        let (start, end) = span_around(date, days)?;
        Ok(SymbolWindow {
            symbol: symbol.into(),
            date,
            start,
            end,
            watermark: None,
        })
    }

    pub fn with_watermark(mut self, text: impl Into<String>) -> Self {
        self.watermark = Some(text.into());
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::InvalidConfig(format!(
                "window dated {} has an empty symbol",
                self.date
            )));
        }
        if self.start > self.end {
            return Err(AppError::InvalidConfig(format!(
                "window {} starts after it ends ({} > {})",
                self.symbol, self.start, self.end
            )));
        }
        Ok(())
    }
}

/// `date` minus and plus `days`, failing instead of overflowing the
/// representable date range.
pub fn span_around(
    date: NaiveDateTime,
    days: i64,
) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    let out_of_range = || {
        AppError::InvalidConfig(format!(
            "{} days around {} is out of the date range",
            days, date
        ))
    };
    let span = TimeDelta::try_days(days).ok_or_else(out_of_range)?;
    let start = date.checked_sub_signed(span).ok_or_else(out_of_range)?;
    let end = date.checked_add_signed(span).ok_or_else(out_of_range)?;
    Ok((start, end))
}
