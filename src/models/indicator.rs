use serde::Deserialize;

use crate::errors::AppError;

/// Supported overlay indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum IndicatorKind {
    SMA,
    EMA,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::SMA => "SMA",
            IndicatorKind::EMA => "EMA",
        }
    }
}

/// Bar field an indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorParams {
    pub period: usize,
    #[serde(default)]
    pub source: PriceField,
}

/// Configuration for a single indicator overlay, e.g.
/// `{"name": "SMA", "parameters": {"period": 20, "source": "close"}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorSpec {
    pub name: IndicatorKind,
    pub parameters: IndicatorParams,
}

impl IndicatorSpec {
    pub fn new(name: IndicatorKind, period: usize) -> Self {
        IndicatorSpec {
            name,
            parameters: IndicatorParams {
                period,
                source: PriceField::Close,
            },
        }
    }

    /// Output column name, e.g. `SMA_20` or `EMA_10_high`.
    pub fn column_name(&self) -> String {
        let mut name = format!("{}_{}", self.name.as_str(), self.parameters.period);
        if self.parameters.source != PriceField::Close {
            name.push('_');
            name.push_str(self.parameters.source.as_str());
        }
        name
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.parameters.period == 0 {
            return Err(AppError::InvalidConfig(format!(
                "{} period must be at least 1",
                self.name.as_str()
            )));
        }
        Ok(())
    }
}
