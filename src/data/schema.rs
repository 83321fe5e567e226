use polars::prelude::*;

use crate::errors::AppError;

/// Logical kind a column must have. Any physical dtype the loader can
/// coerce into that kind is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Timestamp,
    Numeric,
}

impl ColumnKind {
    pub fn expected(&self) -> &'static str {
        match self {
            ColumnKind::Text => "string",
            ColumnKind::Timestamp => "datetime or date",
            ColumnKind::Numeric => "numeric",
        }
    }

    pub fn accepts(&self, dtype: &DataType) -> bool {
        match self {
            ColumnKind::Text => matches!(
                dtype,
                DataType::String | DataType::Categorical(..) | DataType::Enum(..)
            ),
            ColumnKind::Timestamp => matches!(dtype, DataType::Datetime(..) | DataType::Date),
            ColumnKind::Numeric => matches!(
                dtype,
                DataType::Float32
                    | DataType::Float64
                    | DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub nullable: bool,
    pub non_negative: bool,
}

impl ColumnSpec {
    const fn required(name: &'static str, kind: ColumnKind) -> Self {
        ColumnSpec {
            name,
            kind,
            required: true,
            nullable: false,
            non_negative: false,
        }
    }

    const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        ColumnSpec {
            name,
            kind,
            required: false,
            nullable: true,
            non_negative: false,
        }
    }

    const fn price(name: &'static str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Numeric,
            required: true,
            nullable: false,
            non_negative: true,
        }
    }
}

/// Columns a loaded table must provide. Columns not listed are ignored.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub const BAR_SCHEMA: TableSchema = TableSchema {
    table: "bars",
    columns: &[
        ColumnSpec::required("ticker", ColumnKind::Text),
        ColumnSpec::required("date", ColumnKind::Timestamp),
        ColumnSpec::price("open"),
        ColumnSpec::price("high"),
        ColumnSpec::price("low"),
        ColumnSpec::price("close"),
        ColumnSpec::price("volume"),
    ],
};

pub const WINDOW_SCHEMA: TableSchema = TableSchema {
    table: "windows",
    columns: &[
        ColumnSpec::required("ticker", ColumnKind::Text),
        ColumnSpec::required("date", ColumnKind::Timestamp),
        ColumnSpec::optional("start_date", ColumnKind::Timestamp),
        ColumnSpec::optional("end_date", ColumnKind::Timestamp),
        ColumnSpec::optional("watermark", ColumnKind::Text),
    ],
};

impl TableSchema {
    pub fn validate(&self, df: &DataFrame) -> Result<(), AppError> {
        for spec in self.columns {
            let column = match df.column(spec.name) {
                Ok(column) => column,
                Err(_) if !spec.required => continue,
                Err(_) => {
                    return Err(AppError::MissingColumn {
                        table: self.table.to_string(),
                        column: spec.name.to_string(),
                    })
                }
            };

            if !spec.kind.accepts(column.dtype()) {
                return Err(AppError::ColumnType {
                    column: spec.name.to_string(),
                    expected: spec.kind.expected(),
                    found: column.dtype().to_string(),
                });
            }

            let nulls = column.null_count();
            if !spec.nullable && nulls > 0 {
                return Err(AppError::NullValues {
                    column: spec.name.to_string(),
                    count: nulls,
                });
            }

            if spec.non_negative {
                let values = column.cast(&DataType::Float64)?;
                if values.f64()?.into_iter().flatten().any(|v| v < 0.0) {
                    return Err(AppError::NegativeValues {
                        column: spec.name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
