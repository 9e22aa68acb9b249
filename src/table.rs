//! Flattening of vendor JSON envelopes into a uniform [`Table`].
//!
//! The API answers in one of two shapes, both nested under a top-level `data` object:
//!
//! - **catalog**: `assets[].services[].subAssets[]`, flattened to one row per sub-asset
//!   with the columns `Asset`, `Service`, `SubAsset`, `ID`, `TraceName`.
//! - **tabular**: `columns[]` + `rows[]`, zipped in order. Columns are either plain
//!   strings or objects carrying `columnName`; rows are either plain arrays or objects
//!   carrying `values`.
//!
//! Anything else is rejected with [`AppError::SchemaError`]; no partial table is returned.

use crate::constants::CATALOG_COLUMNS;
use crate::errors::{AppError, AppResult};
use serde_json::Value;

/// Row-oriented table with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table, rejecting rows whose width differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> AppResult<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AppError::SchemaError(format!(
                "row {index} has {} values but {} columns were declared",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in their original order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Value under `column`, or `None` when the table has no such column.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &values[i])
    }

    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Returns the column as text, accepting strings and numbers.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the column is missing or holds another JSON type.
    pub fn require_text(&self, column: &str) -> AppResult<String> {
        match self.get(column) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(AppError::SchemaError(format!(
                "column '{column}' holds {other}, expected text"
            ))),
            None => Err(AppError::SchemaError(format!("missing column '{column}'"))),
        }
    }
}

/// Converts a vendor response envelope into a [`Table`].
///
/// # Errors
///
/// Returns `SchemaError` when `data` is missing or matches neither the catalog nor
/// the tabular shape, or when a recognized shape is missing required fields.
pub fn flatten_response(json: &Value) -> AppResult<Table> {
    let data = json
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::SchemaError("JSON structure not recognized".into()))?;

    if let Some(assets) = data.get("assets") {
        flatten_catalog(assets)
    } else if let (Some(columns), Some(rows)) = (data.get("columns"), data.get("rows")) {
        flatten_tabular(columns, rows)
    } else {
        Err(AppError::SchemaError(
            "JSON structure not recognized".into(),
        ))
    }
}

fn flatten_catalog(assets: &Value) -> AppResult<Table> {
    let mut rows = Vec::new();

    for asset in as_array(assets, "assets")? {
        let asset_name = text_field(asset, "name")?;
        for service in as_array(field(asset, "services")?, "services")? {
            let service_name = text_field(service, "name")?;
            for sub_asset in as_array(field(service, "subAssets")?, "subAssets")? {
                rows.push(vec![
                    Value::String(asset_name.clone()),
                    Value::String(service_name.clone()),
                    Value::String(text_field(sub_asset, "name")?),
                    Value::String(text_field(sub_asset, "id")?),
                    Value::String(text_field(sub_asset, "traceName")?),
                ]);
            }
        }
    }

    Table::new(CATALOG_COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

fn flatten_tabular(columns: &Value, rows: &Value) -> AppResult<Table> {
    let columns = as_array(columns, "columns")?
        .iter()
        .map(|col| match col {
            Value::String(name) => Ok(name.clone()),
            Value::Object(_) => text_field(col, "columnName"),
            other => Err(AppError::SchemaError(format!(
                "unexpected column descriptor: {other}"
            ))),
        })
        .collect::<AppResult<Vec<_>>>()?;

    let rows = as_array(rows, "rows")?
        .iter()
        .map(|row| match row {
            Value::Array(values) => Ok(values.clone()),
            Value::Object(_) => as_array(field(row, "values")?, "values").map(|v| v.to_vec()),
            other => Err(AppError::SchemaError(format!("unexpected row: {other}"))),
        })
        .collect::<AppResult<Vec<_>>>()?;

    Table::new(columns, rows)
}

fn field<'a>(value: &'a Value, key: &str) -> AppResult<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| AppError::SchemaError(format!("missing field '{key}'")))
}

fn as_array<'a>(value: &'a Value, key: &str) -> AppResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AppError::SchemaError(format!("field '{key}' is not an array")))
}

fn text_field(value: &Value, key: &str) -> AppResult<String> {
    match field(value, key)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(AppError::SchemaError(format!(
            "field '{key}' holds {other}, expected text"
        ))),
    }
}
