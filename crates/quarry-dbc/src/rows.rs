//! Row representation and Arrow batch decoding.
//!
//! REST pages already carry rows as JSON values; the bulk-read path delivers
//! Arrow record batches, which are decoded into the same representation so
//! cursors fetch uniformly from either source.

use arrow_array::{
    Array, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow_schema::{DataType, TimeUnit};
use serde_json::Value;

use crate::error::{Error, Result};

/// A fetched row, one JSON value per column.
pub type Row = Vec<Value>;

/// Decode an Arrow record batch into rows.
///
/// Supports the Arrow types the bulk-read service emits for the Quarry SQL
/// surface: boolean, int64, float64, utf8, and microsecond timestamps
/// (surfaced as epoch-microsecond numbers, matching the REST wire format).
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(batch.num_rows());
    for row_idx in 0..batch.num_rows() {
        let mut row = Vec::with_capacity(batch.num_columns());
        for column in batch.columns() {
            row.push(cell(column.as_ref(), row_idx)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn cell(column: &dyn Array, row: usize) -> Result<Value> {
    if column.is_null(row) {
        return Ok(Value::Null);
    }

    match column.data_type() {
        DataType::Boolean => Ok(Value::Bool(downcast::<BooleanArray>(column)?.value(row))),
        DataType::Int64 => Ok(Value::from(downcast::<Int64Array>(column)?.value(row))),
        DataType::Float64 => Ok(Value::from(downcast::<Float64Array>(column)?.value(row))),
        DataType::Utf8 => Ok(Value::from(downcast::<StringArray>(column)?.value(row))),
        DataType::Timestamp(TimeUnit::Microsecond, _) => Ok(Value::from(
            downcast::<TimestampMicrosecondArray>(column)?.value(row),
        )),
        other => Err(Error::data(format!(
            "unsupported Arrow type in bulk read stream: {other}"
        ))),
    }
}

fn downcast<T: Array + 'static>(column: &dyn Array) -> Result<&T> {
    column
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::data("column array does not match its declared Arrow type"))
}
