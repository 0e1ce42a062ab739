//! Wire types for the Quarry REST API.
//!
//! Requests serialize to camelCase JSON; responses deserialize from the same.

use serde::{Deserialize, Serialize};

/// A query submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// SQL text.
    pub sql: String,
    /// Bound parameters, positional when unnamed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<QueryParameter>,
    /// Cap on rows returned in the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

impl QueryRequest {
    /// Create a request with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
            max_results: None,
        }
    }
}

/// A single bound query parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameter {
    /// Parameter name; `None` for positional binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bound value.
    pub value: ParameterValue,
}

/// Parameter value bound into a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer value.
    Int(i64),
    /// 64-bit float value.
    Float(f64),
    /// String value.
    String(String),
}

/// Schema of a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Result columns in order.
    pub fields: Vec<FieldSchema>,
}

/// A single result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the column admits NULL.
    #[serde(default)]
    pub nullable: bool,
}

/// Column types of the Quarry SQL surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// Boolean column.
    Bool,
    /// 64-bit integer column.
    Int64,
    /// 64-bit float column.
    Float64,
    /// UTF-8 string column.
    String,
    /// Timestamp column, microseconds since the Unix epoch.
    Timestamp,
}

/// First response to a query submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Server-assigned job identifier, used to page through results.
    pub job_id: String,
    /// Result schema.
    pub schema: TableSchema,
    /// First page of rows, one JSON value per column.
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Total rows in the result.
    pub total_rows: u64,
    /// Rows affected, present for DML statements only.
    #[serde(default)]
    pub num_dml_affected_rows: Option<u64>,
    /// Continuation token when the result did not fit this page.
    #[serde(default)]
    pub page_token: Option<String>,
    /// Bulk-read session id when the service offers accelerated fetch.
    #[serde(default)]
    pub read_session: Option<String>,
}

/// A continuation page of rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    /// Rows in this page.
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Continuation token for the next page, absent on the last page.
    #[serde(default)]
    pub page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_serialization() {
        let mut request = QueryRequest::new("SELECT a FROM t WHERE b = ?");
        request.parameters.push(QueryParameter {
            name: None,
            value: ParameterValue::Int(42),
        });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sql"], "SELECT a FROM t WHERE b = ?");
        assert_eq!(json["parameters"][0]["value"], 42);
        assert!(json.get("maxResults").is_none());
    }

    #[test]
    fn test_query_request_skips_empty_parameters() {
        let json = serde_json::to_value(QueryRequest::new("SELECT 1")).unwrap();
        assert!(json.get("parameters").is_none());
    }

    #[test]
    fn test_parameter_value_untagged() {
        assert_eq!(
            serde_json::to_value(ParameterValue::Null).unwrap(),
            serde_json::Value::Null
        );
        assert_eq!(
            serde_json::to_value(ParameterValue::String("x".to_string())).unwrap(),
            serde_json::json!("x")
        );
    }

    #[test]
    fn test_query_response_deserialization() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "jobId": "job-1",
            "schema": {"fields": [{"name": "n", "type": "INT64", "nullable": false}]},
            "rows": [[1], [2]],
            "totalRows": 10,
            "pageToken": "tok",
            "readSession": "sess"
        }))
        .unwrap();

        assert_eq!(response.job_id, "job-1");
        assert_eq!(response.schema.fields[0].field_type, FieldType::Int64);
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.total_rows, 10);
        assert_eq!(response.page_token.as_deref(), Some("tok"));
        assert_eq!(response.read_session.as_deref(), Some("sess"));
    }

    #[test]
    fn test_query_response_defaults() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "jobId": "job-2",
            "schema": {"fields": []},
            "totalRows": 0
        }))
        .unwrap();

        assert!(response.rows.is_empty());
        assert!(response.page_token.is_none());
        assert!(response.read_session.is_none());
        assert!(response.num_dml_affected_rows.is_none());
    }
}
