//! DB-API style cursor: query execution and buffered row fetching.
//!
//! A cursor is a handle onto shared state (`Arc<Mutex<CursorState>>`); the
//! owning connection keeps a weak reference to the same state so it can
//! cascade-close live cursors without extending their lifetime.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use quarry_client::{
    BulkReadClient, Client, FieldType, ParameterValue, QueryParameter, QueryRequest, QueryResponse,
    TableSchema,
};

use crate::error::{Error, Result};
use crate::rows::{Row, batch_to_rows};

/// Default number of rows fetched by `fetchmany` when no size is given.
pub const DEFAULT_ARRAYSIZE: usize = 1;

/// Description of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    /// Column type.
    pub field_type: FieldType,
    /// Whether the column admits NULL.
    pub nullable: bool,
}

/// Cursor over query results.
///
/// Produced by [`crate::Connection::cursor`]. All operations are guarded:
/// once the cursor is closed (directly or by its connection's cascade), they
/// fail with [`Error::ClosedCursor`].
#[derive(Debug)]
pub struct Cursor {
    pub(crate) state: Arc<Mutex<CursorState>>,
}

/// Shared cursor state, weakly tracked by the owning connection.
#[derive(Debug)]
pub(crate) struct CursorState {
    client: Arc<Client>,
    bulk_read_client: Option<Arc<BulkReadClient>>,
    closed: bool,
    arraysize: usize,
    description: Option<Vec<ColumnDescription>>,
    rowcount: i64,
    buffer: VecDeque<Row>,
    pending: Option<PendingPages>,
}

/// REST continuation bookmark for a partially fetched result.
#[derive(Debug)]
struct PendingPages {
    job_id: String,
    page_token: String,
}

impl Cursor {
    pub(crate) fn new(client: Arc<Client>, bulk_read_client: Option<Arc<BulkReadClient>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CursorState {
                client,
                bulk_read_client,
                closed: false,
                arraysize: DEFAULT_ARRAYSIZE,
                description: None,
                rowcount: -1,
                buffer: VecDeque::new(),
                pending: None,
            })),
        }
    }

    /// Execute a SQL query with positional parameters.
    ///
    /// Parameters bind to `?` placeholders in order; pass an empty slice for
    /// an unparameterized query.
    pub fn execute(&self, sql: &str, parameters: &[ParameterValue]) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let request = QueryRequest {
            sql: sql.to_owned(),
            parameters: parameters
                .iter()
                .cloned()
                .map(|value| QueryParameter { name: None, value })
                .collect(),
            max_results: None,
        };
        let response = state.client.query(&request)?;
        state.apply_response(response);
        Ok(())
    }

    /// Execute the same statement once per parameter set.
    pub fn executemany(&self, sql: &str, parameter_sets: &[Vec<ParameterValue>]) -> Result<()> {
        for parameters in parameter_sets {
            self.execute(sql, parameters)?;
        }
        Ok(())
    }

    /// Fetch the next row, or `None` when the result is exhausted.
    pub fn fetchone(&self) -> Result<Option<Row>> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.next_row()
    }

    /// Fetch up to `size` rows (the cursor's arraysize when `None`).
    pub fn fetchmany(&self, size: Option<usize>) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let size = size.unwrap_or(state.arraysize);
        let mut rows = Vec::with_capacity(size);
        for _ in 0..size {
            match state.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Fetch all remaining rows.
    pub fn fetchall(&self) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let mut rows = Vec::new();
        while let Some(row) = state.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Close the cursor. Closing a closed cursor is an error.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.close_internal();
        Ok(())
    }

    /// Whether the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Column descriptions of the last executed query.
    pub fn description(&self) -> Option<Vec<ColumnDescription>> {
        self.state.lock().description.clone()
    }

    /// Total rows of the last query, or rows affected for DML; -1 before any
    /// execution.
    pub fn rowcount(&self) -> i64 {
        self.state.lock().rowcount
    }

    /// Rows fetched by `fetchmany` when no explicit size is passed.
    pub fn arraysize(&self) -> usize {
        self.state.lock().arraysize
    }

    /// Set the default `fetchmany` size.
    pub fn set_arraysize(&self, size: usize) {
        self.state.lock().arraysize = size.max(1);
    }
}

impl CursorState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedCursor);
        }
        Ok(())
    }

    /// Idempotent close used by the connection's cascade.
    pub(crate) fn close_internal(&mut self) {
        self.closed = true;
        self.buffer.clear();
        self.pending = None;
    }

    fn apply_response(&mut self, response: QueryResponse) {
        let QueryResponse {
            job_id,
            schema,
            rows,
            total_rows,
            num_dml_affected_rows,
            page_token,
            read_session,
            ..
        } = response;

        self.description = Some(build_description(&schema));
        self.rowcount = num_dml_affected_rows.map_or(total_rows as i64, |n| n as i64);
        self.buffer = rows.into();
        self.pending = None;

        // A result that fit the first page gains nothing from the bulk path.
        let Some(page_token) = page_token else { return };

        if let (Some(bulk), Some(session)) = (&self.bulk_read_client, &read_session) {
            match fetch_bulk_rows(bulk, session) {
                Ok(rows) => {
                    // The read session streams the full result.
                    self.buffer = rows.into();
                    return;
                }
                Err(error) => {
                    tracing::warn!(%error, "bulk read failed, falling back to paged REST fetch");
                }
            }
        }

        self.pending = Some(PendingPages { job_id, page_token });
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.description.is_none() {
            return Err(Error::programming("no query has been executed"));
        }
        if self.buffer.is_empty() {
            self.fetch_next_page()?;
        }
        Ok(self.buffer.pop_front())
    }

    fn fetch_next_page(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let page = self
            .client
            .query_results(&pending.job_id, &pending.page_token)?;
        self.buffer.extend(page.rows);
        if let Some(token) = page.page_token {
            self.pending = Some(PendingPages {
                job_id: pending.job_id,
                page_token: token,
            });
        }
        Ok(())
    }
}

fn fetch_bulk_rows(bulk: &BulkReadClient, session_id: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for batch in bulk.read(session_id)? {
        rows.extend(batch_to_rows(&batch?)?);
    }
    Ok(rows)
}

fn build_description(schema: &TableSchema) -> Vec<ColumnDescription> {
    schema
        .fields
        .iter()
        .map(|f| ColumnDescription {
            name: f.name.clone(),
            field_type: f.field_type,
            nullable: f.nullable,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use quarry_client::{ClientConfig, FieldSchema};
    use serde_json::json;

    use super::*;

    fn test_cursor() -> Cursor {
        let config = ClientConfig::new("http://localhost:9050", "test-key", "test-project").unwrap();
        Cursor::new(Arc::new(Client::with_config(config).unwrap()), None)
    }

    fn seed_rows(cursor: &Cursor, rows: Vec<Row>) {
        let mut state = cursor.state.lock();
        state.description = Some(Vec::new());
        state.rowcount = rows.len() as i64;
        state.buffer = rows.into();
    }

    #[test]
    fn test_fetch_before_execute_fails() {
        let cursor = test_cursor();
        assert!(matches!(cursor.fetchone(), Err(Error::Programming(_))));
    }

    #[test]
    fn test_fetchone_drains_buffer() {
        let cursor = test_cursor();
        seed_rows(&cursor, vec![vec![json!(1)], vec![json!(2)]]);

        assert_eq!(cursor.fetchone().unwrap(), Some(vec![json!(1)]));
        assert_eq!(cursor.fetchone().unwrap(), Some(vec![json!(2)]));
        assert_eq!(cursor.fetchone().unwrap(), None);
    }

    #[test]
    fn test_fetchmany_respects_arraysize() {
        let cursor = test_cursor();
        seed_rows(
            &cursor,
            vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]],
        );

        cursor.set_arraysize(2);
        assert_eq!(cursor.fetchmany(None).unwrap().len(), 2);
        assert_eq!(cursor.fetchmany(None).unwrap().len(), 1);
        assert!(cursor.fetchmany(None).unwrap().is_empty());
    }

    #[test]
    fn test_fetchmany_explicit_size_wins() {
        let cursor = test_cursor();
        seed_rows(
            &cursor,
            vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]],
        );

        assert_eq!(cursor.fetchmany(Some(3)).unwrap().len(), 3);
    }

    #[test]
    fn test_fetchall() {
        let cursor = test_cursor();
        seed_rows(&cursor, vec![vec![json!("a")], vec![json!("b")]]);

        let rows = cursor.fetchall().unwrap();
        assert_eq!(rows, vec![vec![json!("a")], vec![json!("b")]]);
        assert_eq!(cursor.fetchone().unwrap(), None);
    }

    #[test]
    fn test_closed_cursor_guard() {
        let cursor = test_cursor();
        cursor.close().unwrap();
        assert!(cursor.is_closed());

        assert!(matches!(cursor.close(), Err(Error::ClosedCursor)));
        assert!(matches!(cursor.fetchone(), Err(Error::ClosedCursor)));
        assert!(matches!(
            cursor.execute("SELECT 1", &[]),
            Err(Error::ClosedCursor)
        ));
    }

    #[test]
    fn test_cascade_close_is_idempotent() {
        let cursor = test_cursor();
        cursor.state.lock().close_internal();
        cursor.state.lock().close_internal();
        assert!(cursor.is_closed());
    }

    #[test]
    fn test_close_clears_buffered_rows() {
        let cursor = test_cursor();
        seed_rows(&cursor, vec![vec![json!(1)]]);

        cursor.close().unwrap();
        assert!(cursor.state.lock().buffer.is_empty());
    }

    #[test]
    fn test_build_description() {
        let schema = TableSchema {
            fields: vec![FieldSchema {
                name: "n".to_string(),
                field_type: FieldType::Int64,
                nullable: true,
            }],
        };
        let description = build_description(&schema);
        assert_eq!(
            description,
            vec![ColumnDescription {
                name: "n".to_string(),
                field_type: FieldType::Int64,
                nullable: true,
            }]
        );
    }

    #[test]
    fn test_set_arraysize_floor() {
        let cursor = test_cursor();
        cursor.set_arraysize(0);
        assert_eq!(cursor.arraysize(), 1);
    }
}
