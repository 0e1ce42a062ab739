//! Connection to the Quarry analytical database.
//!
//! The connection is an ownership and lifecycle shim: the heavy lifting
//! (query execution, pagination, bulk reads) lives in `quarry-client` and
//! [`crate::Cursor`]. What lives here is the contract of who closes what:
//! a connection only ever closes clients it instantiated itself, and it
//! cascade-closes the cursors created through it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quarry_client::{BulkReadClient, Client};

use crate::cursor::{Cursor, CursorState};
use crate::error::{Error, Result};

/// Connection to Quarry.
///
/// Holds the REST client used to issue queries and, when available, an
/// accelerated bulk-read client. Each is either adopted from the caller or
/// created by the connection itself; only self-created clients are closed by
/// [`Connection::close`].
///
/// Every operation is guarded: once `close()` has run, further calls
/// (including a second `close()`) fail with [`Error::ClosedConnection`].
#[derive(Debug)]
pub struct Connection {
    client: Arc<Client>,
    bulk_read_client: Option<Arc<BulkReadClient>>,
    owns_client: bool,
    owns_bulk_read_client: bool,
    closed: AtomicBool,
    cursors_created: Mutex<Vec<Weak<Mutex<CursorState>>>>,
}

impl Connection {
    /// Create a connection.
    ///
    /// When `client` is `None`, a REST client is built from `QUARRY_*`
    /// environment variables and the connection owns it. When
    /// `bulk_read_client` is `None`, one is derived from the REST client's
    /// configuration; that derivation never fails construction — failure is
    /// logged by the factory and the connection simply runs without the
    /// accelerated path.
    pub fn new(
        client: Option<Arc<Client>>,
        bulk_read_client: Option<Arc<BulkReadClient>>,
    ) -> Result<Self> {
        let (client, owns_client) = match client {
            Some(client) => (client, false),
            None => (Arc::new(Client::new()?), true),
        };

        let (bulk_read_client, owns_bulk_read_client) = match bulk_read_client {
            Some(bulk) => (Some(bulk), false),
            None => {
                // The factory logs a warning when instantiation fails.
                let created = client.create_bulk_read_client().map(Arc::new);
                let owns = created.is_some();
                (created, owns)
            }
        };

        Ok(Self {
            client,
            bulk_read_client,
            owns_client,
            owns_bulk_read_client,
            closed: AtomicBool::new(false),
            cursors_created: Mutex::new(Vec::new()),
        })
    }

    /// Whether [`Connection::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The REST client this connection issues queries with.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// The accelerated bulk-read client, when one is available.
    pub fn bulk_read_client(&self) -> Option<&Arc<BulkReadClient>> {
        self.bulk_read_client.as_ref()
    }

    /// Close the connection and every live cursor created from it.
    ///
    /// Clients passed in by the caller are *not* closed, only those the
    /// connection created itself. Errors from the underlying clients
    /// propagate unmodified.
    pub fn close(&self) -> Result<()> {
        self.ensure_open()?;
        self.closed.store(true, Ordering::SeqCst);

        if self.owns_client {
            self.client.close()?;
        }

        if self.owns_bulk_read_client
            && let Some(bulk) = &self.bulk_read_client
        {
            // The bulk read client has no close of its own; release its
            // transport channel instead.
            bulk.channel().close()?;
        }

        // Snapshot the live cursors; already-reclaimed ones just drop out.
        let live: Vec<Arc<Mutex<CursorState>>> = {
            let mut registry = self.cursors_created.lock();
            registry.retain(|weak| weak.strong_count() > 0);
            registry.iter().filter_map(Weak::upgrade).collect()
        };
        for state in live {
            state.lock().close_internal();
        }

        Ok(())
    }

    /// No-op: Quarry queries are not transactional. Still fails on a closed
    /// connection, for interface consistency.
    pub fn commit(&self) -> Result<()> {
        self.ensure_open()
    }

    /// Create a new cursor bound to this connection.
    ///
    /// The cursor is registered (weakly) for cascade close before it is
    /// returned.
    pub fn cursor(&self) -> Result<Cursor> {
        self.ensure_open()?;

        let cursor = Cursor::new(Arc::clone(&self.client), self.bulk_read_client.clone());
        self.cursors_created
            .lock()
            .push(Arc::downgrade(&cursor.state));
        Ok(cursor)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ClosedConnection);
        }
        Ok(())
    }
}

/// Construct a [`Connection`].
///
/// Convenience factory with the same parameters as [`Connection::new`]: both
/// clients optional, defaulting to automatic construction.
pub fn connect(
    client: Option<Arc<Client>>,
    bulk_read_client: Option<Arc<BulkReadClient>>,
) -> Result<Connection> {
    Connection::new(client, bulk_read_client)
}
