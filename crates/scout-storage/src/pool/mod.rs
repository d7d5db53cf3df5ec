//! Connection pool managing the write connection and the read pool.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use scout_core::errors::ScoutResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// One writer plus N readers.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: ReadPool,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> ScoutResult<Self> {
        // The writer creates the file and switches it to WAL before readers attach.
        let writer = WriteConnection::open(path, busy_timeout_ms)?;
        let readers = ReadPool::open(path, read_pool_size, busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory mode. Readers are isolated databases, so callers must route
    /// reads through the writer.
    pub fn open_in_memory() -> ScoutResult<Self> {
        let writer = WriteConnection::open_in_memory()?;
        let readers = ReadPool::open_in_memory(1)?;
        Ok(Self {
            writer,
            readers,
            db_path: None,
        })
    }
}
