use rusqlite::Connection;

/// WAL journaling with relaxed sync, in-memory temp tables, larger page cache
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;
         PRAGMA cache_size = -16000;
         PRAGMA busy_timeout = 5000;",
    )
}
