/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Lookup-table ids (`*_statuses`, `*_priorities`, ...) are SMALLINT.
pub type StatusId = i16;
