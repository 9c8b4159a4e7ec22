/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Connection-scoped delivery address for realtime pushes.
///
/// Carries no authentication meaning.
pub type SessionId = String;

/// Convert epoch milliseconds (the wire format for `startTime`) into a
/// [`Timestamp`]. Returns `None` for values outside chrono's range.
pub fn timestamp_from_millis(ms: i64) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp_millis(ms)
}
