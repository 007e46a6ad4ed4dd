/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Checkpoint event identifier. Client-suppliable so that a retried
/// submission can be detected as a duplicate.
pub type EventId = uuid::Uuid;
