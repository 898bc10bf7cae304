/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Health scores are integers in `0..=100`.
pub type Score = u8;
