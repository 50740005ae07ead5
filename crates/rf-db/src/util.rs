use chrono::NaiveDateTime;
use rf_core::error::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Timestamps are stored as sortable ISO-8601 text without offset.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("json encode failed: {message}")]
    JsonEncode { message: String },
    #[error("json decode failed: {message}")]
    JsonDecode { message: String },
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
    #[error("invalid id: {value}")]
    InvalidId { value: i64 },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Storage {
            message: err.to_string(),
        }
    }
}

pub fn storage(err: rusqlite::Error) -> StoreError {
    StoreError::Storage {
        message: err.to_string(),
    }
}

pub fn to_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn from_timestamp(value: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| DbError::InvalidTimestamp {
        value: value.to_string(),
    })
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_str(value).map_err(|err| DbError::JsonDecode {
        message: err.to_string(),
    })
}

pub fn to_sql_id(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub fn from_sql_id(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::InvalidId { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = NaiveDate::from_ymd_opt(2024, 2, 9)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert!(to_timestamp(&earlier) < to_timestamp(&later));
        assert_eq!(from_timestamp(&to_timestamp(&later)).unwrap(), later);
        assert!(from_timestamp("yesterday").is_err());
    }
}
