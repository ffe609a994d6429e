//! Snapshot files: JSON arrays of raw records.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::FeedError;
use crate::odds::RawRecord;

/// Load the raw records of a snapshot file.
///
/// Items are returned unparsed so that one bad record does not reject the
/// whole file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Value>, FeedError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let text = fs::read_to_string(path).map_err(|source| FeedError::Read {
        path: display.clone(),
        source,
    })?;

    let value: Value = serde_json::from_str(&text).map_err(|source| FeedError::Parse {
        path: display.clone(),
        source,
    })?;

    match value {
        Value::Array(items) => {
            debug!(records = items.len(), "Snapshot file loaded");
            Ok(items)
        }
        _ => Err(FeedError::NotAnArray { path: display }),
    }
}

/// Write raw records as a pretty-printed JSON array.
pub fn save_records(path: impl AsRef<Path>, records: &[RawRecord]) -> Result<(), FeedError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let text = serde_json::to_string_pretty(records).map_err(|source| FeedError::Encode {
        path: display.clone(),
        source,
    })?;

    fs::write(path, text).map_err(|source| FeedError::Write {
        path: display,
        source,
    })
}
