//! Per-channel append-only record log
//!
//! Each channel owns one text file, `logs_{channel}.txt`, holding one record
//! per line in the form `<YYYY-MM-DD HH:MM:SS>: <payload>`. Lines are only
//! ever appended.

use chrono::{Local, NaiveDateTime, Timelike};
use dashmap::DashMap;
use depot_core::ChannelId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::repr;
use crate::{Error, Result};

/// Timestamp layout of every log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Boundary between timestamp and payload
pub const SEPARATOR: &str = ": ";

/// One logged event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub data: String,
}

impl LogRecord {
    /// Record captured at `timestamp`, truncated to whole seconds
    pub fn new(timestamp: NaiveDateTime, data: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            data: data.into(),
        }
    }

    /// Line as written to the channel file, newline included
    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            SEPARATOR,
            self.data
        )
    }

    /// Parse a stored line. Only the first separator splits the line.
    pub fn parse_line(channel: ChannelId, line: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedLogLine {
            channel,
            line: line.to_string(),
            reason,
        };

        let (timestamp, data) = line
            .split_once(SEPARATOR)
            .ok_or_else(|| malformed(format!("missing '{}' separator", SEPARATOR)))?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| malformed(format!("bad timestamp '{}': {}", timestamp, e)))?;

        Ok(Self {
            timestamp,
            data: data.to_string(),
        })
    }
}

/// Append-only logs, one file per channel under a common root.
///
/// Writers to the same channel are serialized so that lines never
/// interleave; different channels proceed independently.
pub struct ChannelLog {
    root: PathBuf,
    locks: DashMap<ChannelId, Arc<Mutex<()>>>,
}

impl ChannelLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, channel: ChannelId) -> PathBuf {
        self.root.join(channel.log_file_name())
    }

    /// Append `payload` stamped with the current local time
    pub async fn append(&self, channel: ChannelId, payload: &Map<String, Value>) -> Result<LogRecord> {
        let record = LogRecord::new(Local::now().naive_local(), repr::render_object(payload));
        self.append_record(channel, &record).await?;
        Ok(record)
    }

    /// Append an already stamped record, creating the channel file if needed
    pub async fn append_record(&self, channel: ChannelId, record: &LogRecord) -> Result<()> {
        let lock = self.channel_lock(channel);
        let _guard = lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(channel))
            .await?;
        file.write_all(record.to_line().as_bytes()).await?;
        file.flush().await?;

        debug!(%channel, timestamp = %record.timestamp, "Record appended");
        Ok(())
    }

    /// Most recent record of a channel
    pub async fn last_record(&self, channel: ChannelId) -> Result<LogRecord> {
        let content = {
            // Channels never appended to by this process have no writer to
            // wait for, and must not grow the lock table.
            let lock = self.locks.get(&channel).map(|entry| entry.value().clone());
            let _guard = match &lock {
                Some(lock) => Some(lock.lock().await),
                None => None,
            };

            match fs::read_to_string(self.path_for(channel)).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(Error::LogNotFound(channel))
                }
                Err(e) => return Err(e.into()),
            }
        };

        let line = content
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or(Error::NoRecords(channel))?;

        LogRecord::parse_line(channel, line)
    }

    fn channel_lock(&self, channel: ChannelId) -> Arc<Mutex<()>> {
        self.locks
            .entry(channel)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
