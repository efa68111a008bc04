//! Request counters for the depot server

use depot_telemetry::{Counter, Gauge, Histogram, HistogramSummary};
use serde::Serialize;

#[derive(Default)]
pub struct ServiceMetrics {
    pub uploads: Counter,
    pub upload_bytes: Counter,
    uploads_in_flight: Gauge,
    pub downloads: Counter,
    pub appends: Counter,
    pub lookups: Counter,
    pub not_found: Counter,
    pub append_latency_ms: Histogram,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub uploads_total: u64,
    pub upload_bytes_total: u64,
    pub uploads_in_flight: u64,
    pub downloads_total: u64,
    pub appends_total: u64,
    pub lookups_total: u64,
    pub not_found_total: u64,
    pub append_latency_ms: HistogramSummary,
}

/// Counts one upload as in flight until dropped
#[must_use = "the upload stops counting as in flight when this is dropped"]
pub struct InFlight {
    gauge: Gauge,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an upload as started; it ends when the guard drops, including
    /// when the request future is cancelled.
    pub fn track_upload(&self) -> InFlight {
        self.uploads_in_flight.inc();
        InFlight {
            gauge: self.uploads_in_flight.clone(),
        }
    }

    pub fn snapshot(&self, uptime_secs: u64) -> StatsResponse {
        StatsResponse {
            uptime_secs,
            uploads_total: self.uploads.get(),
            upload_bytes_total: self.upload_bytes.get(),
            uploads_in_flight: self.uploads_in_flight.get(),
            downloads_total: self.downloads.get(),
            appends_total: self.appends.get(),
            lookups_total: self.lookups.get(),
            not_found_total: self.not_found.get(),
            append_latency_ms: self.append_latency_ms.summary(),
        }
    }
}
