//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use snapclip_models::AspectProfile;

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "snapclip_runs_total";
    pub const CLIPS_RENDERED_TOTAL: &str = "snapclip_clips_rendered_total";
    pub const RENDER_FAILURES_TOTAL: &str = "snapclip_render_failures_total";
    pub const RENDER_DURATION_SECONDS: &str = "snapclip_render_duration_seconds";
    pub const SCENES_DETECTED: &str = "snapclip_scenes_detected";
}

/// Install a Prometheus recorder with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Record the outcome of a whole run.
pub fn record_run(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
}

/// Record how many scene changes a run found.
pub fn record_scenes_detected(count: usize) {
    histogram!(names::SCENES_DETECTED).record(count as f64);
}

/// Record a successful render.
pub fn record_clip_rendered(aspect: AspectProfile, duration_secs: f64) {
    let labels = [("aspect", aspect.to_string())];
    counter!(names::CLIPS_RENDERED_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a failed render.
pub fn record_render_failure(aspect: AspectProfile) {
    let labels = [("aspect", aspect.to_string())];
    counter!(names::RENDER_FAILURES_TOTAL, &labels).increment(1);
}
