//! Telemetry metric name constants.
//!
//! Centralised metric names for the provider. Consumers install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `vcloud_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `method`: HTTP method of an API call (e.g. "GET", "POST")
//! - `status`: HTTP status code, or "error" for transport failures
//! - `outcome`: resolved instance outcome: "present" or "absent"

/// Total API attempts sent to the management endpoint (retries included).
///
/// Labels: `method`, `status`.
pub const API_REQUESTS_TOTAL: &str = "vcloud_api_requests_total";

/// API attempt duration in seconds.
///
/// Labels: `method`.
pub const API_REQUEST_DURATION_SECONDS: &str = "vcloud_api_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `method`.
pub const API_RETRIES_TOTAL: &str = "vcloud_api_retries_total";

/// Instance cache lookups answered from a fresh entry.
pub const CACHE_HITS_TOTAL: &str = "vcloud_cache_hits_total";

/// Instance cache lookups that required a fetch (miss or stale entry).
pub const CACHE_MISSES_TOTAL: &str = "vcloud_cache_misses_total";

/// Entries removed by the opportunistic expiry sweep.
pub const CACHE_EVICTIONS_TOTAL: &str = "vcloud_cache_evictions_total";

/// Instances resolved from the API.
///
/// Labels: `outcome`.
pub const INSTANCES_RESOLVED_TOTAL: &str = "vcloud_instances_resolved_total";
