//! Metrics for the routine cache.
//!
//! With the `metrics` feature the functions below record through the
//! [`metrics`](https://docs.rs/metrics) facade; the host installs the
//! recorder. Without it they compile to nothing. Logging goes through
//! `tracing` unconditionally and needs no setup here.

#[cfg(feature = "metrics")]
mod metrics;

#[cfg(feature = "metrics")]
pub use metrics::{
    describe_metrics, record_routine_build, record_routine_build_error, record_routine_hit,
    record_routine_miss, set_routine_cache_size,
};

#[cfg(not(feature = "metrics"))]
mod noop {
    #[allow(clippy::missing_const_for_fn)]
    pub fn describe_metrics() {}

    #[allow(clippy::missing_const_for_fn)]
    pub fn record_routine_hit() {}

    #[allow(clippy::missing_const_for_fn)]
    pub fn record_routine_miss() {}

    #[allow(clippy::missing_const_for_fn)]
    pub fn record_routine_build(_kind: &'static str) {}

    #[allow(clippy::missing_const_for_fn)]
    pub fn record_routine_build_error() {}

    #[allow(clippy::missing_const_for_fn)]
    pub fn set_routine_cache_size(_size: usize) {}
}

#[cfg(not(feature = "metrics"))]
pub use noop::{
    describe_metrics, record_routine_build, record_routine_build_error, record_routine_hit,
    record_routine_miss, set_routine_cache_size,
};
