//! Routine cache metrics

use metrics::{counter, describe_counter, describe_gauge, gauge};

const METRIC_HITS: &str = "rowbind_routine_cache_hits_total";
const METRIC_MISSES: &str = "rowbind_routine_cache_misses_total";
const METRIC_BUILDS: &str = "rowbind_routine_builds_total";
const METRIC_BUILD_ERRORS: &str = "rowbind_routine_build_errors_total";
const METRIC_SIZE: &str = "rowbind_routine_cache_size";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(METRIC_HITS, "Routine lookups served from the cache");
    describe_counter!(METRIC_MISSES, "Routine lookups that had to build");
    describe_counter!(METRIC_BUILDS, "Routines built, by kind");
    describe_counter!(METRIC_BUILD_ERRORS, "Routine builds that failed");
    describe_gauge!(METRIC_SIZE, "Routines currently cached");
}

pub fn record_routine_hit() {
    counter!(METRIC_HITS).increment(1);
}

pub fn record_routine_miss() {
    counter!(METRIC_MISSES).increment(1);
}

/// Record a completed build.
pub fn record_routine_build(kind: &'static str) {
    counter!(METRIC_BUILDS, "kind" => kind).increment(1);
}

pub fn record_routine_build_error() {
    counter!(METRIC_BUILD_ERRORS).increment(1);
}

/// Update the cache size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_routine_cache_size(size: usize) {
    gauge!(METRIC_SIZE).set(size as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_routine_hit();
        record_routine_miss();
        record_routine_build("row_to_object");
        record_routine_build_error();
        set_routine_cache_size(3);
    }
}
