use std::sync::Mutex;

use super::*;
use crate::config::Options;

// `snapshot`'s cache and `PERFOPT_DISABLE_MEASUREMENTS` are process-wide;
// serialize the tests that touch either so they don't race cargo's
// parallel test threads.
static GUARD: Mutex<()> = Mutex::new(());

#[test]
fn snapshot_has_sane_invariants() {
    let _lock = GUARD.lock().unwrap();
    reset_cache();
    let options = Options::default();
    let snap = snapshot(&options);
    assert!(snap.physical_cores >= 1);
    assert!(snap.logical_cores >= snap.physical_cores);
    assert!(snap.spawn_cost_s > 0.0);
    assert!(snap.chunk_overhead_s > 0.0);
}

#[test]
fn snapshot_is_cached_until_reset() {
    let _lock = GUARD.lock().unwrap();
    reset_cache();
    let options = Options::default();
    let first = snapshot(&options);
    let second = snapshot(&options);
    assert_eq!(first.physical_cores, second.physical_cores);
    assert_eq!(first.spawn_cost_s, second.spawn_cost_s);

    reset_cache();
    let third = snapshot(&options);
    assert_eq!(third.physical_cores, first.physical_cores);
}

#[test]
fn disabling_measurements_forces_start_method_defaults() {
    let _lock = GUARD.lock().unwrap();
    reset_cache();
    std::env::set_var("PERFOPT_DISABLE_MEASUREMENTS", "1");
    let snap = snapshot(&Options::default());
    std::env::remove_var("PERFOPT_DISABLE_MEASUREMENTS");

    assert_eq!(snap.measurement_quality.spawn, MeasurementQuality::Fallback);
    assert_eq!(snap.measurement_quality.chunk, MeasurementQuality::Fallback);
    assert_eq!(snap.spawn_cost_s, snap.start_method.default_spawn_cost_s());
    reset_cache();
}
