//! Marginal per-worker spawn cost measurement.
//!
//! Times creation+teardown of a 1-process "pool" then a 2-process pool; the
//! difference isolates the marginal cost of each extra worker from fixed
//! pool-initialization overhead. Uses the platform's universally-present
//! no-op command rather than re-executing the host binary, so this works
//! regardless of whether the host ever wires up the process executor.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::{MeasurementQuality, StartMethod};

const HARD_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(unix)]
fn noop_command() -> Command {
    let mut cmd = Command::new("true");
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

#[cfg(windows)]
fn noop_command() -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "exit", "0"]);
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

/// Spawns `n` no-op child processes concurrently and waits for all of them,
/// returning the wall-clock time for the whole pool's creation+teardown.
fn time_pool(n: usize) -> Option<Duration> {
    let start = Instant::now();

    let mut children = Vec::with_capacity(n);
    for _ in 0..n {
        children.push(noop_command().spawn().ok()?);
    }
    for mut child in children {
        child.wait().ok()?;
    }

    let elapsed = start.elapsed();
    (elapsed <= HARD_TIMEOUT).then_some(elapsed)
}

/// Measures the marginal spawn cost, falling back to the start method's
/// default when the measurement fails any quality check.
pub fn measure(start_method: StartMethod) -> (f64, MeasurementQuality) {
    let fallback = (start_method.default_spawn_cost_s(), MeasurementQuality::Fallback);

    let (Some(t1), Some(t2)) = (time_pool(1), time_pool(2)) else {
        log::warn!("profiler: spawn-cost probe failed to launch, using start-method default");
        return fallback;
    };

    let t1 = t1.as_secs_f64();
    let t2 = t2.as_secs_f64();
    let marginal = t2 - t1;

    if validate(start_method, t1, t2, marginal) {
        (marginal, MeasurementQuality::Ok)
    } else {
        log::debug!(
            "profiler: spawn-cost measurement ({:.4}s) failed quality checks, using default",
            marginal
        );
        fallback
    }
}

fn validate(start_method: StartMethod, t1: f64, t2: f64, marginal: f64) -> bool {
    let (lo, hi) = start_method.plausible_range_s();
    if !(marginal >= lo && marginal <= hi) {
        return false;
    }
    if !(t2 >= 1.1 * t1) {
        return false;
    }
    let estimate = start_method.default_spawn_cost_s();
    if !(marginal >= estimate / 10.0 && marginal <= 10.0 * estimate) {
        return false;
    }
    if !(marginal < 0.9 * t2) {
        return false;
    }
    true
}
