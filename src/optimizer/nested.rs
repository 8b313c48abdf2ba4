//! Nested-parallelism detection.
//!
//! Rust has no generic way to ask "is some other thread pool already active
//! in this process" from outside that pool's own crate. We approximate it by
//! comparing the process's live thread count against its logical core count:
//! a process already running meaningfully more threads than it has logical
//! cores is a reasonable signal that something else (a `rayon` pool, an async
//! runtime, a caller's own worker threads) is already contending for CPU.

/// Returns `true` if nested parallelism is suspected. Always `false` when
/// `PERFOPT_TESTING_MODE=1` is set: the test host itself commonly runs a
/// thread pool, which would otherwise produce false positives.
pub fn detected(logical_cores: usize) -> bool {
    if std::env::var("PERFOPT_TESTING_MODE").as_deref() == Ok("1") {
        return false;
    }
    match current_thread_count() {
        Some(n) => n > logical_cores,
        None => false,
    }
}

#[cfg(target_os = "linux")]
fn current_thread_count() -> Option<usize> {
    let text = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("Threads:") {
            return v.trim().parse().ok();
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn current_thread_count() -> Option<usize> {
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::TESTING_MODE_GUARD;

    #[test]
    fn testing_mode_suppresses_detection() {
        let _lock = TESTING_MODE_GUARD.lock().unwrap();
        std::env::set_var("PERFOPT_TESTING_MODE", "1");
        assert!(!detected(1));
        std::env::remove_var("PERFOPT_TESTING_MODE");
    }

    #[test]
    fn low_thread_count_is_not_flagged() {
        let _lock = TESTING_MODE_GUARD.lock().unwrap();
        std::env::remove_var("PERFOPT_TESTING_MODE");
        assert!(!detected(usize::MAX));
    }
}
