//! Thin wrapper over `getrusage(RUSAGE_SELF)` for per-item CPU time and
//! peak resident memory deltas.

use std::mem::MaybeUninit;

#[derive(Clone, Copy, Debug)]
pub struct Usage {
    pub cpu_time_s: f64,
    pub max_rss_bytes: u64,
}

pub fn usage() -> Usage {
    let mut ru = MaybeUninit::<libc::rusage>::zeroed();
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, ru.as_mut_ptr()) };
    if rc != 0 {
        return Usage {
            cpu_time_s: 0.0,
            max_rss_bytes: 0,
        };
    }
    let ru = unsafe { ru.assume_init() };

    let user = ru.ru_utime.tv_sec as f64 + ru.ru_utime.tv_usec as f64 / 1_000_000.0;
    let sys = ru.ru_stime.tv_sec as f64 + ru.ru_stime.tv_usec as f64 / 1_000_000.0;

    // Linux reports ru_maxrss in KiB.
    let max_rss_bytes = (ru.ru_maxrss.max(0) as u64) * 1024;

    Usage {
        cpu_time_s: user + sys,
        max_rss_bytes,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn usage_reports_non_negative_values() {
        let u = usage();
        assert!(u.cpu_time_s >= 0.0);
    }

    #[test]
    fn usage_max_rss_is_monotonic_non_decreasing() {
        let before = usage();
        let _v: Vec<u8> = vec![0; 16 * 1024 * 1024];
        let after = usage();
        assert!(after.max_rss_bytes >= before.max_rss_bytes);
    }
}
