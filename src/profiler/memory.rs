//! Container-aware memory detection with multi-layered fallbacks.
//!
//! Order: cgroup v2 limit, then cgroup v1 limit, each honored against host
//! memory (the "effective" limit is the smaller of the two), then the
//! OS-reported available memory, then a 4 GiB constant.

const FALLBACK_BYTES: u64 = 4 * 1024 * 1024 * 1024;

const CGROUP_V2_MAX: &str = "/sys/fs/cgroup/memory.max";
const CGROUP_V1_LIMIT: &str = "/sys/fs/cgroup/memory/memory.limit_in_bytes";

pub fn available_memory_bytes() -> u64 {
    let host = host_available_bytes();

    match cgroup_limit_bytes() {
        Some(limit) => {
            let effective = limit.min(host.unwrap_or(limit));
            log::debug!(
                "profiler: cgroup memory limit {} bytes, host available {:?}, effective {}",
                limit,
                host,
                effective
            );
            effective
        }
        None => host.unwrap_or_else(|| {
            log::warn!(
                "profiler: no memory source available, falling back to {} bytes",
                FALLBACK_BYTES
            );
            FALLBACK_BYTES
        }),
    }
}

fn cgroup_limit_bytes() -> Option<u64> {
    if let Some(n) = read_u64_file(CGROUP_V2_MAX) {
        // cgroup v2 reports the literal string "max" when unconstrained.
        return Some(n);
    }
    read_u64_file(CGROUP_V1_LIMIT).filter(|&n| n < u64::MAX / 2)
}

fn read_u64_file(path: &str) -> Option<u64> {
    std::fs::read_to_string(path).ok()?.trim().parse::<u64>().ok()
}

fn host_available_bytes() -> Option<u64> {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let available = sys.available_memory();
    (available > 0).then_some(available)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn available_memory_is_positive() {
        assert!(available_memory_bytes() > 0);
    }

    #[test]
    fn cgroup_v1_max_sentinel_is_rejected() {
        // cgroup v1's "unlimited" sentinel is a value near u64::MAX/page_size;
        // make sure it doesn't get reported as the effective limit.
        assert!(Some(u64::MAX - 1).filter(|&n| n < u64::MAX / 2).is_none());
    }
}
