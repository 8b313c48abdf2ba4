//! Physical/logical core detection with multi-layered fallbacks.
//!
//! Strategy order, stop at first success:
//! 1. `num_cpus::get_physical()`, a high-level OS API.
//! 2. Parse `/proc/cpuinfo`, counting distinct `(physical_id, core_id)` pairs.
//! 3. Invoke `lscpu` and parse its `CORE,SOCKET` columns.
//! 4. `max(1, logical_cores / 2)`.
//! 5. `1`.

use std::collections::HashSet;
use std::process::Command;

pub fn logical_cores() -> usize {
    num_cpus::get().max(1)
}

pub fn physical_cores() -> usize {
    if let Some(n) = from_num_cpus() {
        return n;
    }
    if let Some(n) = from_proc_cpuinfo() {
        log::debug!("profiler: physical core count from /proc/cpuinfo fallback");
        return n;
    }
    if let Some(n) = from_lscpu() {
        log::debug!("profiler: physical core count from lscpu fallback");
        return n;
    }
    let conservative = (logical_cores() / 2).max(1);
    log::warn!(
        "profiler: could not detect physical core count, falling back to logical/2 = {}",
        conservative
    );
    conservative
}

fn from_num_cpus() -> Option<usize> {
    let n = num_cpus::get_physical();
    (n >= 1).then_some(n)
}

fn from_proc_cpuinfo() -> Option<usize> {
    let text = std::fs::read_to_string("/proc/cpuinfo").ok()?;

    let mut pairs = HashSet::new();
    let mut physical_id = None;
    let mut core_id = None;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("physical id") {
            physical_id = v.rsplit(':').next()?.trim().parse::<u32>().ok();
        } else if let Some(v) = line.strip_prefix("core id") {
            core_id = v.rsplit(':').next()?.trim().parse::<u32>().ok();
        } else if line.trim().is_empty() {
            if let (Some(p), Some(c)) = (physical_id, core_id) {
                pairs.insert((p, c));
            }
            physical_id = None;
            core_id = None;
        }
    }
    if let (Some(p), Some(c)) = (physical_id, core_id) {
        pairs.insert((p, c));
    }

    (!pairs.is_empty()).then_some(pairs.len())
}

fn from_lscpu() -> Option<usize> {
    let out = Command::new("lscpu").arg("--parse=CORE,SOCKET").output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout);

    let mut pairs = HashSet::new();
    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(',');
        let core = parts.next()?.trim().parse::<u32>().ok()?;
        let socket = parts.next()?.trim().parse::<u32>().ok()?;
        pairs.insert((core, socket));
    }

    (!pairs.is_empty()).then_some(pairs.len())
}
