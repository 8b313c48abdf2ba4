use serde::{Deserialize, Serialize};

/// The platform's process-creation method, used to pick a spawn-cost
/// default and to validate measured spawn costs against a plausible range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMethod {
    /// Linux default: `fork()` + `exec`.
    Fork,
    /// Windows, and macOS's modern default: full process image spawn.
    Spawn,
    /// Linux opt-in: a long-lived server process forks workers on demand.
    ForkServer,
    /// No multi-process support; workers are threads only.
    ThreadsOnly,
}

impl StartMethod {
    /// Plausible range for a *measured* marginal spawn cost, in seconds.
    pub fn plausible_range_s(self) -> (f64, f64) {
        match self {
            StartMethod::Fork => (0.001, 0.100),
            StartMethod::Spawn => (0.050, 1.000),
            StartMethod::ForkServer => (0.010, 0.500),
            StartMethod::ThreadsOnly => (0.0001, 0.050),
        }
    }

    /// Start-method default spawn cost, used whenever measurement is
    /// disabled or fails validation.
    pub fn default_spawn_cost_s(self) -> f64 {
        match self {
            StartMethod::Fork => 0.015,
            StartMethod::Spawn => 0.200,
            StartMethod::ForkServer => 0.075,
            StartMethod::ThreadsOnly => 0.002,
        }
    }
}

pub fn detect() -> StartMethod {
    if cfg!(windows) {
        return StartMethod::Spawn;
    }
    if cfg!(unix) {
        if std::env::var("PERFOPT_FORKSERVER").as_deref() == Ok("1") {
            return StartMethod::ForkServer;
        }
        return StartMethod::Fork;
    }
    StartMethod::ThreadsOnly
}
