//! Host capability detection used to size the worker pool.

use serde::{Deserialize, Serialize};

/// Discovered resources of the current host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Number of CPU cores available to this process.
    pub cpu_cores: usize,
}

impl HostCapabilities {
    /// Discover resources of the current system.
    pub fn discover() -> Self {
        Self {
            cpu_cores: num_cpus(),
        }
    }

    /// Default number of parallel scoring workers: one per core.
    pub fn default_workers(&self) -> usize {
        self.cpu_cores.max(1)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_reports_at_least_one_worker() {
        let caps = HostCapabilities::discover();
        assert!(caps.cpu_cores >= 1);
        assert!(caps.default_workers() >= 1);
    }

    #[test]
    fn test_default_workers_never_zero() {
        let caps = HostCapabilities { cpu_cores: 0 };
        assert_eq!(caps.default_workers(), 1);
    }
}
