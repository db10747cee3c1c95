use std::path::Path;

use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Host resource usage, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostMetrics {
    pub cpu_percent: f32,
    pub memory_percent: f64,
    /// Filesystem holding `/`, or the largest disk when there is none.
    pub disk_percent: Option<f64>,
}

/// Sample CPU, memory and disk usage. CPU needs two readings a short
/// interval apart, so this runs on the blocking pool.
pub async fn sample() -> Option<HostMetrics> {
    match tokio::task::spawn_blocking(sample_blocking).await {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::debug!(error = %e, "host metrics task failed");
            None
        }
    }
}

fn sample_blocking() -> Option<HostMetrics> {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        return None;
    }

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|d| d.total_space()));
    let disk_percent = disk
        .filter(|d| d.total_space() > 0)
        .map(|d| percent(d.total_space().saturating_sub(d.available_space()), d.total_space()));

    Some(HostMetrics {
        cpu_percent: sys.global_cpu_usage(),
        memory_percent: percent(sys.used_memory(), total),
        disk_percent,
    })
}

fn percent(used: u64, total: u64) -> f64 {
    used as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_total() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(0, 10), 0.0);
    }

    #[tokio::test]
    async fn sample_is_within_bounds() {
        let Some(metrics) = sample().await else {
            return;
        };
        assert!((0.0..=100.0).contains(&metrics.memory_percent));
        assert!(metrics.cpu_percent >= 0.0);
        if let Some(disk) = metrics.disk_percent {
            assert!((0.0..=100.0).contains(&disk));
        }
    }
}
