use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One checkpoint of an analysis run.
#[derive(Debug, Clone)]
pub struct PhaseSample {
    pub phase: String,
    /// Time spent since the previous checkpoint.
    pub duration: Duration,
    pub cpu_usage: Option<f32>,
    pub memory_mb: Option<u64>,
}

/// Per-phase wall time, plus process CPU and memory when built with the
/// `cli` feature.
pub struct SystemMonitor {
    enabled: bool,
    started: Instant,
    samples: Mutex<Vec<PhaseSample>>,
    last: Mutex<Instant>,
    #[cfg(feature = "cli")]
    probe: Option<Mutex<probe::ProcessProbe>>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            samples: Mutex::new(Vec::new()),
            last: Mutex::new(now),
            #[cfg(feature = "cli")]
            probe: if enabled {
                probe::ProcessProbe::new().map(Mutex::new)
            } else {
                None
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a checkpoint named `phase`; `None` when monitoring is off.
    pub fn sample(&self, phase: &str) -> Option<PhaseSample> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let duration = {
            let mut last = self.last.lock().ok()?;
            let d = now.duration_since(*last);
            *last = now;
            d
        };
        let (cpu_usage, memory_mb) = self.process_usage();

        let sample = PhaseSample {
            phase: phase.to_string(),
            duration,
            cpu_usage,
            memory_mb,
        };
        self.samples.lock().ok()?.push(sample.clone());
        Some(sample)
    }

    #[cfg(feature = "cli")]
    fn process_usage(&self) -> (Option<f32>, Option<u64>) {
        match self.probe.as_ref().and_then(|p| p.lock().ok()) {
            Some(mut probe) => match probe.read() {
                Some((cpu, mem)) => (Some(cpu), Some(mem)),
                None => (None, None),
            },
            None => (None, None),
        }
    }

    #[cfg(not(feature = "cli"))]
    fn process_usage(&self) -> (Option<f32>, Option<u64>) {
        (None, None)
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(sample) = self.sample(phase) {
            match (sample.cpu_usage, sample.memory_mb) {
                (Some(cpu), Some(mem)) => tracing::info!(
                    "📊 {} - {:?}, CPU: {:.1}%, Memory: {}MB",
                    sample.phase,
                    sample.duration,
                    cpu,
                    mem
                ),
                _ => tracing::info!("📊 {} - {:?}", sample.phase, sample.duration),
            }
        }
    }

    pub fn peak_memory_mb(&self) -> Option<u64> {
        let samples = self.samples.lock().ok()?;
        samples.iter().filter_map(|s| s.memory_mb).max()
    }

    /// Slowest recorded phase and its duration.
    pub fn slowest_phase(&self) -> Option<(String, Duration)> {
        let samples = self.samples.lock().ok()?;
        samples
            .iter()
            .max_by_key(|s| s.duration)
            .map(|s| (s.phase.clone(), s.duration))
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let total = self.started.elapsed();
        match (self.slowest_phase(), self.peak_memory_mb()) {
            (Some((phase, d)), Some(peak)) => tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Slowest: {} ({:?}), Peak Memory: {}MB",
                total,
                phase,
                d,
                peak
            ),
            (Some((phase, d)), None) => tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Slowest: {} ({:?})",
                total,
                phase,
                d
            ),
            _ => tracing::info!("📊 Final Stats - Total Time: {:?}", total),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(feature = "cli")]
mod probe {
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

    /// CPU and resident memory of the current process.
    pub struct ProcessProbe {
        system: System,
        pid: Pid,
    }

    impl ProcessProbe {
        pub fn new() -> Option<Self> {
            let pid = match sysinfo::get_current_pid() {
                Ok(pid) => pid,
                Err(e) => {
                    tracing::warn!("Process monitoring unavailable: {}", e);
                    return None;
                }
            };
            let mut system = System::new_with_specifics(RefreshKind::nothing());
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::everything(),
            );
            Some(Self { system, pid })
        }

        pub fn read(&mut self) -> Option<(f32, u64)> {
            self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[self.pid]),
                true,
                ProcessRefreshKind::everything(),
            );
            let process = self.system.process(self.pid)?;
            // bytes -> MB
            Some((process.cpu_usage(), process.memory() / 1024 / 1024))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::default();
        assert!(monitor.sample("Extract").is_none());
        assert!(monitor.slowest_phase().is_none());
    }

    #[test]
    fn test_enabled_monitor_tracks_phases() {
        let monitor = SystemMonitor::new(true);
        monitor.log_stats("Extract");
        std::thread::sleep(Duration::from_millis(5));
        monitor.log_stats("Transform");

        let (phase, duration) = monitor.slowest_phase().unwrap();
        assert_eq!(phase, "Transform");
        assert!(duration >= Duration::from_millis(5));
    }
}
