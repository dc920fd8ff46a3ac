//! Process resource sampling for pool metrics

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// CPU and memory usage of the current process
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSample {
	pub cpu_percent: f32,
	pub memory_mb: f64,
}

/// Samples the current process through `sysinfo`
///
/// CPU usage is computed between two refreshes, so the first sample after
/// construction reports 0%.
pub struct ProcessSampler {
	system: System,
	pid: Option<Pid>,
}

impl Default for ProcessSampler {
	fn default() -> Self {
		Self::new()
	}
}

impl ProcessSampler {
	pub fn new() -> Self {
		Self {
			system: System::new(),
			pid: sysinfo::get_current_pid().ok(),
		}
	}

	pub fn sample(&mut self) -> SystemSample {
		let Some(pid) = self.pid else {
			return SystemSample::default();
		};
		self.system.refresh_processes_specifics(
			ProcessesToUpdate::Some(&[pid]),
			true,
			ProcessRefreshKind::new().with_cpu().with_memory(),
		);

		match self.system.process(pid) {
			Some(process) => SystemSample {
				cpu_percent: process.cpu_usage(),
				memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
			},
			None => SystemSample::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_sample_reports_own_memory() {
		// Arrange
		let mut sampler = ProcessSampler::new();

		// Act
		let sample = sampler.sample();

		// Assert
		assert!(sample.memory_mb > 0.0);
		assert!(sample.cpu_percent >= 0.0);
	}
}
