//! Per-pool circuit breaker
//!
//! A plain state machine with no clock of its own: every call takes the
//! current [`Instant`], and time-driven transitions are evaluated lazily by
//! [`CircuitBreaker::poll`]. The owning pool keeps it behind its metrics
//! mutex and calls `poll` on every acquire, record and health check.
//!
//! ```text
//! Closed --(threshold consecutive failures)--> Open
//! Open --(recovery_time since last failure)--> HalfOpen
//! HalfOpen --(grace period without failures)--> Closed
//! HalfOpen --(any failure)--> Open
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
	#[default]
	Closed,
	Open,
	HalfOpen,
}

impl fmt::Display for CircuitState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CircuitState::Closed => "closed",
			CircuitState::Open => "open",
			CircuitState::HalfOpen => "half_open",
		})
	}
}

/// A state change produced by the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
	pub from: CircuitState,
	pub to: CircuitState,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
	threshold: u32,
	recovery_time: Duration,
	half_open_grace: Duration,
	state: CircuitState,
	failure_count: u32,
	last_failure: Option<Instant>,
	half_open_since: Option<Instant>,
}

impl CircuitBreaker {
	pub fn new(threshold: u32, recovery_time: Duration, half_open_grace: Duration) -> Self {
		Self {
			threshold: threshold.max(1),
			recovery_time,
			half_open_grace,
			state: CircuitState::Closed,
			failure_count: 0,
			last_failure: None,
			half_open_since: None,
		}
	}

	pub fn state(&self) -> CircuitState {
		self.state
	}

	pub fn failure_count(&self) -> u32 {
		self.failure_count
	}

	pub fn last_failure(&self) -> Option<Instant> {
		self.last_failure
	}

	pub fn threshold(&self) -> u32 {
		self.threshold
	}

	/// Apply the transitions that depend only on elapsed time
	pub fn poll(&mut self, now: Instant) -> Option<Transition> {
		match self.state {
			CircuitState::Open => {
				let since_failure = self
					.last_failure
					.map(|at| now.saturating_duration_since(at))
					.unwrap_or(Duration::MAX);
				if since_failure > self.recovery_time {
					self.half_open_since = Some(now);
					return Some(self.move_to(CircuitState::HalfOpen));
				}
				None
			}
			CircuitState::HalfOpen => {
				let since_half_open = self
					.half_open_since
					.map(|at| now.saturating_duration_since(at))
					.unwrap_or(Duration::ZERO);
				if since_half_open >= self.half_open_grace {
					self.failure_count = 0;
					self.half_open_since = None;
					return Some(self.move_to(CircuitState::Closed));
				}
				None
			}
			CircuitState::Closed => None,
		}
	}

	/// Admit or reject a request
	///
	/// Rejections carry the time left until the breaker goes half-open.
	pub fn try_pass(&mut self, now: Instant) -> (Result<(), Duration>, Option<Transition>) {
		let transition = self.poll(now);
		if self.state != CircuitState::Open {
			return (Ok(()), transition);
		}
		let elapsed = self
			.last_failure
			.map(|at| now.saturating_duration_since(at))
			.unwrap_or(Duration::ZERO);
		(Err(self.recovery_time.saturating_sub(elapsed)), transition)
	}

	pub fn record_failure(&mut self, now: Instant) -> Option<Transition> {
		let polled = self.poll(now);
		self.failure_count = self.failure_count.saturating_add(1);
		self.last_failure = Some(now);

		match self.state {
			CircuitState::HalfOpen => {
				self.half_open_since = None;
				Some(self.move_to(CircuitState::Open))
			}
			CircuitState::Closed if self.failure_count >= self.threshold => {
				Some(self.move_to(CircuitState::Open))
			}
			_ => polled,
		}
	}

	pub fn record_success(&mut self, now: Instant) -> Option<Transition> {
		let transition = self.poll(now);
		if self.state == CircuitState::Closed {
			self.failure_count = 0;
		}
		transition
	}

	fn move_to(&mut self, to: CircuitState) -> Transition {
		let from = self.state;
		self.state = to;
		Transition { from, to }
	}
}
