// Retry policy and circuit breaker used by the resilient transport

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::config::{CircuitBreakerConfig, RetryConfig};

/// Delay to wait before the next attempt. `attempt` is the 1-based number of
/// the attempt that just failed.
pub trait BackoffStrategy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Exponential backoff with jitter, capped at `max_backoff_ms`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: RetryConfig,
}

impl ExponentialBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let config = &self.config;
        let exponent = attempt.saturating_sub(1) as f64;
        let base_backoff_ms = (config.initial_backoff_ms as f64 * config.backoff_multiplier.powf(exponent))
            .min(config.max_backoff_ms as f64);

        // Apply jitter to prevent thundering herd
        let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }
}

/// Retries immediately. Meant for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl BackoffStrategy for NoBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Arc<dyn BackoffStrategy>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: impl BackoffStrategy + 'static) -> Self {
        Self {
            max_attempts,
            backoff: Arc::new(backoff),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, ExponentialBackoff::new(config.clone()))
    }

    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, NoBackoff)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Trips after a run of failed queries so a dead API is not hammered with
/// full retry cycles from every caller.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    success_threshold: u32,
    open_duration: Duration,
    state: State,
}

#[derive(Debug)]
enum State {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32, probing: bool },
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            success_threshold: config.success_threshold.max(1),
            open_duration: Duration::from_millis(config.reset_timeout_ms),
            state: State::Closed { failures: 0 },
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    /// `Err(remaining)` while open; moves to half-open once the timeout has passed.
    /// Half-open lets a single trial call through at a time; the rest get
    /// `Err(Duration::ZERO)` until it settles.
    pub fn should_allow_call(&mut self) -> Result<(), Duration> {
        match &mut self.state {
            State::Closed { .. } => Ok(()),
            State::HalfOpen { probing: true, .. } => Err(Duration::ZERO),
            State::HalfOpen { probing, .. } => {
                *probing = true;
                Ok(())
            }
            State::Open { opened_at } => {
                let elapsed = opened_at.elapsed();
                if elapsed >= self.open_duration {
                    self.state = State::HalfOpen {
                        successes: 0,
                        probing: true,
                    };
                    Ok(())
                } else {
                    Err(self.open_duration - elapsed)
                }
            }
        }
    }

    pub fn success(&mut self) {
        match &mut self.state {
            State::Closed { failures } => *failures = 0,
            State::HalfOpen { successes, probing } => {
                *successes += 1;
                *probing = false;
                if *successes >= self.success_threshold {
                    self.state = State::Closed { failures: 0 };
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn fail(&mut self) {
        match &mut self.state {
            State::Closed { failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    self.state = State::Open {
                        opened_at: Instant::now(),
                    };
                }
            }
            State::HalfOpen { .. } => {
                self.state = State::Open {
                    opened_at: Instant::now(),
                };
            }
            State::Open { .. } => {}
        }
    }
}
