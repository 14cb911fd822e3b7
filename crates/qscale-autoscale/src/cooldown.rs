//! Cooldown tracking for scaling actions.
//!
//! A [`CooldownTimer`] is either unarmed or armed at some instant. The
//! first query arms it and reports "not passed"; later queries report
//! "passed" once the period has elapsed since arming. Resetting returns it
//! to unarmed, so the next query starts a fresh window.

use std::time::Duration;

use qscale_config::ScalingConfig;
use tokio::time::Instant;

/// Single cooldown window.
#[derive(Debug, Clone)]
pub struct CooldownTimer {
    period: Duration,
    since: Option<Instant>,
}

impl CooldownTimer {
    /// Create an unarmed timer.
    pub fn new(period: Duration) -> Self {
        Self { period, since: None }
    }

    /// The cooldown period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the timer has a reference instant.
    pub fn is_armed(&self) -> bool {
        self.since.is_some()
    }

    /// Query the timer against the current time.
    pub fn passed(&mut self) -> bool {
        self.passed_at(Instant::now())
    }

    /// Query the timer against `now`. Arms an unarmed timer.
    pub fn passed_at(&mut self, now: Instant) -> bool {
        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(since) => now >= since + self.period,
        }
    }

    /// Return to unarmed.
    pub fn reset(&mut self) {
        self.since = None;
    }
}

/// The two cooldown windows a scaling loop consults.
///
/// `backlog` gates actions taken while the queue has messages, `zero`
/// gates actions taken while the queue is empty.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    backlog: CooldownTimer,
    zero: CooldownTimer,
}

impl CooldownGate {
    pub fn new(backlog_period: Duration, zero_period: Duration) -> Self {
        Self {
            backlog: CooldownTimer::new(backlog_period),
            zero: CooldownTimer::new(zero_period),
        }
    }

    pub fn from_config(config: &ScalingConfig) -> Self {
        Self::new(config.cool_down_period, config.zero_scaling_cool_down)
    }

    pub fn backlog_cooldown_passed(&mut self) -> bool {
        self.backlog.passed()
    }

    pub fn backlog_cooldown_passed_at(&mut self, now: Instant) -> bool {
        self.backlog.passed_at(now)
    }

    pub fn zero_cooldown_passed(&mut self) -> bool {
        self.zero.passed()
    }

    pub fn zero_cooldown_passed_at(&mut self, now: Instant) -> bool {
        self.zero.passed_at(now)
    }

    /// Unarm both timers. Called once after a successful actuation.
    pub fn reset_all(&mut self) {
        self.backlog.reset();
        self.zero.reset();
    }

    pub fn backlog(&self) -> &CooldownTimer {
        &self.backlog
    }

    pub fn zero(&self) -> &CooldownTimer {
        &self.zero
    }
}
