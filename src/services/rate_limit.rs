//! Turn rate gate.
//!
//! Allows one chat turn per interval. Only accepted turns consume capacity,
//! so a rejected turn does not push the next allowed time further out.

use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

pub const RATE_LIMIT_WARNING: &str = "You're sending requests too fast. Please wait a few seconds.";

pub struct TurnGate<C: Clock = DefaultClock> {
    /// `None` when the interval is zero.
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<C::Instant>>>,
    clock: C,
}

impl TurnGate<DefaultClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, DefaultClock::default())
    }
}

impl<C: Clock> TurnGate<C> {
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        let limiter =
            Quota::with_period(interval).map(|quota| RateLimiter::direct_with_clock(quota, &clock));
        Self { limiter, clock }
    }

    /// Take the slot for one turn, or report how long until the next one.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        match &self.limiter {
            None => Ok(()),
            Some(limiter) => limiter
                .check()
                .map_err(|not_until| not_until.wait_time_from(self.clock.now())),
        }
    }
}
