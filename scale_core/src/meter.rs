use crate::clock::{DynClock, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const ONE_MINUTE: f64 = 60.0;
const FIVE_MINUTES: f64 = 300.0;
const FIFTEEN_MINUTES: f64 = 900.0;

const WINDOWS: [f64; 3] = [ONE_MINUTE, FIVE_MINUTES, FIFTEEN_MINUTES];

/// Point-in-time view of a [`RateMeter`]. Rates are events per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    pub count: u64,
    pub rate_1m: f64,
    pub rate_5m: f64,
    pub rate_15m: f64,
    pub mean_rate: f64,
}

#[derive(Debug)]
struct DecayState {
    rates: [f64; 3],
    last: Instant,
}

impl DecayState {
    /// Decays every accumulator to `now`. Time never runs backwards here.
    fn decay_to(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last).as_secs_f64();
        if dt > 0.0 {
            for (rate, tau) in self.rates.iter_mut().zip(WINDOWS) {
                *rate *= (-dt / tau).exp();
            }
            self.last = now;
        }
    }
}

/// Event counter with exponentially decaying 1/5/15 minute rates.
///
/// Decay is continuous in time and applied lazily whenever the meter is
/// marked or read, so no background ticker is needed.
pub struct RateMeter {
    count: AtomicU64,
    created: Instant,
    state: Mutex<DecayState>,
    clock: DynClock,
}

impl RateMeter {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    pub fn with_clock(clock: DynClock) -> Self {
        let now = clock.now();
        Self {
            count: AtomicU64::new(0),
            created: now,
            state: Mutex::new(DecayState {
                rates: [0.0; 3],
                last: now,
            }),
            clock,
        }
    }

    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Records `n` events at the current instant. Marking zero events is a no-op.
    pub fn mark_n(&self, n: u64) {
        if n == 0 {
            return;
        }

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.decay_to(now);
        for (rate, tau) in state.rates.iter_mut().zip(WINDOWS) {
            *rate += n as f64 / tau;
        }
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        let now = self.clock.now();
        let rates = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.decay_to(now);
            state.rates
        };
        let count = self.count();

        MeterSnapshot {
            count,
            rate_1m: rates[0],
            rate_5m: rates[1],
            rate_15m: rates[2],
            mean_rate: mean_rate(count, now.saturating_duration_since(self.created)),
        }
    }
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateMeter")
            .field("count", &self.count())
            .finish()
    }
}

fn mean_rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
