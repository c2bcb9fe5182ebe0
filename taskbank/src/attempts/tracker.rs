//! @ai:module:intent Attempt counting and timed lockout as pure state transitions
//! @ai:module:layer domain
//! @ai:module:public_api AttemptRecord, LockoutPolicy, Gate, AttemptStatus, Clock, SystemClock, ManualClock, gate, record_failure, record_success
//! @ai:module:stateless true

use crate::config::LockoutConfig;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BLOCK_SECONDS: i64 = 10;

/// @ai:intent Remaining tries and lockout state for one (client, exercise, language)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempts_left: u32,
    pub is_blocked: bool,
    pub block_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    /// @ai:intent A record in the initial Active state
    /// @ai:effects pure
    pub fn fresh(policy: &LockoutPolicy) -> Self {
        Self {
            attempts_left: policy.max_attempts,
            is_blocked: false,
            block_until: None,
        }
    }
}

/// @ai:intent How many failures are allowed and how long the lockout lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub block_duration: TimeDelta,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            block_duration: TimeDelta::seconds(DEFAULT_BLOCK_SECONDS),
        }
    }
}

impl LockoutPolicy {
    /// @ai:intent Build a policy from configuration; at least one attempt is always allowed
    /// @ai:effects pure
    pub fn from_config(config: &LockoutConfig) -> Self {
        let block_seconds = i64::try_from(config.block_seconds).unwrap_or(i64::MAX / 1000);

        Self {
            max_attempts: config.max_attempts.max(1),
            block_duration: TimeDelta::try_seconds(block_seconds)
                .unwrap_or(TimeDelta::seconds(DEFAULT_BLOCK_SECONDS)),
        }
    }

    /// @ai:intent Lockout length reported at the moment a block starts
    /// @ai:effects pure
    pub fn block_seconds(&self) -> u64 {
        u64::try_from(self.block_duration.num_seconds()).unwrap_or(0)
    }
}

/// @ai:intent Outcome of checking whether a submission may run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// The submission may proceed with this (possibly reset) record.
    Open(AttemptRecord),
    Blocked { seconds_remaining: u64 },
}

/// @ai:intent Read-only view of an attempt record for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AttemptStatus {
    Active { attempts_left: u32 },
    Blocked { time_left: u64 },
}

/// @ai:intent Whole seconds until `until`, rounded up
/// @ai:pre now < until
/// @ai:effects pure
pub fn seconds_remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0);
    u64::try_from(millis).unwrap_or(0).div_ceil(1000)
}

/// @ai:intent Decide whether a submission may run, lifting an expired block
/// @ai:post Open records always satisfy 1 <= attempts_left <= max_attempts
/// @ai:effects pure
pub fn gate(record: &AttemptRecord, now: DateTime<Utc>, policy: &LockoutPolicy) -> Gate {
    if record.is_blocked {
        return match record.block_until {
            Some(until) if now < until => Gate::Blocked {
                seconds_remaining: seconds_remaining(until, now),
            },
            _ => Gate::Open(AttemptRecord::fresh(policy)),
        };
    }

    // An unblocked record with no attempts left cannot be produced by the
    // transitions below; treat it as a fresh start.
    if record.attempts_left == 0 || record.attempts_left > policy.max_attempts {
        return Gate::Open(AttemptRecord::fresh(policy));
    }

    Gate::Open(record.clone())
}

/// @ai:intent Count a failed attempt, blocking when none remain
/// @ai:pre record is Open (returned by gate)
/// @ai:post attempts_left == 0 iff is_blocked
/// @ai:effects pure
pub fn record_failure(record: &AttemptRecord, now: DateTime<Utc>, policy: &LockoutPolicy) -> AttemptRecord {
    let attempts_left = record.attempts_left.saturating_sub(1);

    if attempts_left == 0 {
        AttemptRecord {
            attempts_left: 0,
            is_blocked: true,
            block_until: Some(now + policy.block_duration),
        }
    } else {
        AttemptRecord {
            attempts_left,
            is_blocked: false,
            block_until: None,
        }
    }
}

/// @ai:intent A correct submission resets the record
/// @ai:effects pure
pub fn record_success(policy: &LockoutPolicy) -> AttemptRecord {
    AttemptRecord::fresh(policy)
}

/// @ai:intent Summarize a record for display without mutating it
/// @ai:effects pure
pub fn status(record: &AttemptRecord, now: DateTime<Utc>, policy: &LockoutPolicy) -> AttemptStatus {
    match gate(record, now, policy) {
        Gate::Open(record) => AttemptStatus::Active {
            attempts_left: record.attempts_left,
        },
        Gate::Blocked { seconds_remaining } => AttemptStatus::Blocked {
            time_left: seconds_remaining,
        },
    }
}

/// @ai:intent Source of the current time for lockout arithmetic
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// @ai:intent Wall-clock time that never runs backwards within a process
///
/// The wall clock is sampled once; later readings add monotonic elapsed time,
/// so system clock adjustments cannot shorten or extend a running lockout.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.anchor.elapsed()).unwrap_or(TimeDelta::zero());
        self.anchor_wall + elapsed
    }
}

/// @ai:intent A clock moved by hand, for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// @ai:intent Move the clock forward
    /// @ai:effects state:write
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
