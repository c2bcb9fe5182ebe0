//! @ai:module:intent Per-client attempt counting with timed lockout
//! @ai:module:layer domain
//! @ai:module:public_api AttemptRecord, LockoutPolicy, Gate, AttemptStatus, Clock, AttemptKey, AttemptStore

pub mod store;
pub mod tracker;

pub use store::{AttemptKey, AttemptStore, FileStore, MemoryStore};
pub use tracker::{
    gate, record_failure, record_success, seconds_remaining, status, AttemptRecord, AttemptStatus,
    Clock, Gate, LockoutPolicy, ManualClock, SystemClock,
};
