use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

// Mocking out time so that it is possible to run tests that depend on time.
pub trait ISys: Send + Sync {
    /// The current timestamp in millis
    fn get_timestamp_millis(&self) -> i64;
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// System with a clock that only moves when told to
pub struct FixedSys {
    timestamp: AtomicI64,
}

impl FixedSys {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp: AtomicI64::new(timestamp),
        }
    }

    pub fn set_timestamp_millis(&self, timestamp: i64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.timestamp.fetch_add(millis, Ordering::SeqCst);
    }
}

impl ISys for FixedSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.timestamp.load(Ordering::SeqCst)
    }
}
