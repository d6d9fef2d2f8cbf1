use chrono::{DateTime, Utc};

/// Source of "now" for record timestamps.
///
/// Injected so ordering-sensitive code can be driven by a fixed clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
