use std::thread;
use std::time::Duration;

/// Blocking delay used for power settle times and inter-write gaps.
///
/// Implementations may simulate time; the default sleeps the calling thread.
pub trait Delay {
    fn delay(&self, d: Duration);

    #[inline]
    fn delay_ms(&self, ms: u64) {
        self.delay(Duration::from_millis(ms));
    }
}

/// Real delay backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl ThreadDelay {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Delay for ThreadDelay {
    #[inline]
    fn delay(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

impl<T: Delay + ?Sized> Delay for std::sync::Arc<T> {
    fn delay(&self, d: Duration) {
        (**self).delay(d);
    }
}

/// Delay doubles for tests in this and dependent crates (`test-util` feature).
#[cfg(any(test, feature = "test-util"))]
pub mod test_delay {
    use super::Delay;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records requested delays without sleeping. Clones share the record.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDelay {
        log: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingDelay {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sum of all requested delays.
        pub fn total(&self) -> Duration {
            self.calls().iter().sum()
        }

        /// Every requested delay, in order.
        pub fn calls(&self) -> Vec<Duration> {
            self.log.lock().map(|g| g.clone()).unwrap_or_default()
        }
    }

    impl Delay for RecordingDelay {
        fn delay(&self, d: Duration) {
            if let Ok(mut log) = self.log.lock() {
                log.push(d);
            }
        }
    }
}
