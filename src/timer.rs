//! Timing API for protocol delays
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

/// Delay trait provides a blocking suspension for protocol timing,
/// such as CSMA/CA backoff periods.
///
/// Implementations on preemptive or async platforms may yield rather than
/// spin, so long as the full duration elapses before returning.
pub trait Delay {
    /// Suspend for (at least) the provided number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl <T: Delay> Delay for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Thread-sleep based delay for hosted targets
#[cfg(feature = "std")]
#[derive(Clone, Debug, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            std::thread::sleep(std::time::Duration::from_micros(us as u64));
        }
    }
}

#[cfg(any(test, feature="mocks"))]
pub mod mock {
    use std::vec::Vec;
    use std::sync::{Arc, Mutex};

    /// Mock delay implementation to assist with testing,
    /// records requested delays without waiting
    #[derive(Clone, Debug)]
    pub struct MockDelay (Arc<Mutex<Vec<u32>>>);

    impl MockDelay {
        pub fn new() -> Self {
            Self(Arc::new(Mutex::new(Vec::new())))
        }

        /// Fetch each requested delay in microseconds
        pub fn delays(&self) -> Vec<u32> {
            self.0.lock().unwrap().clone()
        }

        /// Total requested delay in microseconds
        pub fn total_us(&self) -> u64 {
            self.0.lock().unwrap().iter().map(|d| *d as u64).sum()
        }

        pub fn clear(&mut self) {
            self.0.lock().unwrap().clear();
        }
    }

    impl super::Delay for MockDelay {
        fn delay_us(&mut self, us: u32) {
            self.0.lock().unwrap().push(us);
        }
    }
}
