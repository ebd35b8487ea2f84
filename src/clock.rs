#![doc = r#"
Wall-clock sources for the sequencer.

The [`Sequencer`](crate::sequencer::Sequencer) never sleeps. It reads a [`Clock`]
each time it is polled and schedules events from the difference between two
readings, so any monotonic microsecond counter will do.
"#]

use crate::UMicros;
use alloc::rc::Rc;
use core::cell::Cell;

/// A monotonic source of microseconds.
pub trait Clock {
    /// The current time. Must never go backwards.
    fn now(&self) -> UMicros;
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying counter, so a host can keep one handle
/// and give another to the sequencer.
///
/// # Example
/// ```rust
/// # use smfseq::prelude::*;
/// let clock = ManualClock::new();
/// let handle = clock.clone();
///
/// handle.advance(UMicros::from_ms(3));
/// assert_eq!(clock.now(), UMicros::new(3_000));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<UMicros>>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: UMicros) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute time. Ignored if `to` lies in the past.
    pub fn set(&self, to: UMicros) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UMicros {
        self.now.get()
    }
}

/// A clock backed by [`std::time::Instant`], measured from its creation.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Start a new clock at zero.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> UMicros {
        UMicros::new(self.origin.elapsed().as_micros() as u64)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> UMicros {
        (**self).now()
    }
}

#[test]
fn manual_clock_never_goes_backwards() {
    use pretty_assertions::assert_eq;
    let clock = ManualClock::new();
    clock.set(UMicros::new(500));
    clock.set(UMicros::new(100));
    assert_eq!(clock.now(), UMicros::new(500));
}
