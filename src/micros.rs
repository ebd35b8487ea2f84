use core::{fmt, ops::Add};

/// A clock reading or a span of wall-clock time, in microseconds.
///
/// Readings only ever move forward, so the type is unsigned and spans are taken
/// with [`UMicros::saturating_sub`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UMicros(u64);

impl UMicros {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw microsecond count
    #[inline]
    pub const fn new(microseconds: u64) -> Self {
        Self(microseconds)
    }

    /// The raw microsecond count
    #[inline]
    pub const fn us(&self) -> u64 {
        self.0
    }

    /// ms -> us
    #[inline]
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    /// s -> us
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// The time from `earlier` to `self`, or zero if `earlier` is later.
    pub const fn saturating_sub(&self, earlier: Self) -> Self {
        Self(self.0.saturating_sub(earlier.0))
    }
}

impl Add for UMicros {
    type Output = UMicros;
    fn add(self, rhs: Self) -> Self::Output {
        UMicros(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for UMicros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}µs", self.0)
    }
}

#[test]
fn spans_never_underflow() {
    use pretty_assertions::assert_eq;
    let early = UMicros::from_ms(2);
    let late = UMicros::from_ms(5);
    assert_eq!(late.saturating_sub(early), UMicros::new(3_000));
    assert_eq!(early.saturating_sub(late), UMicros::ZERO);
    assert_eq!((early + late).us(), 7_000);
    assert_eq!(alloc::format!("{}", UMicros::from_secs(1)), "1000000µs");
}
