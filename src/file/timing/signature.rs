/// A time signature such as 3/4 or 6/8.
///
/// Stored as written: `denominator` is the note value (4 for a quarter note),
/// not the power-of-two exponent used inside the meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Note value of one beat
    pub denominator: u8,
}

impl TimeSignature {
    /// Common time.
    pub const COMMON: Self = Self::new(4, 4);

    /// Create a new time signature
    pub const fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse the body of a Time Signature meta event (`FF 58 04 nn dd cc bb`).
    ///
    /// Only `nn` and `dd` are used. Returns `None` if fewer than two bytes are
    /// present or the exponent does not fit a `u8` note value.
    pub const fn from_meta(data: &[u8]) -> Option<Self> {
        if data.len() < 2 || data[1] > 7 {
            return None;
        }
        Some(Self::new(data[0], 1 << data[1]))
    }

    /// Numerator in the top byte, denominator in the bottom byte.
    pub const fn packed(&self) -> u16 {
        u16::from_be_bytes([self.numerator, self.denominator])
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

#[test]
fn meta_exponent_becomes_note_value() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        TimeSignature::from_meta(&[6, 3, 24, 8]),
        Some(TimeSignature::new(6, 8))
    );
    assert_eq!(
        TimeSignature::from_meta(&[3, 2]),
        Some(TimeSignature::new(3, 4))
    );
    assert_eq!(TimeSignature::from_meta(&[3]), None);
    assert_eq!(TimeSignature::from_meta(&[3, 9]), None);
    assert_eq!(TimeSignature::new(3, 4).packed(), 0x0304);
}
