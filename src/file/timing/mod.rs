mod signature;
pub use signature::*;

use crate::UMicros;

/// Tempo used until the file sets one, in beats per minute
pub const DEFAULT_TEMPO: u16 = 120;
/// Microseconds per quarter note at [`DEFAULT_TEMPO`]
pub const DEFAULT_MICROS_PER_QUARTER_NOTE: u32 = 500_000;
/// Ticks per quarter note used when the file does not give one
pub const DEFAULT_TICKS_PER_QUARTER_NOTE: u16 = 48;

const MICROS_PER_MINUTE: u32 = 60_000_000;

#[doc = r#"
The playback time base

Converts the file's tempo (microseconds per quarter note), its resolution
(ticks per quarter note) and a caller-controlled tempo adjustment into the
wall-clock length of one tick:

```text
effective µs/qn = 60 000 000 / (60 000 000 / µs/qn + adjustment)
µs/tick         = effective µs/qn / ticks per quarter note
```

Every setter funnels through a single private recompute, so the derived values
are never stale between calls.

# Drift
[`TimeBase::micros_per_tick`] is truncated (500 000 µs / 48 = 10 416 µs rather
than 10 416.67 µs). Event scheduling does not use it. Cursors compare time in
*scaled* units of `µs × tpqn` ([`TimeBase::scale_elapsed`]) against
`ticks × effective µs/qn` ([`TimeBase::ticks_to_scaled`]). Both sides are
exact integers, so no fraction of a tick is ever lost.

# Example
```rust
# use smfseq::prelude::*;
let mut time = TimeBase::default();
assert_eq!(time.micros_per_tick(), 10_416);

time.set_tempo_adjust(30);
assert_eq!(time.tempo(), 120);
assert_eq!(time.effective_tempo(), 150);
assert_eq!(time.micros_per_tick(), 400_000 / 48);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeBase {
    micros_per_quarter_note: u32,
    ticks_per_quarter_note: u16,
    tempo_adjust: i16,
    time_signature: TimeSignature,
    effective_micros_per_quarter_note: u32,
    micros_per_tick: u32,
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_QUARTER_NOTE)
    }
}

impl TimeBase {
    /// Defaults (120 BPM, 4/4) at the given resolution.
    pub fn new(ticks_per_quarter_note: u16) -> Self {
        let mut time = Self {
            micros_per_quarter_note: DEFAULT_MICROS_PER_QUARTER_NOTE,
            ticks_per_quarter_note: DEFAULT_TICKS_PER_QUARTER_NOTE,
            tempo_adjust: 0,
            time_signature: TimeSignature::COMMON,
            effective_micros_per_quarter_note: DEFAULT_MICROS_PER_QUARTER_NOTE,
            micros_per_tick: 0,
        };
        time.set_ticks_per_quarter_note(ticks_per_quarter_note);
        time
    }

    /// Return to 120 BPM and 4/4 at the given resolution, keeping the tempo adjustment.
    pub fn reset(&mut self, ticks_per_quarter_note: u16) {
        let tempo_adjust = self.tempo_adjust;
        *self = Self::new(ticks_per_quarter_note);
        self.tempo_adjust = tempo_adjust;
        self.recalculate();
    }

    fn recalculate(&mut self) {
        let base = self.micros_per_quarter_note as i64;
        let minute = MICROS_PER_MINUTE as i64;
        let effective = if self.tempo_adjust == 0 {
            base
        } else {
            // µs/qn * minute / (minute + adjust * µs/qn), with the tempo floored at 1 BPM
            let denominator = minute + self.tempo_adjust as i64 * base;
            if denominator <= 0 {
                minute
            } else {
                (base * minute / denominator).clamp(1, minute)
            }
        };
        self.effective_micros_per_quarter_note = effective as u32;
        self.micros_per_tick =
            self.effective_micros_per_quarter_note / self.ticks_per_quarter_note as u32;
    }

    /// Microseconds per tick, truncated.
    pub const fn micros_per_tick(&self) -> u32 {
        self.micros_per_tick
    }

    /// The file (or caller) tempo in beats per minute, without the adjustment.
    pub const fn tempo(&self) -> u16 {
        let bpm = MICROS_PER_MINUTE / self.micros_per_quarter_note;
        if bpm > u16::MAX as u32 {
            u16::MAX
        } else {
            bpm as u16
        }
    }

    /// The tempo actually played, in beats per minute.
    pub const fn effective_tempo(&self) -> u16 {
        let bpm = MICROS_PER_MINUTE / self.effective_micros_per_quarter_note;
        if bpm > u16::MAX as u32 {
            u16::MAX
        } else {
            bpm as u16
        }
    }

    /// Set the tempo in beats per minute. Zero is treated as 1.
    pub fn set_tempo(&mut self, bpm: u16) {
        self.micros_per_quarter_note = MICROS_PER_MINUTE / bpm.max(1) as u32;
        self.recalculate();
    }

    /// The base tempo as microseconds per quarter note
    pub const fn micros_per_quarter_note(&self) -> u32 {
        self.micros_per_quarter_note
    }

    /// Microseconds per quarter note after the tempo adjustment
    pub const fn effective_micros_per_quarter_note(&self) -> u32 {
        self.effective_micros_per_quarter_note
    }

    /// Set the tempo directly, as a Set-Tempo meta event does. Zero is treated as 1.
    pub fn set_micros_per_quarter_note(&mut self, micros: u32) {
        self.micros_per_quarter_note = micros.max(1);
        self.recalculate();
    }

    /// Ticks per quarter note
    pub const fn ticks_per_quarter_note(&self) -> u16 {
        self.ticks_per_quarter_note
    }

    /// Change the resolution. Zero selects the default of 48.
    pub fn set_ticks_per_quarter_note(&mut self, ticks: u16) {
        self.ticks_per_quarter_note = if ticks == 0 {
            DEFAULT_TICKS_PER_QUARTER_NOTE
        } else {
            ticks
        };
        self.recalculate();
    }

    /// The tempo adjustment in beats per minute
    pub const fn tempo_adjust(&self) -> i16 {
        self.tempo_adjust
    }

    /// Speed playback up (positive) or slow it down (negative) by `delta` BPM.
    ///
    /// The base tempo is untouched, so setting the adjustment back to zero
    /// restores the original speed exactly.
    pub fn set_tempo_adjust(&mut self, delta: i16) {
        self.tempo_adjust = delta;
        self.recalculate();
    }

    /// The current time signature
    pub const fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Replace the time signature. Does not affect the tick length.
    pub fn set_time_signature(&mut self, signature: TimeSignature) {
        self.time_signature = signature;
    }

    /// Wall-clock time in scaled units (`µs × tpqn`).
    pub const fn scale_elapsed(&self, elapsed: UMicros) -> u64 {
        elapsed.us() * self.ticks_per_quarter_note as u64
    }

    /// Length of `ticks` in scaled units (`µs × tpqn`).
    pub const fn ticks_to_scaled(&self, ticks: u32) -> u64 {
        ticks as u64 * self.effective_micros_per_quarter_note as u64
    }

    /// Length of `ticks` in whole microseconds, truncated.
    pub const fn ticks_to_micros(&self, ticks: u32) -> UMicros {
        UMicros::new(self.ticks_to_scaled(ticks) / self.ticks_per_quarter_note as u64)
    }
}

#[test]
fn default_tick_time_truncates() {
    use pretty_assertions::assert_eq;
    let time = TimeBase::default();
    assert_eq!(time.tempo(), 120);
    assert_eq!(time.micros_per_quarter_note(), 500_000);
    assert_eq!(time.ticks_per_quarter_note(), 48);
    assert_eq!(time.micros_per_tick(), 10_416);
    assert_eq!(time.time_signature(), TimeSignature::new(4, 4));
}

#[test]
fn every_mutation_recomputes_tick_time() {
    use pretty_assertions::assert_eq;
    let mut time = TimeBase::default();
    let holds = |t: &TimeBase| {
        t.micros_per_tick()
            == t.effective_micros_per_quarter_note() / t.ticks_per_quarter_note() as u32
    };

    time.set_micros_per_quarter_note(600_000);
    assert!(holds(&time));
    assert_eq!(time.micros_per_tick(), 12_500);

    time.set_ticks_per_quarter_note(96);
    assert!(holds(&time));
    assert_eq!(time.micros_per_tick(), 6_250);

    time.set_tempo(60);
    assert!(holds(&time));
    assert_eq!(time.micros_per_quarter_note(), 1_000_000);

    time.set_tempo_adjust(-30);
    assert!(holds(&time));
    assert_eq!(time.effective_tempo(), 30);

    time.set_tempo_adjust(0);
    assert!(holds(&time));
    assert_eq!(time.effective_micros_per_quarter_note(), 1_000_000);
}

#[test]
fn adjustment_cannot_stop_the_clock() {
    use pretty_assertions::assert_eq;
    let mut time = TimeBase::default();
    time.set_tempo_adjust(-500);
    assert_eq!(time.effective_tempo(), 1);
    assert_eq!(time.effective_micros_per_quarter_note(), 60_000_000);

    time.set_ticks_per_quarter_note(0);
    assert_eq!(time.ticks_per_quarter_note(), 48);
}

#[test]
fn reset_keeps_adjustment() {
    use pretty_assertions::assert_eq;
    let mut time = TimeBase::new(96);
    time.set_micros_per_quarter_note(250_000);
    time.set_time_signature(TimeSignature::new(7, 8));
    time.set_tempo_adjust(10);

    time.reset(96);
    assert_eq!(time.micros_per_quarter_note(), 500_000);
    assert_eq!(time.time_signature(), TimeSignature::COMMON);
    assert_eq!(time.tempo_adjust(), 10);
    assert_eq!(time.effective_tempo(), 130);
}

#[test]
fn scaled_units_do_not_drift() {
    use pretty_assertions::assert_eq;
    let time = TimeBase::default();
    // one-tick events polled every millisecond
    let mut banked = 0u64;
    let mut now = 0u64;
    let mut fired = 0u32;
    while fired < 10_000 {
        now += 1_000;
        banked += time.scale_elapsed(UMicros::from_ms(1));
        while fired < 10_000 && banked >= time.ticks_to_scaled(1) {
            banked -= time.ticks_to_scaled(1);
            fired += 1;
        }
    }
    let exact = 10_000u64 * 500_000 / 48;
    assert!(now.abs_diff(exact) < time.micros_per_tick() as u64);
    assert_eq!(time.ticks_to_micros(10_000), UMicros::new(exact));
}
