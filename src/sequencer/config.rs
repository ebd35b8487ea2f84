/// How [`Sequencer::get_next_event`](super::Sequencer::get_next_event) orders
/// events that are due on several tracks at once.
///
/// Both policies deliver the same events at the same scheduler call; only the
/// order within a call differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MergePolicy {
    /// Play every due event on track 0, then every due event on track 1, ...
    #[default]
    TrackPriority,
    /// Play one due event from each track in turn, round robin, until a
    /// whole sweep finds nothing due.
    EventPriority,
}

/// Settings for a [`Sequencer`](super::Sequencer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SequencerConfig {
    /// Ordering of simultaneous events across tracks
    pub merge: MergePolicy,
    /// Start over automatically at the end of the file
    pub looping: bool,
    /// Initial tempo adjustment in beats per minute
    pub tempo_adjust: i16,
    /// Upper bound on events decoded per track (track priority) or sweeps
    /// (event priority) in one call. Anything beyond waits for the next call.
    pub max_events_per_call: u16,
}

impl SequencerConfig {
    const DEFAULT_MAX_EVENTS_PER_CALL: u16 = 100;

    /// Use `merge` to order simultaneous events.
    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Loop playback.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Start with a tempo adjustment.
    pub fn with_tempo_adjust(mut self, tempo_adjust: i16) -> Self {
        self.tempo_adjust = tempo_adjust;
        self
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            merge: MergePolicy::default(),
            looping: false,
            tempo_adjust: 0,
            max_events_per_call: Self::DEFAULT_MAX_EVENTS_PER_CALL,
        }
    }
}
