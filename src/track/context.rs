use crate::{
    file::{TimeBase, TimeSignature},
    message::{ChannelEvent, SysExEvent},
    storage::StorageFile,
};

#[doc = r#"
What a [`TrackCursor`](super::TrackCursor) may touch outside itself

The cursor never owns the file, the time base or the sink. Whoever drives it
(normally the [`Sequencer`](crate::sequencer::Sequencer)) lends exactly these
services for the duration of one call.
"#]
pub trait TrackContext {
    /// The open file the track lives in
    type File: StorageFile + ?Sized;

    /// The open file
    fn file(&mut self) -> &mut Self::File;

    /// The current time base
    fn time_base(&self) -> &TimeBase;

    /// Apply a Set-Tempo meta event.
    fn set_micros_per_quarter_note(&mut self, micros: u32);

    /// Apply a Time-Signature meta event.
    fn set_time_signature(&mut self, signature: TimeSignature);

    /// Deliver a channel event.
    fn channel_event(&mut self, event: &ChannelEvent);

    /// Deliver a complete sysex message.
    fn sysex_event(&mut self, event: &SysExEvent);
}
