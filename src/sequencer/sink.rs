use crate::message::{ChannelEvent, SysExEvent};

#[doc = r#"
Receives the events of a playing file

Both methods are called synchronously from inside
[`Sequencer::get_next_event`](super::Sequencer::get_next_event), zero or more
times per call. They run on the playback loop, so they should hand the bytes
off quickly and must not block.

# Example
```rust
# use smfseq::prelude::*;
struct Wire<'a>(&'a mut Vec<u8>);

impl EventSink for Wire<'_> {
    fn on_channel_event(&mut self, event: &ChannelEvent) {
        self.0.extend_from_slice(event.wire_bytes());
    }

    fn on_sysex_event(&mut self, event: &SysExEvent) {
        self.0.push(0xF0);
        self.0.extend_from_slice(event.data());
        self.0.push(0xF7);
    }
}
```
"#]
pub trait EventSink {
    /// A note, controller, program change, pitch bend, ...
    fn on_channel_event(&mut self, event: &ChannelEvent);

    /// A complete system exclusive message. Ignored by default.
    fn on_sysex_event(&mut self, event: &SysExEvent) {
        let _ = event;
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn on_channel_event(&mut self, event: &ChannelEvent) {
        (**self).on_channel_event(event);
    }

    fn on_sysex_event(&mut self, event: &SysExEvent) {
        (**self).on_sysex_event(event);
    }
}

/// Discards every event.
impl EventSink for () {
    fn on_channel_event(&mut self, _event: &ChannelEvent) {}
}
