#![doc = r#"
The events a track can contain

```text
track_event := <delta:varint> (midi_event | meta_event | sysex_event)
midi_event  := status[0x80-0xEF] data{1,2} | data{1,2}      (running status)
meta_event  := 0xFF <type:1> <len:varint> <data:len>
sysex_event := (0xF0|0xF7) <len:varint> <data:len>
```

Channel and sysex events are delivered to the sink. Meta events are consumed by
the sequencer itself.
"#]

mod channel;
pub use channel::*;

mod meta;
pub(crate) use meta::META_CAPACITY;
pub use meta::{META_STATUS, MetaKind};

mod sysex;
pub(crate) use sysex::{SYSEX_BUFFER, SysExBuffer};
pub use sysex::{SYSEX_CAPACITY, SYSEX_END, SysExEvent, SysExOverflow};

/// Status byte starting a system exclusive message
pub const SYSEX_START: u8 = 0xF0;
