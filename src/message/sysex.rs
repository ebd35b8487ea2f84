use arrayvec::ArrayVec;

/// Largest sysex payload the sequencer will deliver, in bytes.
pub const SYSEX_CAPACITY: usize = 50;

/// Terminates a system exclusive message.
pub const SYSEX_END: u8 = 0xF7;

// payload plus terminator
pub(crate) const SYSEX_BUFFER: usize = SYSEX_CAPACITY + 1;

#[doc = r#"
A complete system exclusive message

The payload excludes the leading `F0` status and the trailing `F7` terminator.
A message split across several packets in the file (`F0 ...` followed by one or
more `F7 ...` continuation packets) arrives as one concatenated payload.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysExEvent {
    track: u8,
    data: ArrayVec<u8, SYSEX_BUFFER>,
}

impl SysExEvent {
    /// Build an event from a payload (without `F0`/`F7` framing).
    pub fn new(track: u8, payload: &[u8]) -> Result<Self, SysExOverflow> {
        if payload.len() > SYSEX_CAPACITY {
            return Err(SysExOverflow);
        }
        let mut data = ArrayVec::new();
        data.try_extend_from_slice(payload)
            .map_err(|_| SysExOverflow)?;
        Ok(Self { track, data })
    }

    /// The track this event was read from
    pub const fn track(&self) -> u8 {
        self.track
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a message with no payload bytes (`F0 01 F7`)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Error returned when a payload does not fit in [`SYSEX_CAPACITY`] bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sysex payload exceeds {SYSEX_CAPACITY} bytes")]
pub struct SysExOverflow;

/// Collects the packets of one sysex message for a track.
#[derive(Debug, Clone)]
pub(crate) struct SysExBuffer {
    track: u8,
    pending: bool,
    overflowed: bool,
    data: ArrayVec<u8, SYSEX_BUFFER>,
}

impl SysExBuffer {
    pub(crate) const fn new(track: u8) -> Self {
        Self {
            track,
            pending: false,
            overflowed: false,
            data: ArrayVec::new_const(),
        }
    }

    /// True while a message has been started but not terminated.
    pub(crate) const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Append one packet to the message.
    ///
    /// Once a message overflows, the rest of it is refused as well until the
    /// terminating packet has been seen.
    pub(crate) fn append(&mut self, packet: &[u8]) -> Result<(), SysExOverflow> {
        self.pending = true;
        if self.overflowed {
            return Err(SysExOverflow);
        }
        self.data.try_extend_from_slice(packet).map_err(|_| {
            self.overflowed = true;
            SysExOverflow
        })
    }

    /// Refuse a packet too large to hold, without reading it.
    pub(crate) fn refuse(&mut self) {
        self.pending = true;
        self.overflowed = true;
    }

    /// Finish the current packet, given its last byte.
    ///
    /// A packet that does not end in [`SYSEX_END`] leaves the message pending
    /// and returns `None`. Otherwise the message is complete: the terminator is
    /// stripped and the event returned, or [`SysExOverflow`] if it did not fit.
    pub(crate) fn finish_packet(
        &mut self,
        last_byte: Option<u8>,
    ) -> Option<Result<SysExEvent, SysExOverflow>> {
        if last_byte != Some(SYSEX_END) {
            return None;
        }
        let result = if self.overflowed {
            Err(SysExOverflow)
        } else {
            let mut data = core::mem::take(&mut self.data);
            data.pop();
            Ok(SysExEvent {
                track: self.track,
                data,
            })
        };
        self.clear();
        Some(result)
    }

    pub(crate) fn clear(&mut self) {
        self.pending = false;
        self.overflowed = false;
        self.data.clear();
    }
}

#[test]
fn packets_concatenate_until_terminated() {
    use pretty_assertions::assert_eq;
    let mut buffer = SysExBuffer::new(4);

    buffer.append(&[0x43, 0x12, 0x00]).unwrap();
    assert!(buffer.finish_packet(Some(0x00)).is_none());
    assert!(buffer.is_pending());

    buffer.append(&[0x01, 0x02, SYSEX_END]).unwrap();
    let event = buffer.finish_packet(Some(SYSEX_END)).unwrap().unwrap();
    assert_eq!(event.track(), 4);
    assert_eq!(event.data(), &[0x43, 0x12, 0x00, 0x01, 0x02]);
    assert_eq!(event, SysExEvent::new(4, &[0x43, 0x12, 0x00, 0x01, 0x02]).unwrap());
    assert!(!buffer.is_pending());
}

#[test]
fn oversized_messages_are_refused() {
    use pretty_assertions::assert_eq;
    let mut buffer = SysExBuffer::new(0);
    buffer.append(&[0x10; 40]).unwrap();
    assert!(buffer.finish_packet(Some(0x10)).is_none());
    assert_eq!(buffer.append(&[0x10; 20]), Err(SysExOverflow));
    // the rest of the message is refused as well
    assert_eq!(buffer.append(&[0x10]), Err(SysExOverflow));
    assert_eq!(buffer.finish_packet(Some(SYSEX_END)), Some(Err(SysExOverflow)));
    assert!(!buffer.is_pending());

    // a full payload plus its terminator fits
    let mut full = [0x11; SYSEX_BUFFER];
    full[SYSEX_CAPACITY] = SYSEX_END;
    buffer.append(&full).unwrap();
    let event = buffer.finish_packet(Some(SYSEX_END)).unwrap().unwrap();
    assert_eq!(event.len(), SYSEX_CAPACITY);

    assert_eq!(SysExEvent::new(0, &[0; SYSEX_CAPACITY + 1]), Err(SysExOverflow));
}
