#![doc = r#"
Per-track decoding state

A [`TrackCursor`] owns a byte window into the file (one `MTrk` body) and walks
it one event at a time:

```text
            load                     End-of-Track meta,
 Unloaded ────────► Ready ─────────► end of chunk, or a
     ▲                ▲    │          malformed event
     │                │    ▼
     └──── close ──── EndOfTrack
                 restart ┘
```

Time is banked in the cursor: every call to [`TrackCursor::next_event`] adds the
wall-clock time since the previous call, and an event fires once the bank covers
its delta time. The consumed time is subtracted, so any excess carries over to
the next event.
"#]

mod context;
pub use context::*;

mod error;
pub use error::*;

use crate::{
    UMicros,
    file::{TimeBase, TimeSignature, TrackChunk},
    message::{
        ChannelEvent, ChannelStatus, META_CAPACITY, META_STATUS, MetaKind, SYSEX_END, SYSEX_BUFFER,
        SYSEX_START, SysExBuffer, SysExEvent,
    },
    reader::Reader,
    storage::StorageFile,
};

/// Where a cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackState {
    /// No file loaded
    #[default]
    Unloaded,
    /// Events remain
    Ready,
    /// Nothing more will be emitted until restarted
    EndOfTrack,
}

/// A delta time that has been read but whose event is not yet due.
#[derive(Debug, Clone, Copy)]
struct PendingDelta {
    ticks: u32,
    event_offset: u32,
}

/// What one decoded event asks of the context.
enum Decoded {
    Channel(ChannelEvent),
    SysEx(SysExEvent),
    Tempo(u32),
    TimeSignature(TimeSignature),
    EndOfTrack,
    Nothing,
}

/// The decoding state of one track.
#[derive(Debug, Clone)]
pub struct TrackCursor {
    id: u8,
    chunk: TrackChunk,
    offset: u32,
    state: TrackState,
    running_status: Option<(ChannelStatus, u8)>,
    elapsed: u64,
    pending_delta: Option<PendingDelta>,
    sysex: SysExBuffer,
}

impl TrackCursor {
    /// An unloaded cursor for track `id`.
    pub const fn new(id: u8) -> Self {
        Self {
            id,
            chunk: TrackChunk { start: 0, length: 0 },
            offset: 0,
            state: TrackState::Unloaded,
            running_status: None,
            elapsed: 0,
            pending_delta: None,
            sysex: SysExBuffer::new(id),
        }
    }

    /// Attach the cursor to a track chunk and rewind it.
    pub fn load(&mut self, chunk: TrackChunk) {
        self.chunk = chunk;
        self.state = TrackState::Ready;
        self.restart();
    }

    /// Detach from the file.
    pub fn close(&mut self) {
        *self = Self::new(self.id);
    }

    /// Rewind to the first event of the track.
    ///
    /// Clears running status, the time bank, any half-received sysex message
    /// and the end-of-track flag. Does nothing to an unloaded cursor.
    pub fn restart(&mut self) {
        if self.state == TrackState::Unloaded {
            return;
        }
        self.offset = self.chunk.start;
        self.state = TrackState::Ready;
        self.running_status = None;
        self.elapsed = 0;
        self.pending_delta = None;
        self.sysex.clear();
    }

    /// Empty the time bank without moving the cursor.
    ///
    /// Used after a pause so that time spent paused is not charged against the
    /// next event.
    pub fn sync_time(&mut self) {
        self.elapsed = 0;
    }

    /// Convert the time bank after the ticks-per-quarter-note changed.
    pub fn rescale(&mut self, from_tpqn: u16, to_tpqn: u16) {
        if from_tpqn == 0 || from_tpqn == to_tpqn {
            return;
        }
        let scaled = self.elapsed as u128 * to_tpqn as u128 / from_tpqn as u128;
        self.elapsed = scaled.min(u64::MAX as u128) as u64;
    }

    /// The track number
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Lifecycle state
    pub const fn state(&self) -> TrackState {
        self.state
    }

    /// True once the track has nothing more to play
    pub const fn is_end_of_track(&self) -> bool {
        matches!(self.state, TrackState::EndOfTrack)
    }

    /// The chunk this cursor reads
    pub const fn chunk(&self) -> TrackChunk {
        self.chunk
    }

    /// Offset of the next unread byte from the start of the track body
    pub const fn position(&self) -> u32 {
        self.offset - self.chunk.start
    }

    /// The status byte that a data byte would currently repeat
    pub fn running_status(&self) -> Option<u8> {
        self.running_status
            .map(|(kind, channel)| kind.status(channel))
    }

    /// Time banked toward the next event
    pub const fn elapsed(&self, time: &TimeBase) -> UMicros {
        UMicros::new(self.elapsed / time.ticks_per_quarter_note() as u64)
    }

    /// Bank `elapsed` and, if the next event is now due, decode and apply it.
    ///
    /// Returns true if an event was decoded. At most one event is decoded per
    /// call; callers that want to drain simultaneous events call again with
    /// [`UMicros::ZERO`].
    pub fn next_event<C: TrackContext + ?Sized>(&mut self, ctx: &mut C, elapsed: UMicros) -> bool {
        if self.state != TrackState::Ready {
            return false;
        }
        self.elapsed = self
            .elapsed
            .saturating_add(ctx.time_base().scale_elapsed(elapsed));

        let delta = match self.pending_delta {
            Some(delta) => delta,
            None => {
                if self.offset >= self.chunk.end() {
                    tracing::debug!(track = self.id, "track ended without End-of-Track");
                    self.state = TrackState::EndOfTrack;
                    return false;
                }
                let mut reader = Reader::new(ctx.file(), self.offset, self.chunk.end());
                match reader.read_varlen() {
                    Ok(ticks) => {
                        let delta = PendingDelta {
                            ticks,
                            event_offset: reader.buffer_position(),
                        };
                        self.pending_delta = Some(delta);
                        delta
                    }
                    Err(e) => {
                        self.abort(&e.into());
                        return false;
                    }
                }
            }
        };

        let due = ctx.time_base().ticks_to_scaled(delta.ticks);
        if self.elapsed < due {
            return false;
        }
        self.elapsed -= due;
        self.pending_delta = None;
        self.offset = delta.event_offset;

        let decoded = match self.decode(ctx.file()) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.abort(&e);
                return false;
            }
        };

        match decoded {
            Decoded::Channel(event) => {
                tracing::trace!(track = self.id, bytes = ?event.wire_bytes(), "channel event");
                ctx.channel_event(&event);
            }
            Decoded::SysEx(event) => {
                tracing::trace!(track = self.id, len = event.len(), "sysex event");
                ctx.sysex_event(&event);
            }
            Decoded::Tempo(micros) => {
                tracing::trace!(track = self.id, micros, "set tempo");
                ctx.set_micros_per_quarter_note(micros);
            }
            Decoded::TimeSignature(signature) => {
                tracing::trace!(
                    track = self.id,
                    numerator = signature.numerator,
                    denominator = signature.denominator,
                    "time signature"
                );
                ctx.set_time_signature(signature);
            }
            Decoded::EndOfTrack => {
                tracing::trace!(track = self.id, "end of track");
                self.state = TrackState::EndOfTrack;
            }
            Decoded::Nothing => {}
        }

        if self.offset >= self.chunk.end() {
            self.state = TrackState::EndOfTrack;
        }
        true
    }

    fn abort(&mut self, error: &DecodeError) {
        tracing::warn!(
            track = self.id,
            position = self.offset,
            %error,
            "malformed track data, stopping track"
        );
        self.state = TrackState::EndOfTrack;
        self.pending_delta = None;
        self.running_status = None;
    }

    /// Decode the event at `self.offset`, advancing past it on success.
    fn decode<F: StorageFile + ?Sized>(&mut self, file: &mut F) -> Result<Decoded, DecodeError> {
        let mut reader = Reader::new(file, self.offset, self.chunk.end());
        let status = reader.read_u8()?;

        let decoded = match status {
            0x00..=0x7F => {
                let (kind, channel) = self
                    .running_status
                    .ok_or(DecodeError::MissingRunningStatus(status))?;
                let second = if kind.data_len() == 2 {
                    read_data_byte(&mut reader)?
                } else {
                    0
                };
                Decoded::Channel(ChannelEvent::new(self.id, kind, channel, [status, second]))
            }
            0x80..=0xEF => {
                let (kind, channel) =
                    ChannelStatus::from_status(status).ok_or(DecodeError::InvalidStatus(status))?;
                let mut data = [0; 2];
                for byte in &mut data[..kind.data_len() as usize] {
                    *byte = read_data_byte(&mut reader)?;
                }
                self.running_status = Some((kind, channel));
                Decoded::Channel(ChannelEvent::new(self.id, kind, channel, data))
            }
            SYSEX_START | SYSEX_END => {
                self.running_status = None;
                self.decode_sysex(&mut reader, status)?
            }
            META_STATUS => {
                self.running_status = None;
                decode_meta(&mut reader)?
            }
            _ => return Err(DecodeError::InvalidStatus(status)),
        };

        self.offset = reader.buffer_position();
        Ok(decoded)
    }

    fn decode_sysex<F: StorageFile + ?Sized>(
        &mut self,
        reader: &mut Reader<'_, F>,
        status: u8,
    ) -> Result<Decoded, DecodeError> {
        if status == SYSEX_START && self.sysex.is_pending() {
            tracing::warn!(track = self.id, "unterminated sysex message dropped");
            self.sysex.clear();
        }

        let len = reader.read_varlen()?;
        let last_byte = if len as usize <= SYSEX_BUFFER {
            let mut packet = [0; SYSEX_BUFFER];
            let packet = &mut packet[..len as usize];
            reader.read_into(packet)?;
            // an overflow is reported once the message is terminated
            let _ = self.sysex.append(packet);
            packet.last().copied()
        } else {
            self.sysex.refuse();
            reader.skip(len - 1)?;
            Some(reader.read_u8()?)
        };

        Ok(match self.sysex.finish_packet(last_byte) {
            Some(Ok(event)) => Decoded::SysEx(event),
            Some(Err(overflow)) => {
                tracing::warn!(track = self.id, %overflow, "sysex message dropped");
                Decoded::Nothing
            }
            None => Decoded::Nothing,
        })
    }
}

fn read_data_byte<F: StorageFile + ?Sized>(
    reader: &mut Reader<'_, F>,
) -> Result<u8, DecodeError> {
    match reader.read_u8()? {
        byte @ 0x00..=0x7F => Ok(byte),
        status => Err(DecodeError::UnexpectedStatus(status)),
    }
}

fn decode_meta<F: StorageFile + ?Sized>(reader: &mut Reader<'_, F>) -> Result<Decoded, DecodeError> {
    let kind = reader.read_u8()?;
    let len = reader.read_varlen()?;

    let Ok(kind) = MetaKind::try_from(kind) else {
        tracing::trace!(kind, len, "skipping meta event");
        reader.skip(len)?;
        return Ok(Decoded::Nothing);
    };

    let mut data = [0; META_CAPACITY];
    let kept = (len as usize).min(META_CAPACITY);
    reader.read_into(&mut data[..kept])?;
    reader.skip(len - kept as u32)?;
    let data = &data[..kept];

    Ok(match kind {
        MetaKind::EndOfTrack => Decoded::EndOfTrack,
        MetaKind::SetTempo if len == 3 => {
            Decoded::Tempo(u32::from_be_bytes([0, data[0], data[1], data[2]]))
        }
        MetaKind::TimeSignature => match TimeSignature::from_meta(data) {
            Some(signature) => Decoded::TimeSignature(signature),
            None => Decoded::Nothing,
        },
        MetaKind::SetTempo => {
            tracing::trace!(len, "ignoring malformed tempo");
            Decoded::Nothing
        }
    })
}


#[test]
fn running_status_repeats_status_and_channel() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0x92, 0x3C, 0x64,
        0x00, 0x40, 0x64,
        0x00, 0x3C, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    assert_eq!(drain(&mut cursor, &mut harness), 4);
    let bytes: alloc::vec::Vec<_> = harness
        .channel
        .iter()
        .map(|e| (e.channel(), e.wire_bytes().to_vec()))
        .collect();
    assert_eq!(
        bytes,
        alloc::vec![
            (2, alloc::vec![0x92, 0x3C, 0x64]),
            (2, alloc::vec![0x92, 0x40, 0x64]),
            (2, alloc::vec![0x92, 0x3C, 0x00]),
        ]
    );
    assert!(cursor.is_end_of_track());
}

#[test]
fn meta_and_sysex_clear_running_status() {
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0x90, 0x3C, 0x64,
        0x00, 0xFF, 0x01, 0x02, b'h', b'i',
        0x00, 0x3C, 0x00,
    ]);

    drain(&mut cursor, &mut harness);
    assert_eq!(harness.channel.len(), 1);
    assert!(cursor.is_end_of_track());
    assert_eq!(cursor.running_status(), None);
}

#[test]
fn one_data_byte_messages() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0xC3, 0x05,
        0x00, 0x06,
        0x00, 0xD3, 0x40,
    ]);

    assert_eq!(drain(&mut cursor, &mut harness), 3);
    assert_eq!(harness.channel[1].wire_bytes(), &[0xC3, 0x06]);
    assert_eq!(harness.channel[2].kind(), ChannelStatus::ChannelPressure);
    // no End-of-Track meta: the chunk simply ran out
    assert!(cursor.is_end_of_track());
}

#[test]
fn events_wait_for_their_delta_time() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    // 48 ticks = one quarter note = 500 ms at the default tempo
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x30, 0x90, 0x3C, 0x64,
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    assert!(!cursor.next_event(&mut harness, UMicros::from_ms(499)));
    assert_eq!(cursor.position(), 0);
    assert!(cursor.next_event(&mut harness, UMicros::from_ms(2)));
    assert_eq!(harness.channel.len(), 1);
    // the extra millisecond stays banked
    assert_eq!(cursor.elapsed(&harness.time), UMicros::from_ms(1));

    cursor.sync_time();
    assert_eq!(cursor.elapsed(&harness.time), UMicros::ZERO);
}

#[test]
fn tempo_and_time_signature_update_the_time_base() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0xFF, 0x51, 0x03, 0x09, 0x27, 0xC0,
        0x00, 0xFF, 0x58, 0x04, 0x06, 0x03, 0x18, 0x08,
        0x00, 0xFF, 0x03, 0x04, b'n', b'a', b'm', b'e',
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    assert_eq!(drain(&mut cursor, &mut harness), 4);
    assert_eq!(harness.time.micros_per_quarter_note(), 600_000);
    assert_eq!(harness.time.micros_per_tick(), 12_500);
    assert_eq!(harness.time.time_signature(), TimeSignature::new(6, 8));
}

#[test]
fn sysex_terminator_is_stripped() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0xF0, 0x05, 0x7E, 0x7F, 0x09, 0x01, 0xF7,
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    drain(&mut cursor, &mut harness);
    assert_eq!(harness.sysex.len(), 1);
    assert_eq!(harness.sysex[0].data(), &[0x7E, 0x7F, 0x09, 0x01]);
}

#[test]
fn oversized_sysex_is_skipped_not_fatal() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    let mut body = alloc::vec![0x00, 0xF0, 60];
    body.extend(core::iter::repeat_n(0x11, 59));
    body.push(0xF7);
    body.extend([0x00, 0x90, 0x3C, 0x64]);
    let (mut cursor, mut harness) = cursor(&body);

    assert_eq!(drain(&mut cursor, &mut harness), 2);
    assert!(harness.sysex.is_empty());
    assert_eq!(harness.channel.len(), 1);
}

#[test]
fn malformed_data_ends_the_track() {
    use test_support::*;

    // data byte with nothing to repeat
    let (mut track, mut harness) = cursor(&[0x00, 0x3C, 0x64]);
    assert!(!track.next_event(&mut harness, UMicros::ZERO));
    assert!(track.is_end_of_track());

    // system common status inside a track
    let (mut track, mut harness) = cursor(&[0x00, 0xF2, 0x00, 0x00]);
    assert!(!track.next_event(&mut harness, UMicros::ZERO));
    assert!(track.is_end_of_track());

    // note on cut short by the chunk length
    let (mut track, mut harness) = cursor(&[0x00, 0x90, 0x3C]);
    assert!(!track.next_event(&mut harness, UMicros::ZERO));
    assert!(track.is_end_of_track());

    // meta length running past the chunk
    let (mut track, mut harness) = cursor(&[0x00, 0xFF, 0x01, 0x40, b'x']);
    assert!(!track.next_event(&mut harness, UMicros::ZERO));
    assert!(track.is_end_of_track());
    assert!(harness.channel.is_empty());
}

#[test]
fn status_byte_in_a_data_slot_ends_the_track() {
    use pretty_assertions::assert_eq;
    use test_support::*;

    // velocity replaced by another status byte
    #[rustfmt::skip]
    let (mut track, mut harness) = cursor(&[
        0x00, 0x90, 0x3C, 0x90,
        0x00, 0x80, 0x3C, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ]);
    assert_eq!(drain(&mut track, &mut harness), 0);
    assert!(track.is_end_of_track());
    assert!(harness.channel.is_empty());

    // same under running status
    #[rustfmt::skip]
    let (mut track, mut harness) = cursor(&[
        0x00, 0x90, 0x3C, 0x64,
        0x00, 0x40, 0xC0,
    ]);
    assert_eq!(drain(&mut track, &mut harness), 1);
    assert!(track.is_end_of_track());
    assert_eq!(harness.channel.len(), 1);
}

#[test]
fn restart_rewinds_everything() {
    use pretty_assertions::assert_eq;
    use test_support::*;
    #[rustfmt::skip]
    let (mut cursor, mut harness) = cursor(&[
        0x00, 0x90, 0x3C, 0x64,
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    drain(&mut cursor, &mut harness);
    assert!(cursor.is_end_of_track());

    cursor.restart();
    assert_eq!(cursor.state(), TrackState::Ready);
    assert_eq!(cursor.position(), 0);
    assert_eq!(cursor.running_status(), None);

    drain(&mut cursor, &mut harness);
    assert_eq!(harness.channel.len(), 2);
    assert_eq!(harness.channel[0], harness.channel[1]);

    cursor.close();
    assert_eq!(cursor.state(), TrackState::Unloaded);
    cursor.restart();
    assert_eq!(cursor.state(), TrackState::Unloaded);
}
