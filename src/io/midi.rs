/// A decoded channel-voice MIDI message.
///
/// Byte-level parsing happens in the transport; this is what it hands over.
/// Pitch bend is signed and centred on zero (raw 14-bit value minus 8192).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
}
