use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Translate a decoded MIDI event into a synth message.
///
/// `channel_filter` of `Some(ch)` accepts only that channel; `None` listens
/// on all of them. A note-on with velocity 0 is a note-off.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: Option<u8>) -> Option<SynthMessage> {
    let accepts = |channel: u8| channel_filter.map_or(true, |filter| filter == channel);

    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        } if accepts(channel) => Some(SynthMessage::NoteOff {
            note: clamp_note(key),
        }),
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if accepts(channel) => Some(SynthMessage::NoteOn {
            note: clamp_note(key),
            velocity,
        }),
        MidiEvent::NoteOff { channel, key, .. } if accepts(channel) => {
            Some(SynthMessage::NoteOff {
                note: clamp_note(key),
            })
        }
        MidiEvent::ControlChange {
            channel,
            controller: 123,
            ..
        } if accepts(channel) => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } if accepts(channel) => Some(SynthMessage::ControlChange { controller, value }),
        MidiEvent::PitchBend { channel, value } if accepts(channel) => {
            Some(SynthMessage::PitchBend { value })
        }
        _ => None,
    }
}

pub const MAX_NOTE: u8 = 127;

/// Notes above the 7-bit range are pinned to the top key.
#[inline]
pub fn clamp_note(note: u8) -> u8 {
    note.min(MAX_NOTE)
}

/// `440 · 2^((note + bend - 69) / 12)`. Fractional notes are fine; nothing
/// is clamped.
#[inline]
pub fn note_to_freq(note: f32, bend_semitones: f32) -> f32 {
    440.0 * 2.0_f32.powf((note + bend_semitones - 69.0) / 12.0)
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    note_to_freq(note as f32, 0.0)
}

/// Signed 14-bit bend to [-1, 1].
#[inline]
pub fn normalize_pitch_bend(value: i16) -> f32 {
    (value as f32 / 8192.0).clamp(-1.0, 1.0)
}

/// 7-bit controller value to [0, 1].
#[inline]
pub fn normalize_cc(value: u8) -> f32 {
    value.min(127) as f32 / 127.0
}

#[inline]
pub fn normalize_velocity(velocity: u8) -> f32 {
    normalize_cc(velocity)
}
