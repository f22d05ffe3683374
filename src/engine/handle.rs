use std::sync::Arc;

use rtrb::Producer;

use crate::{
    engine::controls::SharedControls,
    error::ControlError,
    io::{converter::midi_to_synth, midi::MidiEvent},
    synth::{message::SynthMessage, EngineKind},
};

/// Control-context side of a [`BlockProcessor`](crate::engine::BlockProcessor).
///
/// Every method returns immediately. When the event queue is full the event
/// is dropped and `QueueFull` comes back; the audio side is never blocked.
pub struct ControlHandle {
    tx: Producer<SynthMessage>,
    controls: Arc<SharedControls>,
    channel: Option<u8>,
}

impl ControlHandle {
    pub fn new(tx: Producer<SynthMessage>, controls: Arc<SharedControls>) -> Self {
        Self {
            tx,
            controls,
            channel: None,
        }
    }

    /// Only accept MIDI from `channel`. `None` listens on every channel.
    pub fn with_channel(mut self, channel: Option<u8>) -> Self {
        self.channel = channel;
        self
    }

    pub fn send(&mut self, message: SynthMessage) -> Result<(), ControlError> {
        self.tx.push(message).map_err(|_| ControlError::QueueFull)
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), ControlError> {
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), ControlError> {
        self.send(SynthMessage::NoteOff { note })
    }

    pub fn control_change(&mut self, controller: u8, value: u8) -> Result<(), ControlError> {
        self.send(SynthMessage::ControlChange { controller, value })
    }

    pub fn pitch_bend(&mut self, value: i16) -> Result<(), ControlError> {
        self.send(SynthMessage::PitchBend { value })
    }

    pub fn select_engine(&mut self, engine: EngineKind) -> Result<(), ControlError> {
        self.send(SynthMessage::SelectEngine(engine))
    }

    pub fn all_notes_off(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Forward a decoded MIDI event. Events the synth does not use, or from
    /// other channels, are dropped without error.
    pub fn midi(&mut self, event: MidiEvent) -> Result<(), ControlError> {
        match midi_to_synth(event, self.channel) {
            Some(message) => self.send(message),
            None => Ok(()),
        }
    }

    pub fn set_knob(&self, index: usize, value: f32) -> Result<(), ControlError> {
        self.controls.set_knob(index, value)
    }

    pub fn turn_encoder(&self, increment: i32) {
        self.controls.turn_encoder(increment);
    }

    pub fn controls(&self) -> Arc<SharedControls> {
        Arc::clone(&self.controls)
    }

    /// Free slots in the event queue.
    pub fn available(&self) -> usize {
        self.tx.slots()
    }
}
