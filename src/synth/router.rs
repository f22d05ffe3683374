use tracing::debug;

use crate::{
    effects::{EffectMode, EffectSettings, EffectsChain},
    io::converter::{clamp_note, normalize_cc, normalize_pitch_bend},
    synth::{
        bank::VoiceBank,
        fm_voice::{MAX_RATIO, MIN_RATIO},
        message::SynthMessage,
        patch::{FmPatch, SubtractivePatch},
        EngineKind,
    },
};

/*
Modulation Router
=================

Turns control events into parameter changes. Notes go straight to the voice
bank. Everything else edits a patch or the effect settings and marks it
dirty; `flush` pushes dirty state out once per block, so every change lands
on a block boundary.

CC map (v = value / 127):

           FM engine                    Subtractive engine
  CC1      index 2v, feedback v         cutoff 20·1000^v Hz, env depth 4000v Hz
  CC2      feedback v                   resonance 0.95v
  CC3      ratio 0.25 + 3.75v           detune 50v cents
  CC4-7    attack 2v, decay 2v, sustain v, release 2v (both engines)
  CC8      current mode's dry/wet (both engines)
  CC123    all notes off

Knobs and the encoder come from shared atomics rather than the queue. A
knob that has never been moved keeps the mode's default settings.
*/

const KNOB_EPSILON: f32 = 1e-4;

pub struct ModulationRouter {
    engine: EngineKind,
    mode: EffectMode,
    subtractive: SubtractivePatch,
    fm: FmPatch,
    effects: EffectSettings,
    bend_range: f32,
    knobs: [Option<f32>; 2],

    subtractive_dirty: bool,
    fm_dirty: bool,
    effects_dirty: bool,
    mode_dirty: bool,
}

impl ModulationRouter {
    pub fn new(
        engine: EngineKind,
        bend_range: f32,
        subtractive: SubtractivePatch,
        fm: FmPatch,
        effects: EffectSettings,
    ) -> Self {
        Self {
            engine,
            mode: EffectMode::first(engine),
            subtractive,
            fm,
            effects,
            bend_range,
            knobs: [None; 2],
            subtractive_dirty: false,
            fm_dirty: false,
            effects_dirty: false,
            mode_dirty: false,
        }
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn mode(&self) -> EffectMode {
        self.mode
    }

    pub fn subtractive_patch(&self) -> &SubtractivePatch {
        &self.subtractive
    }

    pub fn fm_patch(&self) -> &FmPatch {
        &self.fm
    }

    pub fn effects(&self) -> &EffectSettings {
        &self.effects
    }

    pub fn knobs(&self) -> [Option<f32>; 2] {
        self.knobs
    }

    /// Pitch bend currently applied, in semitones.
    pub fn pitch_bend(&self) -> f32 {
        self.fm.pitch_bend
    }

    pub fn handle(&mut self, message: SynthMessage, bank: &mut VoiceBank) {
        match message {
            SynthMessage::NoteOn { note, velocity: 0 } | SynthMessage::NoteOff { note } => {
                bank.note_off(clamp_note(note));
            }
            SynthMessage::NoteOn { note, velocity } => {
                let note = clamp_note(note);
                bank.note_on(self.engine, note, velocity, &self.subtractive, &self.fm);
            }
            SynthMessage::ControlChange { controller, value } => {
                self.control_change(controller, normalize_cc(value), bank);
            }
            SynthMessage::PitchBend { value } => {
                let semitones = normalize_pitch_bend(value) * self.bend_range;
                self.subtractive.pitch_bend = semitones;
                self.fm.pitch_bend = semitones;
                bank.set_pitch_bend(semitones);
            }
            SynthMessage::SelectEngine(engine) => self.select_engine(engine, bank),
            SynthMessage::AllNotesOff => bank.release_all(),
        }
    }

    fn control_change(&mut self, controller: u8, v: f32, bank: &mut VoiceBank) {
        match controller {
            123 => bank.release_all(),
            8 => {
                self.effects.set_dry_wet(self.mode, v);
                self.effects_dirty = true;
            }
            4..=7 => match self.engine {
                EngineKind::Fm => {
                    self.fm.envelope.set_from_cc(controller, v);
                    self.fm_dirty = true;
                }
                EngineKind::Subtractive => {
                    self.subtractive.envelope.set_from_cc(controller, v);
                    self.subtractive_dirty = true;
                }
            },
            1..=3 => match self.engine {
                EngineKind::Fm => {
                    let fm = &mut self.fm;
                    match controller {
                        1 => {
                            fm.mod_index = v * 2.0;
                            fm.feedback = v;
                        }
                        2 => fm.feedback = v,
                        _ => fm.ratio = (0.25 + v * 3.75).clamp(MIN_RATIO, MAX_RATIO),
                    }
                    self.fm_dirty = true;
                }
                EngineKind::Subtractive => {
                    let sub = &mut self.subtractive;
                    match controller {
                        1 => {
                            sub.base_cutoff_hz = 20.0 * 1000.0_f32.powf(v);
                            sub.filter_env_depth_hz = v * 4_000.0;
                        }
                        2 => sub.resonance = v * 0.95,
                        _ => sub.detune_cents = v * 50.0,
                    }
                    self.subtractive_dirty = true;
                }
            },
            _ => {}
        }
    }

    fn select_engine(&mut self, engine: EngineKind, bank: &mut VoiceBank) {
        if engine == self.engine {
            return;
        }
        debug!(from = self.engine.name(), to = engine.name(), "engine switch");
        bank.release_all();
        self.engine = engine;
        self.mode = EffectMode::first(engine);
        self.reapply_knobs();
        self.mode_dirty = true;
    }

    /// Latest knob positions. `None` means the knob has never moved.
    pub fn set_knobs(&mut self, knobs: [Option<f32>; 2]) {
        let moved = knobs.iter().zip(self.knobs.iter()).any(|(new, old)| match (new, old) {
            (Some(n), Some(o)) => (n - o).abs() > KNOB_EPSILON,
            (Some(_), None) => true,
            _ => false,
        });
        if !moved {
            return;
        }
        for (slot, knob) in self.knobs.iter_mut().zip(knobs) {
            if knob.is_some() {
                *slot = knob;
            }
        }
        self.reapply_knobs();
        self.effects_dirty = true;
    }

    /// Step the effect mode by a signed encoder count.
    pub fn turn_encoder(&mut self, increment: i32) {
        if increment == 0 {
            return;
        }
        let next = self.mode.step(self.engine, increment);
        if next != self.mode {
            self.mode = next;
            self.reapply_knobs();
            self.mode_dirty = true;
        }
    }

    fn reapply_knobs(&mut self) {
        if self.knobs.iter().all(Option::is_none) {
            return;
        }
        // A knob that has not moved yet holds the parameter where it is.
        let (held1, held2) = self.effects.knob_positions(self.mode);
        let k1 = self.knobs[0].unwrap_or(held1);
        let k2 = self.knobs[1].unwrap_or(held2);
        self.effects.apply_knobs(self.mode, k1, k2);
    }

    /// Push everything changed since the last flush into the voices and the
    /// effects chain.
    pub fn flush(&mut self, bank: &mut VoiceBank, chain: &mut EffectsChain) {
        if self.subtractive_dirty {
            bank.apply_subtractive(&self.subtractive);
        }
        if self.fm_dirty {
            bank.apply_fm(&self.fm);
        }
        if self.mode_dirty {
            chain.set_mode(self.mode, &self.effects);
        } else if self.effects_dirty {
            chain.apply(&self.effects);
        }
        self.subtractive_dirty = false;
        self.fm_dirty = false;
        self.effects_dirty = false;
        self.mode_dirty = false;
    }
}
