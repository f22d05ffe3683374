use crate::MIN_TIME;

/*
ADSR Envelope Implementation
============================

A linear ADSR envelope generator, driven by a gate.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). This multiplies
              the audio signal to control its amplitude over time.

  stage       Which phase of the envelope we're in: Idle, Attack, Decay,
              Sustain, or Release.

  gate        Key held. A rising edge starts Attack, a falling edge starts
              Release from wherever the envelope currently is.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Attack ramps from the CURRENT level, not from zero. A voice that is stolen
while still sounding glides up from where it was instead of clicking down
to silence first.

Release snapshots the starting level and total samples at gate-off and
interpolates linearly, so it is non-increasing and lands exactly on 0.0.

    ┌──────┐  gate ↑   ┌────────┐  level=1  ┌───────┐  level=S  ┌─────────┐
    │ Idle │ ────────→ │ Attack │ ────────→ │ Decay │ ────────→ │ Sustain │
    └──────┘           └────────┘           └───────┘           └─────────┘
        ↑                    └──────────── gate ↓ ───────────────────┘
        │    level=0    ┌─────────┐               │
        └────────────── │ Release │ ←─────────────┘
                        └─────────┘
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

#[derive(Debug, Clone)]
pub struct Envelope {
    sample_rate: f32,

    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,
    last_gate: bool,

    decay_start_level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::adsr(sample_rate, 0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            sample_rate,
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),

            stage: EnvelopeState::Idle,
            level: 0.0,
            last_gate: false,
            decay_start_level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    pub fn set_attack_time(&mut self, seconds: f32) {
        self.attack_time = seconds.max(MIN_TIME);
    }

    pub fn set_decay_time(&mut self, seconds: f32) {
        self.decay_time = seconds.max(MIN_TIME);
    }

    pub fn set_sustain_level(&mut self, level: f32) {
        self.sustain_level = level.clamp(0.0, 1.0);
    }

    pub fn set_release_time(&mut self, seconds: f32) {
        self.release_time = seconds.max(MIN_TIME);
    }

    /// Start (or restart) the attack from the current level.
    pub fn retrigger(&mut self) {
        self.stage = EnvelopeState::Attack;
        self.last_gate = true;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from current level.
    pub fn release(&mut self) {
        self.last_gate = false;
        if self.stage == EnvelopeState::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance one sample with the given gate and return the new level.
    ///
    /// Gate edges are detected here, so callers can simply pass the key state.
    #[inline]
    pub fn process(&mut self, gate: bool) -> f32 {
        if gate && !self.last_gate {
            self.retrigger();
        } else if !gate && self.last_gate {
            self.release();
        }
        self.next_sample()
    }

    /// Advance the envelope by one sample.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                let increment = 1.0 / (self.attack_time * self.sample_rate);
                self.level += increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.decay_start_level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.decay_start_level - target;
                if total_drop <= 0.0 {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                } else {
                    self.level -= total_drop / (self.decay_time * self.sample_rate);
                    if self.level <= target {
                        self.level = target;
                        self.stage = EnvelopeState::Sustain;
                    }
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                // level = start * (1 - elapsed/total)
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values with a constant gate.
    pub fn render(&mut self, buffer: &mut [f32], gate: bool) {
        for sample in buffer.iter_mut() {
            *sample = self.process(gate);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.last_gate = false;
        self.decay_start_level = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(env: &mut Envelope, gate: bool, samples: usize) {
        for _ in 0..samples {
            env.process(gate);
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.1, 0.7, 0.2);

        render_samples(&mut env, true, (0.01 * SAMPLE_RATE) as usize + 1);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_ne!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.05, sustain, 0.2);

        let attack_decay_samples = ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5;
        render_samples(&mut env, true, attack_decay_samples);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 0.05, "sustain level should be held");
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.05, 0.5, release);

        render_samples(&mut env, true, 20);
        render_samples(&mut env, false, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001, "release should fall back to zero");
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn release_is_non_increasing() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.005, 0.02, 0.8, 0.05);
        render_samples(&mut env, true, 40);

        let mut previous = env.level();
        for _ in 0..60 {
            let level = env.process(false);
            assert!(level <= previous + 1e-7, "release rose from {previous} to {level}");
            previous = level;
        }
        assert!(!env.is_active());
    }

    #[test]
    fn retrigger_attacks_from_current_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.05, 0.5, 0.2);
        render_samples(&mut env, true, 100);
        let held = env.level();

        env.retrigger();
        let next = env.next_sample();
        assert!(next > held, "retrigger should ramp up from {held}, got {next}");
    }

    #[test]
    fn gate_off_while_idle_stays_idle() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.release();
        assert_eq!(env.process(false), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn sustain_change_above_level_ends_decay() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.5, 0.2, 0.1);
        render_samples(&mut env, true, 5);
        assert_eq!(env.state(), EnvelopeState::Decay);

        env.set_sustain_level(1.0);
        env.process(true);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 1.0);
    }
}
