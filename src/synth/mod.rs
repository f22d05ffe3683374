//! Voice management: the two voice models, their pools, and the router that
//! turns control events into patch changes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod bank;
pub mod factory;
pub mod fm_voice;
pub mod message;
pub mod patch;
pub mod poly;
pub mod router;
pub mod voice;

/// Which synthesis engine notes are routed to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    Subtractive,
    #[default]
    Fm,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Subtractive => "Subtractive",
            EngineKind::Fm => "FM",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            EngineKind::Subtractive => EngineKind::Fm,
            EngineKind::Fm => EngineKind::Subtractive,
        }
    }
}

pub use bank::VoiceBank;
pub use message::{MessageReceiver, SynthMessage};
pub use poly::{StealPolicy, VoicePool};
pub use router::ModulationRouter;
pub use voice::{SynthVoice, VoiceState};
