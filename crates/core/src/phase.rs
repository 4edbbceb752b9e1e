use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage of the guided conversation a message belongs to. Sent with every
/// chat request so the backend can pick its conversational context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Onboarding,
    EmotionalMapping,
    Dynamics,
    DualReflection,
    Reflection,
}

impl PhaseId {
    /// Phases offered by the multi-phase flow, in the order they are shown.
    pub const GUIDED: [PhaseId; 4] = [
        PhaseId::Onboarding,
        PhaseId::EmotionalMapping,
        PhaseId::Dynamics,
        PhaseId::DualReflection,
    ];

    /// The value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseId::Onboarding => "onboarding",
            PhaseId::EmotionalMapping => "emotional_mapping",
            PhaseId::Dynamics => "dynamics",
            PhaseId::DualReflection => "dual_reflection",
            PhaseId::Reflection => "reflection",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseId::Onboarding => "Onboarding",
            PhaseId::EmotionalMapping => "Emotional Mapping",
            PhaseId::Dynamics => "Dynamics & Tensions",
            PhaseId::DualReflection => "Dual Reflection",
            PhaseId::Reflection => "Reflection",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase: {0}")]
pub struct UnknownPhase(pub String);

impl FromStr for PhaseId {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "onboarding" => Ok(PhaseId::Onboarding),
            "emotional_mapping" => Ok(PhaseId::EmotionalMapping),
            "dynamics" => Ok(PhaseId::Dynamics),
            "dual_reflection" => Ok(PhaseId::DualReflection),
            "reflection" => Ok(PhaseId::Reflection),
            _ => Err(UnknownPhase(s.to_string())),
        }
    }
}

/// How phase selection behaves for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseMode {
    /// The user picks among [`PhaseId::GUIDED`], starting at onboarding.
    MultiPhase,
    /// Every message is sent with the same phase.
    Fixed(PhaseId),
}

impl PhaseMode {
    pub fn initial_phase(&self) -> PhaseId {
        match self {
            PhaseMode::MultiPhase => PhaseId::Onboarding,
            PhaseMode::Fixed(phase) => *phase,
        }
    }

    pub fn allows(&self, phase: PhaseId) -> bool {
        match self {
            PhaseMode::MultiPhase => PhaseId::GUIDED.contains(&phase),
            PhaseMode::Fixed(fixed) => *fixed == phase,
        }
    }

    /// Phases a user can choose from in this mode.
    pub fn choices(&self) -> Vec<PhaseId> {
        match self {
            PhaseMode::MultiPhase => PhaseId::GUIDED.to_vec(),
            PhaseMode::Fixed(phase) => vec![*phase],
        }
    }
}
