use thiserror::Error;

/// Input contract violations, rejected before any computation
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HarmonizeError {
    #[error("melody is empty")]
    EmptyMelody,

    #[error("melody has {melody} positions but rhythm has {rhythm}")]
    LengthMismatch { melody: usize, rhythm: usize },

    #[error("duration at position {index} must be positive")]
    NonPositiveDuration { index: usize },

    #[error("durations up to position {index} are too finely divided or too long to place on one timeline")]
    DurationOverflow { index: usize },

    #[error("pitch {pitch} at position {index} is outside 0-127")]
    PitchOutOfRange { index: usize, pitch: u8 },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// Rejected editor operations; the session state is left untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditError {
    #[error("chord index {index} is out of range (progression has {len} chords)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("cannot delete the only chord in the progression")]
    LastChord,

    #[error("progression is empty")]
    EmptyProgression,

    #[error("progression has {qualities} qualities but {roots} roots")]
    MismatchedLengths { qualities: usize, roots: usize },
}
