// harmonist-core/src/types/mod.rs

pub mod chord;
pub mod note;
pub mod params;
pub mod progression;
pub mod roman_numeral;
pub mod time;

pub use chord::ChordQuality;
pub use note::{Melody, MelodyElement, PitchClass, Spelling};
pub use params::{Complexity, Doubling, HarmonyParams, KeyCenter, VoicingStyle};
pub use progression::CompactProgression;
pub use roman_numeral::{analyze_progression, RomanNumeral};
pub use time::{Beats, Span};
