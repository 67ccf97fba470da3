// harmonist-core/src/harmony/mod.rs

pub mod editor;
pub mod generator;
pub mod key;
pub mod label;
pub mod part;
pub mod segment;
pub mod voicing;

pub use editor::{EditorState, History, ProgressionEditor, Snapshot, HISTORY_LIMIT};
pub use generator::{generate_progression, ProgressionPlan};
pub use key::{detect_key, KeyAnalysis, KeyQuality};
pub use label::{generate_chord_label, progression_labels, spell_chord_label};
pub use part::{harmonize, to_playback_parts, ChordLabels, HarmonizedPart, Part, PartAnalysis};
pub use segment::Segment;
pub use voicing::{HarmonyNote, Voicing};
