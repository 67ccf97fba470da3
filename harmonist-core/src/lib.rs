//! # Harmonist Core
//!
//! WASM-compatible melody harmonization engine. Detects the key of a
//! monophonic melody, generates a chord progression over its timeline,
//! voices every chord inside a pitch range and supports editing the
//! progression with undo/redo. No terminal, audio or file dependencies.
//!
//! ## Features
//!
//! - **serde**: Enable serialization of parts, progressions and parameters
//! - **wasm**: Enable WASM bindings via wasm-bindgen
//! - **colored**: Enable colored terminal output (disabled in WASM)
//!
//! ## Example
//!
//! ```
//! use harmonist_core::{harmonize, parse_melody, HarmonyParams, ProgressionEditor, ChordQuality};
//!
//! let (melody, rhythm) = parse_melody("C4 E4 G4 F4 | A4 C5 G4 C4").unwrap();
//! let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
//!
//! let mut editor = ProgressionEditor::new(part);
//! editor.change(0, ChordQuality::Major).unwrap();
//! let saved = editor.save().unwrap();
//! assert!(saved.chord_labels.is_expanded());
//! ```

pub mod error;
pub mod harmony;
pub mod parser;
pub mod types;
pub mod wasm;

// Re-export commonly used types
pub use error::{EditError, HarmonizeError};
pub use harmony::{
    generate_chord_label, harmonize, to_playback_parts, ChordLabels, HarmonizedPart, KeyAnalysis,
    KeyQuality, Part, ProgressionEditor,
};
pub use parser::parse_melody;
pub use types::{
    Beats, ChordQuality, CompactProgression, Complexity, Doubling, HarmonyParams, KeyCenter,
    Melody, MelodyElement, PitchClass, Spelling, VoicingStyle,
};
