//! Chord labels
//!
//! Labels are always derived from (root, quality) pairs, never edited in
//! place, so generation and editing produce identical text for identical
//! progressions.

use crate::types::chord::ChordQuality;
use crate::types::note::{PitchClass, Spelling};
use crate::types::progression::CompactProgression;

/// Display label for a chord, e.g. `(0, Dominant7)` -> `"C7"`, `(9, Minor)` -> `"Am"`.
/// Black-key roots are written with sharps.
pub fn generate_chord_label(root: PitchClass, quality: ChordQuality) -> String {
    format!("{}{}", Spelling::Sharps.name(root), quality.suffix())
}

/// Label with an explicit spelling, resolved against the key when the
/// spelling is key-conventional
pub fn spell_chord_label(
    root: PitchClass,
    quality: ChordQuality,
    spelling: Spelling,
    key: PitchClass,
    minor: bool,
) -> String {
    let name = spelling.resolve(key, minor).name(root);
    format!("{}{}", name, quality.suffix())
}

/// One label per progression entry
pub fn progression_labels(
    progression: &CompactProgression,
    spelling: Spelling,
    key: PitchClass,
    minor: bool,
) -> Vec<String> {
    progression
        .chords()
        .map(|(root, quality)| spell_chord_label(root, quality, spelling, key, minor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChordQuality::*;

    #[test]
    fn test_basic_labels() {
        assert_eq!(generate_chord_label(0, Major), "C");
        assert_eq!(generate_chord_label(9, Minor), "Am");
        assert_eq!(generate_chord_label(0, Dominant7), "C7");
        assert_eq!(generate_chord_label(7, Major7), "Gmaj7");
        assert_eq!(generate_chord_label(11, HalfDiminished7), "Bm7b5");
        assert_eq!(generate_chord_label(10, Dominant9), "A#9");
    }

    #[test]
    fn test_spelled_labels() {
        assert_eq!(spell_chord_label(10, Major, Spelling::Flats, 0, false), "Bb");
        assert_eq!(spell_chord_label(10, Major, Spelling::Sharps, 0, false), "A#");
        // F major signature spells with flats
        assert_eq!(spell_chord_label(10, Major, Spelling::KeyConventional, 5, false), "Bb");
        // E minor signature spells with sharps
        assert_eq!(spell_chord_label(6, Diminished, Spelling::KeyConventional, 4, true), "F#dim");
    }

    #[test]
    fn test_progression_labels() {
        let progression = CompactProgression::from_chords(&[(0, Major), (9, Minor)]).unwrap();
        assert_eq!(
            progression_labels(&progression, Spelling::Sharps, 0, false),
            vec!["C", "Am"]
        );
    }
}
