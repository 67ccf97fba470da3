//! Harmonized parts
//!
//! `harmonize` runs the whole pipeline (key detection, progression
//! generation, voicing) and packages the result. A `HarmonizedPart` is a
//! value: editing produces new parts through `with_progression`, never
//! mutating one in place.

use crate::error::{EditError, HarmonizeError};
use crate::harmony::generator::generate_progression;
use crate::harmony::key::{detect_key, KeyAnalysis};
use crate::harmony::label::progression_labels;
use crate::harmony::segment::{chord_index_for_position, segment_by_position, Segment};
use crate::harmony::voicing::{realize, HarmonyNote, Voicing};
use crate::types::note::{Melody, MelodyElement, Spelling, MAX_PITCH};
use crate::types::params::HarmonyParams;
use crate::types::progression::CompactProgression;
use crate::types::roman_numeral::{analyze_progression, RomanNumeral};
use crate::types::time::{timeline_overflow, total, Beats};
#[cfg(feature = "colored")]
use colored::*;
use num_traits::Zero;
use std::fmt;
use tracing::debug;

/// Chord labels in one of their two shapes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChordLabels {
    /// One label per progression entry (while editing)
    Compact(Vec<String>),
    /// One label per non-rest melody position (after a save)
    Expanded(Vec<String>),
}

impl ChordLabels {
    pub fn labels(&self) -> &[String] {
        match self {
            ChordLabels::Compact(labels) | ChordLabels::Expanded(labels) => labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels().len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, ChordLabels::Expanded(_))
    }
}

/// Key and progression of a part
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartAnalysis {
    pub key: KeyAnalysis,
    pub progression: CompactProgression,
}

/// A melody with its generated accompaniment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonizedPart {
    pub original_melody: Melody,
    pub rhythm: Vec<Beats>,
    /// One segment per sounding progression entry
    pub segments: Vec<Segment>,
    /// One voicing per segment
    pub voicings: Vec<Voicing>,
    pub harmony_notes: Vec<HarmonyNote>,
    pub chord_labels: ChordLabels,
    pub analysis: PartAnalysis,
    /// How roots are spelled in labels
    pub spelling: Spelling,
    pub params: HarmonyParams,
}

/// A monophonic line for playback or export
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Part {
    pub melody: Vec<MelodyElement>,
    pub rhythm: Vec<Beats>,
}

impl Part {
    pub fn total_duration(&self) -> Beats {
        total(&self.rhythm)
    }
}

/// Check the input contract: non-empty, parallel, positive durations, MIDI pitches
pub fn validate_input(melody: &Melody, rhythm: &[Beats]) -> Result<(), HarmonizeError> {
    if melody.is_empty() {
        return Err(HarmonizeError::EmptyMelody);
    }
    if melody.len() != rhythm.len() {
        return Err(HarmonizeError::LengthMismatch {
            melody: melody.len(),
            rhythm: rhythm.len(),
        });
    }
    if let Some(index) = rhythm.iter().position(|d| *d <= Beats::zero()) {
        return Err(HarmonizeError::NonPositiveDuration { index });
    }
    if let Some(index) = timeline_overflow(rhythm) {
        return Err(HarmonizeError::DurationOverflow { index });
    }
    if let Some((index, pitch)) = melody
        .iter()
        .enumerate()
        .find_map(|(i, e)| e.pitch().filter(|&p| p > MAX_PITCH).map(|p| (i, p)))
    {
        return Err(HarmonizeError::PitchOutOfRange { index, pitch });
    }
    Ok(())
}

/// Harmonize a melody. Inputs and parameters are validated before any work.
pub fn harmonize(
    melody: &Melody,
    rhythm: &[Beats],
    params: &HarmonyParams,
) -> Result<HarmonizedPart, HarmonizeError> {
    params.validate()?;
    validate_input(melody, rhythm)?;

    let key = detect_key(melody, rhythm, params.key_center);
    let plan = generate_progression(melody, rhythm, &key, params);
    let realization = realize(&plan.progression, &plan.segments, params);
    let spelling = Spelling::from_bias(params.key_center_bias);
    let labels = progression_labels(&plan.progression, spelling, key.detected_key, key.is_minor());

    debug!(
        positions = melody.len(),
        chords = plan.progression.len(),
        labels = ?labels,
        "harmonized melody"
    );

    Ok(HarmonizedPart {
        original_melody: melody.clone(),
        rhythm: rhythm.to_vec(),
        segments: plan.segments,
        voicings: realization.voicings,
        harmony_notes: realization.notes,
        chord_labels: ChordLabels::Compact(labels),
        analysis: PartAnalysis {
            key,
            progression: plan.progression,
        },
        spelling,
        params: params.clone(),
    })
}

/// Project a part onto plain melody/rhythm lines
pub fn to_playback_parts(part: &HarmonizedPart) -> Vec<Part> {
    part.to_playback_parts()
}

impl HarmonizedPart {
    pub fn progression(&self) -> &CompactProgression {
        &self.analysis.progression
    }

    pub fn key(&self) -> &KeyAnalysis {
        &self.analysis.key
    }

    /// Labels for a progression under this part's key and spelling
    pub fn labels_for(&self, progression: &CompactProgression) -> Vec<String> {
        progression_labels(
            progression,
            self.spelling,
            self.analysis.key.detected_key,
            self.analysis.key.is_minor(),
        )
    }

    /// Name of the detected key, e.g. `Bb major`
    pub fn key_name(&self) -> String {
        let key = &self.analysis.key;
        let name = self
            .spelling
            .resolve(key.detected_key, key.is_minor())
            .name(key.detected_key);
        format!("{} {}", name, key.key_quality)
    }

    pub fn roman_numerals(&self) -> Vec<RomanNumeral> {
        let key = &self.analysis.key;
        analyze_progression(key.detected_key, key.is_minor(), self.progression().chords())
    }

    /// Same melody and key with a different progression: voicings and
    /// compact labels are rebuilt. An unchanged chord count keeps the
    /// existing segment boundaries; otherwise chords are spread over the
    /// melody positions.
    pub fn with_progression(&self, progression: CompactProgression) -> HarmonizedPart {
        let segments = if progression.len() == self.progression().len() {
            self.segments.clone()
        } else {
            segment_by_position(&self.rhythm, progression.len())
        };
        let realization = realize(&progression, &segments, &self.params);
        let labels = self.labels_for(&progression);

        HarmonizedPart {
            original_melody: self.original_melody.clone(),
            rhythm: self.rhythm.clone(),
            segments,
            voicings: realization.voicings,
            harmony_notes: realization.notes,
            chord_labels: ChordLabels::Compact(labels),
            analysis: PartAnalysis {
                key: self.analysis.key,
                progression,
            },
            spelling: self.spelling,
            params: self.params.clone(),
        }
    }

    /// One label per non-rest melody position. Positions map to chords by
    /// `min(i / ceil(N / M), M - 1)` over all positions, rests included.
    pub fn expanded_labels(&self) -> Result<Vec<String>, EditError> {
        let progression = self.progression();
        if progression.is_empty() {
            return Err(EditError::EmptyProgression);
        }
        let compact = self.labels_for(progression);
        let len = self.original_melody.len();
        Ok(self
            .original_melody
            .iter()
            .enumerate()
            .filter(|(_, element)| !element.is_rest())
            .map(|(i, _)| compact[chord_index_for_position(i, len, compact.len())].clone())
            .collect())
    }

    /// Melody as part 0, then one part per harmony voice with rests
    /// filling the gaps
    pub fn to_playback_parts(&self) -> Vec<Part> {
        let mut parts = vec![Part {
            melody: self.original_melody.clone(),
            rhythm: self.rhythm.clone(),
        }];

        let end = total(&self.rhythm);
        let voices = self
            .harmony_notes
            .iter()
            .map(|n| n.voice + 1)
            .max()
            .unwrap_or(0);

        for voice in 0..voices {
            let mut part = Part {
                melody: Vec::new(),
                rhythm: Vec::new(),
            };
            let mut cursor = Beats::zero();
            for note in self.harmony_notes.iter().filter(|n| n.voice == voice) {
                let start = note.onset.max(cursor);
                let stop = note.end().min(end);
                if stop <= start {
                    continue;
                }
                if start > cursor {
                    part.melody.push(MelodyElement::Rest);
                    part.rhythm.push(start - cursor);
                }
                part.melody.push(MelodyElement::Pitch(note.pitch));
                part.rhythm.push(stop - start);
                cursor = stop;
            }
            if cursor < end {
                part.melody.push(MelodyElement::Rest);
                part.rhythm.push(end - cursor);
            }
            parts.push(part);
        }
        parts
    }
}

fn voicing_names(voicing: &Voicing) -> String {
    voicing
        .pitches
        .iter()
        .map(|&p| MelodyElement::Pitch(p).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "colored")]
impl fmt::Display for HarmonizedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {}",
            "Key:".bright_black(),
            self.key_name().cyan().bold(),
            format!("(confidence {:.2})", self.analysis.key.confidence).bright_black()
        )?;
        let labels = self.labels_for(self.progression());
        for (segment, voicing) in self.segments.iter().zip(&self.voicings) {
            let label = labels.get(segment.chord).map(String::as_str).unwrap_or("?");
            writeln!(
                f,
                "  {:>3}  {:<10} {}",
                segment.chord.to_string().bright_black(),
                label.green().bold(),
                voicing_names(voicing).cyan()
            )?;
        }
        if let ChordLabels::Expanded(expanded) = &self.chord_labels {
            write!(f, "{} {}", "Per note:".bright_black(), expanded.join(" ").yellow())?;
        }
        Ok(())
    }
}

#[cfg(not(feature = "colored"))]
impl fmt::Display for HarmonizedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Key: {} (confidence {:.2})",
            self.key_name(),
            self.analysis.key.confidence
        )?;
        let labels = self.labels_for(self.progression());
        for (segment, voicing) in self.segments.iter().zip(&self.voicings) {
            let label = labels.get(segment.chord).map(String::as_str).unwrap_or("?");
            writeln!(f, "  {:>3}  {:<10} {}", segment.chord, label, voicing_names(voicing))?;
        }
        if let ChordLabels::Expanded(expanded) = &self.chord_labels {
            write!(f, "Per note: {}", expanded.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::key::KeyQuality;
    use crate::types::chord::ChordQuality;
    use crate::types::note::MelodyElement::{Pitch, Rest};
    use crate::types::params::VoicingStyle;
    use crate::types::time::{beats, beats_ratio};

    fn c_major_melody() -> (Melody, Vec<Beats>) {
        let melody = vec![
            Pitch(60),
            Pitch(64),
            Pitch(67),
            Pitch(65),
            Pitch(69),
            Pitch(72),
            Pitch(67),
            Pitch(60),
        ];
        (melody, vec![beats(1); 8])
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = HarmonyParams::default();
        assert_eq!(
            harmonize(&vec![], &[], &params).unwrap_err(),
            HarmonizeError::EmptyMelody
        );
        assert_eq!(
            harmonize(&vec![Pitch(60)], &[beats(1), beats(1)], &params).unwrap_err(),
            HarmonizeError::LengthMismatch {
                melody: 1,
                rhythm: 2
            }
        );
        assert_eq!(
            harmonize(&vec![Pitch(60), Rest], &[beats(1), beats(0)], &params).unwrap_err(),
            HarmonizeError::NonPositiveDuration { index: 1 }
        );
        assert_eq!(
            harmonize(&vec![Pitch(200)], &[beats(1)], &params).unwrap_err(),
            HarmonizeError::PitchOutOfRange {
                index: 0,
                pitch: 200
            }
        );
        let bad = HarmonyParams {
            density: 9,
            ..Default::default()
        };
        assert!(matches!(
            harmonize(&vec![Pitch(60)], &[beats(1)], &bad),
            Err(HarmonizeError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_rejects_durations_without_common_timeline() {
        let (melody, rhythm) =
            crate::parser::parse_melody("C4:1/1000003 D4:1/1000033 E4:1/1000037 F4:1/1000039")
                .unwrap();
        assert_eq!(
            harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap_err(),
            HarmonizeError::DurationOverflow { index: 1 }
        );

        // Mixed tuplets share a small grid and still harmonize
        let (melody, rhythm) =
            crate::parser::parse_melody("C4:1/3 E4:1/5 G4:1/7 C5:1/9 G4:2").unwrap();
        assert!(harmonize(&melody, &rhythm, &HarmonyParams::default()).is_ok());
    }

    #[test]
    fn test_compact_shape_after_generation() {
        let (melody, rhythm) = c_major_melody();
        let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
        assert_eq!(part.key().detected_key, 0);
        assert_eq!(part.key().key_quality, KeyQuality::Major);
        assert!(!part.chord_labels.is_expanded());
        assert_eq!(part.chord_labels.len(), part.progression().len());
        assert_eq!(part.segments.len(), part.progression().len());
        assert_eq!(part.voicings.len(), part.segments.len());
        assert_eq!(part.key_name(), "C major");
    }

    #[test]
    fn test_playback_parts_cover_the_melody() {
        let (melody, rhythm) = c_major_melody();
        let params = HarmonyParams {
            voicing_style: VoicingStyle::Staccato,
            ..Default::default()
        };
        let part = harmonize(&melody, &rhythm, &params).unwrap();
        let parts = part.to_playback_parts();
        assert_eq!(parts.len(), 1 + params.density as usize);
        assert_eq!(parts[0].melody, melody);
        for p in &parts {
            assert_eq!(p.melody.len(), p.rhythm.len());
            assert_eq!(p.total_duration(), beats(8));
        }
        // Staccato leaves half-beat rests between strikes
        assert!(parts[1].melody.contains(&Rest));
        assert!(parts[1].rhythm.contains(&beats_ratio(1, 2)));
    }

    #[test]
    fn test_expanded_labels_skip_rests() {
        let melody = vec![Pitch(60), Rest, Pitch(64), Pitch(67), Rest, Pitch(65), Pitch(69), Pitch(72)];
        let rhythm = vec![beats(1); 8];
        let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
        let progression = CompactProgression::from_chords(&[
            (0, ChordQuality::Major),
            (5, ChordQuality::Major),
            (7, ChordQuality::Major),
        ])
        .unwrap();
        let edited = part.with_progression(progression);
        // Positions map 0,0,0,1,1,1,2,2; rests at 1 and 4 emit nothing
        assert_eq!(
            edited.expanded_labels().unwrap(),
            vec!["C", "C", "F", "F", "G", "G"]
        );
    }

    #[test]
    fn test_with_progression_keeps_segments_when_length_matches() {
        let (melody, rhythm) = c_major_melody();
        let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
        let changed = part
            .progression()
            .with_quality(0, ChordQuality::Sus4)
            .unwrap();
        let edited = part.with_progression(changed);
        assert_eq!(edited.segments, part.segments);
        assert_eq!(edited.voicings[0].quality, ChordQuality::Sus4);
        assert!(edited.chord_labels.labels()[0].ends_with("sus4"));
    }

    #[test]
    fn test_roman_numerals_follow_progression() {
        let (melody, rhythm) = c_major_melody();
        let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
        assert_eq!(part.roman_numerals().len(), part.progression().len());
    }
}
