//! Progression generation
//!
//! Splits the melody into segments, picks one root per segment from its
//! most salient note (snapped to the key) and one quality per root from the
//! vocabulary permitted by the complexity setting.

use crate::harmony::key::KeyAnalysis;
use crate::harmony::segment::{renumber, segment_by_duration, Segment};
use crate::types::chord::ChordQuality;
use crate::types::note::{pitch_class, Melody, PitchClass};
use crate::types::params::{Complexity, HarmonyParams};
use crate::types::progression::CompactProgression;
use crate::types::time::Beats;
use num_traits::Zero;
use tracing::{debug, trace};

/// Segments with the chord chosen for each
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionPlan {
    pub segments: Vec<Segment>,
    pub progression: CompactProgression,
}

/// Build a progression aligned to the melody's timeline
pub fn generate_progression(
    melody: &Melody,
    rhythm: &[Beats],
    key: &KeyAnalysis,
    params: &HarmonyParams,
) -> ProgressionPlan {
    let segments = renumber(segment_by_duration(rhythm));

    let mut roots: Vec<PitchClass> = Vec::with_capacity(segments.len());
    let mut qualities = Vec::with_capacity(segments.len());
    for segment in &segments {
        let previous = roots.last().copied();
        let root = choose_root(melody, rhythm, segment, key, previous);
        let quality = params
            .quality
            .unwrap_or_else(|| choose_quality(key, root, params.complexity));
        trace!(segment = segment.chord, root, quality = %quality, "chose chord");
        roots.push(root);
        qualities.push(quality);
    }

    // An empty melody still gets a tonic chord
    if roots.is_empty() {
        roots.push(key.detected_key);
        qualities.push(
            params
                .quality
                .unwrap_or_else(|| choose_quality(key, key.detected_key, params.complexity)),
        );
    }

    let progression = CompactProgression::from_parts(qualities, roots);
    debug!(segments = segments.len(), "generated progression");
    ProgressionPlan {
        segments,
        progression,
    }
}

/// Pitch classes sharing the greatest total duration within the segment,
/// ordered by first occurrence
fn salient_pitch_classes(melody: &Melody, rhythm: &[Beats], segment: &Segment) -> Vec<PitchClass> {
    let mut weight = [Beats::zero(); 12];
    let mut first_seen: Vec<PitchClass> = Vec::new();

    for i in segment.positions.clone() {
        if let Some(pc) = melody[i].pitch_class() {
            weight[pc as usize] += rhythm[i];
            if !first_seen.contains(&pc) {
                first_seen.push(pc);
            }
        }
    }

    let Some(max) = first_seen.iter().map(|&pc| weight[pc as usize]).max() else {
        return Vec::new();
    };
    first_seen
        .into_iter()
        .filter(|&pc| weight[pc as usize] == max)
        .collect()
}

/// How smooth a root movement is: fifths first, then steps, then a
/// repeated root, then leaps
fn motion_rank(from: PitchClass, to: PitchClass) -> u8 {
    match pitch_class(to as i32 - from as i32) {
        5 | 7 => 0,
        1 | 2 | 10 | 11 => 1,
        0 => 2,
        _ => 3,
    }
}

/// Rank a candidate root; the opening segment prefers the tonic itself
fn root_rank(key: &KeyAnalysis, previous: Option<PitchClass>, root: PitchClass) -> u8 {
    match previous {
        Some(prev) => motion_rank(prev, root),
        None if root == key.detected_key => 0,
        None => 1 + motion_rank(key.detected_key, root),
    }
}

/// Snap a pitch class onto the key's scale. Chromatic notes sit a semitone
/// from a scale tone on at least one side; when both neighbours qualify the
/// smoother root motion wins, and ties resolve upward.
fn snap_to_scale(key: &KeyAnalysis, pc: PitchClass, previous: Option<PitchClass>) -> PitchClass {
    if key.is_diatonic(pc) {
        return pc;
    }
    let below = pitch_class(pc as i32 - 1);
    let above = pitch_class(pc as i32 + 1);
    match (key.is_diatonic(below), key.is_diatonic(above)) {
        (true, true) => {
            if root_rank(key, previous, above) <= root_rank(key, previous, below) {
                above
            } else {
                below
            }
        }
        (false, true) => above,
        _ => below,
    }
}

fn choose_root(
    melody: &Melody,
    rhythm: &[Beats],
    segment: &Segment,
    key: &KeyAnalysis,
    previous: Option<PitchClass>,
) -> PitchClass {
    let mut candidates: Vec<PitchClass> = Vec::new();
    for pc in salient_pitch_classes(melody, rhythm, segment) {
        let root = snap_to_scale(key, pc, previous);
        if !candidates.contains(&root) {
            candidates.push(root);
        }
    }

    // Equal salience: smoothest motion, then earliest occurrence
    candidates
        .iter()
        .enumerate()
        .min_by_key(|(order, &root)| (root_rank(key, previous, root), *order))
        .map(|(_, &root)| root)
        .unwrap_or_else(|| previous.unwrap_or(key.detected_key))
}

/// Richest eligible quality consistent with the key on this root
pub fn choose_quality(key: &KeyAnalysis, root: PitchClass, complexity: Complexity) -> ChordQuality {
    let scale = key.scale_for_root(root);
    let diatonic_third = if scale.contains(&pitch_class(root as i32 + 4)) {
        4
    } else {
        3
    };
    let is_dominant = pitch_class(root as i32 - key.detected_key as i32) == 7;

    // Later vocabulary entries win ties within a tier
    ChordQuality::eligible(complexity)
        .filter(|q| q.third() == diatonic_third)
        .filter(|q| {
            if q.is_altered_dominant() {
                is_dominant
            } else {
                q.pitch_classes(root).iter().all(|pc| scale.contains(pc))
            }
        })
        .max_by_key(|q| q.tier())
        .unwrap_or(if diatonic_third == 4 {
            ChordQuality::Major
        } else {
            ChordQuality::Minor
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::key::KeyQuality;
    use crate::types::note::MelodyElement::{Pitch, Rest};
    use crate::types::time::beats;
    use ChordQuality::*;

    fn c_major() -> KeyAnalysis {
        KeyAnalysis {
            detected_key: 0,
            key_quality: KeyQuality::Major,
            confidence: 1.0,
        }
    }

    fn a_minor() -> KeyAnalysis {
        KeyAnalysis {
            detected_key: 9,
            key_quality: KeyQuality::Minor,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_quality_by_degree_at_seventh() {
        let key = c_major();
        let expected = [
            (0, Major7),
            (2, Minor7),
            (4, Minor7),
            (5, Major7),
            (7, Dominant7),
            (9, Minor7),
            (11, HalfDiminished7),
        ];
        for (root, quality) in expected {
            assert_eq!(choose_quality(&key, root, Complexity::Seventh), quality, "root {}", root);
        }
    }

    #[test]
    fn test_triads_only() {
        let key = c_major();
        assert_eq!(choose_quality(&key, 0, Complexity::Triads), Major);
        assert_eq!(choose_quality(&key, 2, Complexity::Triads), Minor);
        assert_eq!(choose_quality(&key, 11, Complexity::Triads), Diminished);
        // Suspensions are never chosen automatically
        assert_eq!(choose_quality(&key, 0, Complexity::Suspended), Major);
    }

    #[test]
    fn test_minor_key_dominant_is_major() {
        let key = a_minor();
        assert_eq!(choose_quality(&key, 4, Complexity::Triads), Major);
        assert_eq!(choose_quality(&key, 4, Complexity::Seventh), Dominant7);
        assert_eq!(choose_quality(&key, 9, Complexity::Seventh), Minor7);
    }

    #[test]
    fn test_altered_only_on_dominant() {
        let key = c_major();
        assert!(choose_quality(&key, 7, Complexity::Altered).is_altered_dominant());
        assert!(!choose_quality(&key, 2, Complexity::Altered).is_altered_dominant());
    }

    #[test]
    fn test_extended_prefers_thirteenth_on_dominant() {
        let key = c_major();
        assert_eq!(choose_quality(&key, 7, Complexity::Extended), Dominant13);
        assert_eq!(choose_quality(&key, 0, Complexity::Extended), Major9);
    }

    #[test]
    fn test_single_bar_takes_tonic() {
        let melody = vec![Pitch(60), Pitch(62), Pitch(64), Pitch(65)];
        let rhythm = vec![beats(1); 4];
        let plan = generate_progression(&melody, &rhythm, &c_major(), &HarmonyParams::default());
        assert_eq!(plan.progression.len(), 1);
        assert_eq!(plan.progression.roots(), &[0]);
        assert_eq!(plan.progression.qualities(), &[Major7]);
    }

    #[test]
    fn test_longest_note_sets_root() {
        // Bar 1 dwells on F, bar 2 on G
        let melody = vec![
            Pitch(65),
            Pitch(60),
            Pitch(67),
            Pitch(71),
            Pitch(62),
        ];
        let rhythm = vec![beats(3), beats(1), beats(2), beats(1), beats(1)];
        let plan = generate_progression(&melody, &rhythm, &c_major(), &HarmonyParams::default());
        assert_eq!(plan.progression.roots(), &[5, 7]);
        assert_eq!(plan.progression.qualities(), &[Major7, Dominant7]);
    }

    #[test]
    fn test_chromatic_note_snaps_to_scale() {
        // Long F# in C major: G (a fifth above the tonic) beats F
        let melody = vec![Pitch(66), Pitch(60)];
        let rhythm = vec![beats(3), beats(1)];
        let params = HarmonyParams {
            complexity: Complexity::Triads,
            ..Default::default()
        };
        let plan = generate_progression(&melody, &rhythm, &c_major(), &params);
        assert_eq!(plan.progression.roots(), &[7]);
        assert_eq!(plan.progression.qualities(), &[Major]);
    }

    #[test]
    fn test_tied_salience_prefers_fifth_motion() {
        // Bar 1: C. Bar 2: E and G equally long, G is a fifth from C.
        let melody = vec![Pitch(60), Pitch(64), Pitch(67)];
        let rhythm = vec![beats(4), beats(2), beats(2)];
        let plan = generate_progression(&melody, &rhythm, &c_major(), &HarmonyParams::default());
        assert_eq!(plan.progression.roots(), &[0, 7]);
    }

    #[test]
    fn test_rest_segment_repeats_previous_root() {
        let melody = vec![Pitch(67), Rest];
        let rhythm = vec![beats(4), beats(4)];
        let plan = generate_progression(&melody, &rhythm, &c_major(), &HarmonyParams::default());
        assert_eq!(plan.progression.roots(), &[7, 7]);
    }

    #[test]
    fn test_quality_override() {
        let melody = vec![Pitch(60), Pitch(67)];
        let rhythm = vec![beats(4), beats(4)];
        let params = HarmonyParams {
            quality: Some(Sus4),
            ..Default::default()
        };
        let plan = generate_progression(&melody, &rhythm, &c_major(), &params);
        assert_eq!(plan.progression.qualities(), &[Sus4, Sus4]);
    }
}
