use harmonist_core::harmony::segment::chord_index_for_position;
use harmonist_core::types::time::{beats, beats_ratio};
use harmonist_core::{
    generate_chord_label, harmonize, parse_melody, to_playback_parts, Beats, ChordQuality,
    Complexity, CompactProgression, Doubling, HarmonyParams, KeyCenter, KeyQuality, Melody,
    MelodyElement, VoicingStyle,
};
use pretty_assertions::assert_eq;

fn quarters(pitches: &[u8]) -> (Melody, Vec<Beats>) {
    let melody: Melody = pitches.iter().map(|&p| MelodyElement::Pitch(p)).collect();
    let rhythm = vec![beats(1); melody.len()];
    (melody, rhythm)
}

#[test]
fn test_opening_of_c_major_scale() {
    let (melody, rhythm) = quarters(&[60, 62, 64, 65]);
    let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();

    assert_eq!(part.key().detected_key, 0);
    assert_eq!(part.key().key_quality, KeyQuality::Major);
    assert!(part.key().confidence > 0.0);

    let first_root = part.progression().roots()[0];
    assert!([0, 2, 4, 5, 7, 9, 11].contains(&first_root));
    assert_eq!(part.chord_labels.labels(), &["Cmaj7"]);
}

#[test]
fn test_label_examples() {
    let progression = CompactProgression::from_chords(&[
        (0, "M".parse().unwrap()),
        (9, "m".parse().unwrap()),
    ])
    .unwrap();
    let labels: Vec<String> = progression
        .chords()
        .map(|(root, quality)| generate_chord_label(root, quality))
        .collect();
    assert_eq!(labels, vec!["C", "Am"]);
    assert_eq!(generate_chord_label(0, ChordQuality::Dominant7), "C7");
}

#[test]
fn test_position_mapping_eight_over_three() {
    let mapped: Vec<usize> = (0..8).map(|i| chord_index_for_position(i, 8, 3)).collect();
    assert_eq!(mapped, vec![0, 0, 0, 1, 1, 1, 2, 2]);
}

#[test]
fn test_pipeline_is_deterministic() {
    let (melody, rhythm) = parse_melody("E4 E4 F4 G4 | G4 F4 E4 D4 | C4 C4 D4 E4 | E4:3/2 D4:1/2 D4:2").unwrap();
    let params = HarmonyParams::default();
    let first = harmonize(&melody, &rhythm, &params).unwrap();
    let second = harmonize(&melody, &rhythm, &params).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.progression().len(), 4);
}

#[test]
fn test_voicings_stay_in_range() {
    let (melody, rhythm) = parse_melody(
        "C4 E4 G4 C5 | B3:2 D4:2 | A3 C4 E4 A4 | F4:3/2 E4:1/2 D4:2 | G3 B3 D4 F4 | C4:4",
    )
    .unwrap();

    let ranges = [(21, 45), (36, 72), (48, 84), (60, 84), (100, 127)];
    for (lowest_note, highest_note) in ranges {
        for &complexity in Complexity::ALL {
            for density in 3..=7 {
                for allow_inversions in [false, true] {
                    let params = HarmonyParams {
                        lowest_note,
                        highest_note,
                        complexity,
                        density,
                        allow_inversions,
                        prefer_closed_voicing: density % 2 == 0,
                        ..Default::default()
                    };
                    let part = harmonize(&melody, &rhythm, &params).unwrap();
                    for note in &part.harmony_notes {
                        assert!(
                            (lowest_note..=highest_note).contains(&note.pitch),
                            "pitch {} outside {}-{} ({:?})",
                            note.pitch,
                            lowest_note,
                            highest_note,
                            params
                        );
                    }
                    for voicing in &part.voicings {
                        assert!(voicing.pitches.len() <= density as usize);
                        assert!(voicing.pitches.windows(2).all(|w| w[0] < w[1]));
                        if !allow_inversions {
                            assert_eq!(voicing.pitches[0] % 12, voicing.root);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_styles_share_pitch_sets() {
    let (melody, rhythm) = parse_melody("C4 E4 G4 E4 | F4 A4 C5 A4 | G4:2 B4 D5 | C5:4").unwrap();
    let block = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();

    for &style in VoicingStyle::ALL {
        let params = HarmonyParams {
            voicing_style: style,
            ..Default::default()
        };
        let part = harmonize(&melody, &rhythm, &params).unwrap();
        assert_eq!(part.voicings, block.voicings, "{}", style);

        for (index, voicing) in part.voicings.iter().enumerate() {
            let mut struck: Vec<u8> = part
                .harmony_notes
                .iter()
                .filter(|n| n.segment == index || (n.segment < index && n.end() > part.segments[index].span.start))
                .map(|n| n.pitch)
                .collect();
            struck.sort_unstable();
            struck.dedup();
            let mut expected = voicing.pitches.clone();
            expected.dedup();
            assert_eq!(struck, expected, "{} segment {}", style, index);
        }
    }
}

#[test]
fn test_spelling_follows_bias_not_pitches() {
    let (melody, rhythm) = parse_melody("Bb4:4 F4:4").unwrap();
    let flat = HarmonyParams {
        key_center: KeyCenter::ForceMajor,
        key_center_bias: -1.0,
        ..Default::default()
    };
    let sharp = HarmonyParams {
        key_center_bias: 1.0,
        ..flat.clone()
    };

    let flat_part = harmonize(&melody, &rhythm, &flat).unwrap();
    let sharp_part = harmonize(&melody, &rhythm, &sharp).unwrap();

    assert_eq!(flat_part.key_name(), "F major");
    assert_eq!(flat_part.chord_labels.labels(), &["Bbmaj7", "Fmaj7"]);
    assert_eq!(sharp_part.chord_labels.labels(), &["A#maj7", "Fmaj7"]);
    assert_eq!(flat_part.harmony_notes, sharp_part.harmony_notes);
    assert_eq!(flat_part.progression(), sharp_part.progression());
}

#[test]
fn test_triads_with_root_doubling() {
    let (melody, rhythm) = quarters(&[67, 71, 74, 67]);
    let params = HarmonyParams {
        key_center: KeyCenter::ForceMajor,
        complexity: Complexity::Triads,
        doubling: Doubling::Root,
        density: 5,
        ..Default::default()
    };
    let part = harmonize(&melody, &rhythm, &params).unwrap();
    assert_eq!(part.progression().qualities(), &[ChordQuality::Major]);
    let roots = part.voicings[0].pitches.iter().filter(|&&p| p % 12 == 7).count();
    assert_eq!(roots, 3);
}

#[test]
fn test_playback_projection() {
    let (melody, rhythm) = parse_melody("C4 _ E4:1/2 G4:1/2 C5:2").unwrap();
    let params = HarmonyParams {
        voicing_style: VoicingStyle::Arpeggiated,
        ..Default::default()
    };
    let part = harmonize(&melody, &rhythm, &params).unwrap();
    let parts = to_playback_parts(&part);

    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0].melody, melody);
    assert_eq!(parts[0].rhythm, rhythm);
    for p in &parts[1..] {
        assert_eq!(p.total_duration(), beats(5));
        assert!(p.rhythm.iter().all(|d| *d > beats(0)));
    }
    // Arpeggio over 5 beats with 4 voices: the bass plays first for 5/4
    assert_eq!(parts[1].rhythm[0], beats_ratio(5, 4));
}

#[test]
fn test_all_rest_melody_is_harmonized_in_c() {
    let melody = vec![MelodyElement::Rest; 4];
    let rhythm = vec![beats(1); 4];
    let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
    assert_eq!(part.key().detected_key, 0);
    assert_eq!(part.key().confidence, 0.0);
    assert_eq!(part.progression().roots(), &[0]);
}
