//! Voicing realization
//!
//! Turns each segment's (root, quality) into concrete MIDI pitches inside the
//! configured range, then articulates those pitches over the segment's time
//! span according to the voicing style.

use crate::harmony::segment::Segment;
use crate::types::chord::ChordQuality;
use crate::types::note::{pitch_class, PitchClass};
use crate::types::params::{Doubling, HarmonyParams, VoicingStyle};
use crate::types::progression::CompactProgression;
use crate::types::time::{beats, beats_ratio, Beats};
use num_traits::Zero;
use tracing::{debug, trace};

/// One sounding pitch of the accompaniment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonyNote {
    pub pitch: u8,
    pub onset: Beats,
    pub duration: Beats,
    /// Index of the pitch within its ascending voicing (0 = bass)
    pub voice: usize,
    /// Segment in which the note was struck
    pub segment: usize,
}

impl HarmonyNote {
    pub fn end(&self) -> Beats {
        self.onset + self.duration
    }
}

/// Concrete pitches for one segment, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Voicing {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub pitches: Vec<u8>,
}

impl Voicing {
    pub fn bass(&self) -> Option<u8> {
        self.pitches.first().copied()
    }
}

/// Voicings and their articulated notes
#[derive(Debug, Clone, PartialEq)]
pub struct Realization {
    /// One voicing per segment
    pub voicings: Vec<Voicing>,
    /// Sorted by onset, then pitch
    pub notes: Vec<HarmonyNote>,
}

/// Voice every segment and articulate the result
pub fn realize(
    progression: &CompactProgression,
    segments: &[Segment],
    params: &HarmonyParams,
) -> Realization {
    let voicings = voice_progression(progression, segments, params);
    let notes = articulate(&voicings, segments, params.voicing_style);
    debug!(
        segments = segments.len(),
        notes = notes.len(),
        style = %params.voicing_style,
        "realized voicings"
    );
    Realization { voicings, notes }
}

/// Voice each segment's chord, tracking the bass line for inversions
pub fn voice_progression(
    progression: &CompactProgression,
    segments: &[Segment],
    params: &HarmonyParams,
) -> Vec<Voicing> {
    let mut previous_bass = None;
    segments
        .iter()
        .filter_map(|segment| progression.get(segment.chord))
        .map(|(root, quality)| {
            let voicing = voice_chord(root, quality, params, previous_bass);
            previous_bass = voicing.bass();
            voicing
        })
        .collect()
}

/// Chord-tone indices (into `intervals()`) that sound, with repeats for doubled tones
fn select_tones(quality: ChordQuality, density: usize, doubling: Doubling) -> Vec<usize> {
    let count = quality.tone_count();
    if density <= count {
        // Root, third, seventh, top extension, inner extensions; the fifth goes first
        let mut priority = vec![0, 1];
        if count > 3 {
            priority.push(3);
        }
        if count > 4 {
            priority.push(count - 1);
            priority.extend(4..count - 1);
        }
        priority.push(2);
        let mut kept: Vec<usize> = priority.into_iter().take(density).collect();
        kept.sort_unstable();
        return kept;
    }

    let mut tones: Vec<usize> = (0..count).collect();
    for extra in 0..density - count {
        tones.push(match doubling {
            Doubling::Root => 0,
            Doubling::Third => 1,
            Doubling::Fifth => 2,
            Doubling::Balanced => [0, 2, 1][extra % 3],
        });
    }
    tones
}

/// Lowest pitch at or above `floor` with the given pitch class
fn lowest_at_or_above(floor: u8, pc: PitchClass) -> u8 {
    floor + pitch_class(pc as i32 - floor as i32)
}

/// Smallest pitch strictly above `cursor` with the given pitch class
fn next_above(cursor: u8, pc: PitchClass) -> i32 {
    let step = pitch_class(pc as i32 - cursor as i32);
    cursor as i32 + if step == 0 { 12 } else { step as i32 }
}

/// Highest pitch at or below `ceiling` with the given pitch class
fn highest_at_or_below(ceiling: u8, pc: PitchClass) -> u8 {
    ceiling.saturating_sub(pitch_class(ceiling as i32 - pc as i32))
}

/// Highest unused slot of `pc` above `bass` and at or below `ceiling`
fn free_slot(taken: &[u8], bass: u8, ceiling: u8, pc: PitchClass) -> Option<u8> {
    let top = highest_at_or_below(ceiling, pc);
    (0..=top / 12)
        .map(|octaves| top - 12 * octaves)
        .take_while(|&pitch| pitch > bass)
        .find(|pitch| !taken.contains(pitch))
}

/// Bass pitch class: the root, or with inversions the chord tone whose
/// lowest placement moves least from the previous bass
fn choose_bass(
    root: PitchClass,
    tones: &[PitchClass],
    params: &HarmonyParams,
    previous_bass: Option<u8>,
) -> PitchClass {
    let Some(previous) = previous_bass.filter(|_| params.allow_inversions) else {
        return root;
    };
    tones
        .iter()
        .copied()
        .min_by_key(|&pc| {
            let pitch = lowest_at_or_above(params.lowest_note, pc);
            ((pitch as i32 - previous as i32).abs(), pc != root, pitch)
        })
        .unwrap_or(root)
}

/// Realize one chord as ascending MIDI pitches inside the configured range
pub fn voice_chord(
    root: PitchClass,
    quality: ChordQuality,
    params: &HarmonyParams,
    previous_bass: Option<u8>,
) -> Voicing {
    let chord_pcs = quality.pitch_classes(root);
    let selected = select_tones(quality, params.density as usize, params.doubling);
    let selected_pcs: Vec<PitchClass> = selected.iter().map(|&i| chord_pcs[i]).collect();

    let mut distinct = selected_pcs.clone();
    distinct.sort_unstable();
    distinct.dedup();
    let bass_pc = choose_bass(root, &distinct, params, previous_bass);
    let bass = lowest_at_or_above(params.lowest_note, bass_pc);

    // Remaining tones in layers: first copy of each tone, then second copies, ...
    let mut remaining = selected_pcs;
    if let Some(at) = remaining.iter().position(|&pc| pc == bass_pc) {
        remaining.remove(at);
    }
    let above_bass = |pc: PitchClass| match pitch_class(pc as i32 - bass_pc as i32) {
        0 => 12,
        interval => interval,
    };
    let mut layered: Vec<(usize, u8, PitchClass)> = Vec::with_capacity(remaining.len());
    let mut seen: Vec<PitchClass> = Vec::new();
    for &pc in &remaining {
        let layer = seen.iter().filter(|&&s| s == pc).count();
        seen.push(pc);
        layered.push((layer, above_bass(pc), pc));
    }
    layered.sort_unstable();

    let mut pitches = vec![bass];
    let mut cursor = bass;
    for (_, _, pc) in layered {
        let candidate = next_above(cursor, pc);
        let pitch = if candidate <= params.highest_note as i32 {
            Some(candidate as u8)
        } else {
            // Fold down, trading to another chord tone when every slot of this one is taken
            free_slot(&pitches, bass, params.highest_note, pc).or_else(|| {
                distinct
                    .iter()
                    .filter_map(|&other| free_slot(&pitches, bass, params.highest_note, other))
                    .max()
            })
        };
        match pitch {
            Some(pitch) => {
                cursor = cursor.max(pitch);
                pitches.push(pitch);
            }
            None => trace!(pc, "no free slot in range, tone dropped"),
        }
    }

    if !params.prefer_closed_voicing {
        spread(&mut pitches, params.highest_note);
    }
    pitches.sort_unstable();
    trace!(root, quality = %quality, ?pitches, "voiced chord");

    Voicing {
        root,
        quality,
        pitches,
    }
}

/// Open position: raise every other upper voice an octave where it fits
fn spread(pitches: &mut [u8], highest: u8) {
    pitches.sort_unstable();
    for i in (1..pitches.len()).step_by(2) {
        let raised = pitches[i] as u16 + 12;
        if raised <= highest as u16 && !pitches.contains(&(raised as u8)) {
            pitches[i] = raised as u8;
        }
    }
}

/// One strike of a group of voices within a segment, relative to its start
struct Strike {
    offset: Beats,
    length: Beats,
    voices: Vec<usize>,
}

/// Nominal step, shortened so at least one full pattern cycle fits
fn fitted_step(duration: Beats, nominal: Beats, steps_per_cycle: usize) -> Beats {
    let cycle = nominal * Beats::from_integer(steps_per_cycle as i64);
    if cycle <= duration {
        nominal
    } else {
        duration / Beats::from_integer(steps_per_cycle as i64)
    }
}

/// Repeat a pattern of voice groups every `step` until the segment ends
fn cycle(duration: Beats, step: Beats, pattern: &[Vec<usize>]) -> Vec<Strike> {
    let mut strikes = Vec::new();
    let mut offset = Beats::zero();
    let mut k = 0;
    while offset < duration {
        strikes.push(Strike {
            offset,
            length: step.min(duration - offset),
            voices: pattern[k % pattern.len()].clone(),
        });
        offset += step;
        k += 1;
    }
    strikes
}

/// Strike pattern of a style for a voicing of `n` voices
fn strikes(style: VoicingStyle, n: usize, duration: Beats) -> Vec<Strike> {
    let all: Vec<usize> = (0..n).collect();
    let upper: Vec<usize> = (1..n).collect();
    let half = duration / beats(2);

    match style {
        VoicingStyle::Block | VoicingStyle::Sustained => vec![Strike {
            offset: Beats::zero(),
            length: duration,
            voices: all,
        }],
        VoicingStyle::Broken => vec![
            Strike {
                offset: Beats::zero(),
                length: half,
                voices: vec![0],
            },
            Strike {
                offset: half,
                length: duration - half,
                voices: upper,
            },
        ],
        VoicingStyle::Arpeggiated => {
            let step = duration / Beats::from_integer(n as i64);
            (0..n)
                .map(|v| Strike {
                    offset: step * Beats::from_integer(v as i64),
                    length: step,
                    voices: vec![v],
                })
                .collect()
        }
        VoicingStyle::Alberti => {
            let step = fitted_step(duration, beats_ratio(1, 2), 4);
            let inner: Vec<usize> = (1..n - 1).collect();
            cycle(duration, step, &[vec![0], vec![n - 1], inner, vec![n - 1]])
        }
        VoicingStyle::Waltz => {
            let step = fitted_step(duration, beats(1), 3);
            cycle(duration, step, &[vec![0], upper.clone(), upper])
        }
        VoicingStyle::Rolling => {
            let stagger = fitted_step(duration, beats_ratio(1, 8), n);
            (0..n)
                .map(|v| {
                    let offset = stagger * Beats::from_integer(v as i64);
                    Strike {
                        offset,
                        length: duration - offset,
                        voices: vec![v],
                    }
                })
                .collect()
        }
        VoicingStyle::Stride => {
            let step = fitted_step(duration, beats(1), 2);
            cycle(duration, step, &[vec![0], upper])
        }
        VoicingStyle::Tremolo => {
            let step = fitted_step(duration, beats_ratio(1, 4), 2);
            let split = n / 2;
            cycle(duration, step, &[(0..split).collect(), (split..n).collect()])
        }
        VoicingStyle::Staccato => {
            let step = fitted_step(duration, beats(1), 1);
            cycle(duration, step, &[all])
                .into_iter()
                .map(|s| Strike {
                    length: s.length / beats(2),
                    ..s
                })
                .collect()
        }
    }
}

/// Spread each segment's voicing over its span
pub fn articulate(voicings: &[Voicing], segments: &[Segment], style: VoicingStyle) -> Vec<HarmonyNote> {
    let mut notes: Vec<HarmonyNote> = Vec::new();
    // Per voice: index of the note that may be tied into the next segment
    let mut held: Vec<Option<usize>> = Vec::new();

    for (index, (segment, voicing)) in segments.iter().zip(voicings).enumerate() {
        let start = segment.span.start;
        let duration = segment.duration();
        let n = voicing.pitches.len();

        if style == VoicingStyle::Sustained {
            held.resize(held.len().max(n), None);
            for (voice, &pitch) in voicing.pitches.iter().enumerate() {
                let tied = held[voice].filter(|&i| notes[i].pitch == pitch && notes[i].end() == start);
                match tied {
                    Some(i) => notes[i].duration += duration,
                    None => {
                        held[voice] = Some(notes.len());
                        notes.push(HarmonyNote {
                            pitch,
                            onset: start,
                            duration,
                            voice,
                            segment: index,
                        });
                    }
                }
            }
            for slot in held.iter_mut().skip(n) {
                *slot = None;
            }
            continue;
        }

        for strike in strikes(style, n, duration) {
            for voice in strike.voices {
                notes.push(HarmonyNote {
                    pitch: voicing.pitches[voice],
                    onset: start + strike.offset,
                    duration: strike.length,
                    voice,
                    segment: index,
                });
            }
        }
    }

    notes.sort_by(|a, b| a.onset.cmp(&b.onset).then(a.pitch.cmp(&b.pitch)));
    notes
}
