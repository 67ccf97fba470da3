//! Timeline segmentation
//!
//! A segment is a contiguous run of melody positions sounding under one
//! chord. Generation partitions by elapsed beats; edited progressions are
//! laid back onto the melody by position count, the same mapping used when
//! labels are expanded on save.

use crate::types::time::{beats, onsets, total, Beats, Span};
use num_traits::Zero;
use std::ops::Range;

/// Target harmonic rhythm: one chord per 4/4 bar
pub const TARGET_SEGMENT_BEATS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Index into the progression
    pub chord: usize,
    /// Melody positions covered by this segment
    pub positions: Range<usize>,
    pub span: Span,
}

impl Segment {
    pub fn duration(&self) -> Beats {
        self.span.duration()
    }
}

/// Number of segments for a melody of this length and duration
pub fn segment_count(rhythm: &[Beats]) -> usize {
    let total = total(rhythm);
    let target = beats(TARGET_SEGMENT_BEATS);
    let count = usize::try_from((total / target).round().to_integer()).unwrap_or(1);
    count.clamp(1, rhythm.len().max(1))
}

/// Partition positions into roughly equal stretches of elapsed time.
///
/// Each position joins the segment its onset falls in; segments a long note
/// skips over collapse, so the result may be shorter than `segment_count`.
pub fn segment_by_duration(rhythm: &[Beats]) -> Vec<Segment> {
    let count = segment_count(rhythm);
    let total = total(rhythm);
    let starts = onsets(rhythm);

    let bucket = |onset: Beats| -> usize {
        if total.is_zero() {
            return 0;
        }
        // floor(onset * count / total), widened so the cross products cannot overflow
        let scaled = (*onset.numer() as i128 * count as i128 * *total.denom() as i128)
            / (*onset.denom() as i128 * *total.numer() as i128);
        usize::try_from(scaled).unwrap_or(0).min(count - 1)
    };

    let buckets: Vec<usize> = starts.iter().map(|&t| bucket(t)).collect();
    group_runs(rhythm, &starts, &buckets)
}

/// Which chord sounds at melody position `i` when `chord_count` chords are
/// spread over `len` positions: `min(i / ceil(len / chord_count), chord_count - 1)`
pub fn chord_index_for_position(i: usize, len: usize, chord_count: usize) -> usize {
    let chord_count = chord_count.max(1);
    let interval = len.div_ceil(chord_count).max(1);
    (i / interval).min(chord_count - 1)
}

/// Lay `chord_count` chords onto the melody by position. Chords that receive
/// no position produce no segment.
pub fn segment_by_position(rhythm: &[Beats], chord_count: usize) -> Vec<Segment> {
    let starts = onsets(rhythm);
    let chords: Vec<usize> = (0..rhythm.len())
        .map(|i| chord_index_for_position(i, rhythm.len(), chord_count))
        .collect();
    group_runs(rhythm, &starts, &chords)
}

/// Collapse consecutive positions sharing a key into segments
fn group_runs(rhythm: &[Beats], starts: &[Beats], keys: &[usize]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut run_start = 0;

    for i in 0..keys.len() {
        let last_of_run = i + 1 == keys.len() || keys[i + 1] != keys[i];
        if !last_of_run {
            continue;
        }
        let end = starts[i] + rhythm[i];
        segments.push(Segment {
            chord: keys[i],
            positions: run_start..i + 1,
            span: Span::new(starts[run_start], end),
        });
        run_start = i + 1;
    }
    segments
}

/// Renumber duration-based segments so chord indices are dense (0..len)
pub fn renumber(mut segments: Vec<Segment>) -> Vec<Segment> {
    for (index, segment) in segments.iter_mut().enumerate() {
        segment.chord = index;
    }
    segments
}
