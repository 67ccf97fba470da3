//! Rational timing types for melody durations
//!
//! Rhythm weights are kept as exact rationals so segment boundaries and
//! articulation sub-onsets never drift, no matter how a beat is subdivided.

use num_integer::Integer;
use num_rational::Ratio;
use num_traits::Zero;

/// Exact duration or time point in beats
pub type Beats = Ratio<i64>;

/// Largest common denominator a rhythm may use
pub const MAX_SUBDIVISION: i64 = 1 << 24;

/// Longest timeline, counted in units of the common denominator
pub const MAX_TICKS: i64 = 1 << 32;

/// A span `[start, end)` on the beat timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: Beats,
    pub end: Beats,
}

impl Span {
    pub fn new(start: Beats, end: Beats) -> Self {
        Self { start, end }
    }

    /// Duration of this span
    pub fn duration(&self) -> Beats {
        self.end - self.start
    }

    /// Check if a time point falls within this span `[start, end)`
    pub fn contains(&self, t: Beats) -> bool {
        t >= self.start && t < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Helper to create a duration n/d
#[inline]
pub fn beats_ratio(n: i64, d: i64) -> Beats {
    Ratio::new(n, d)
}

/// Create a duration of whole beats
#[inline]
pub fn beats(n: i64) -> Beats {
    Ratio::from_integer(n)
}

/// Convert to f64 for display and export consumers
#[inline]
pub fn to_f64(t: Beats) -> f64 {
    *t.numer() as f64 / *t.denom() as f64
}

/// Sum of a rhythm slice
pub fn total(rhythm: &[Beats]) -> Beats {
    rhythm.iter().fold(Beats::zero(), |acc, d| acc + d)
}

/// Onset of every position: the running sum of the preceding durations
pub fn onsets(rhythm: &[Beats]) -> Vec<Beats> {
    let mut at = Beats::zero();
    rhythm
        .iter()
        .map(|d| {
            let onset = at;
            at += d;
            onset
        })
        .collect()
}

/// First position at which the rhythm no longer fits an exact timeline:
/// the common denominator of the durations so far exceeds
/// `MAX_SUBDIVISION`, or their sum exceeds `MAX_TICKS` in those units.
/// Within these bounds every onset, sum and split of the timeline stays
/// far from `i64` overflow.
pub fn timeline_overflow(rhythm: &[Beats]) -> Option<usize> {
    let mut denom: i64 = 1;
    let mut ticks: i64 = 0;
    for (i, d) in rhythm.iter().enumerate() {
        let fits = (|| {
            let (numer, d_denom) = (*d.numer(), *d.denom());
            let common = (denom / denom.gcd(&d_denom)).checked_mul(d_denom)?;
            if common > MAX_SUBDIVISION {
                return None;
            }
            let scaled = ticks.checked_mul(common / denom)?;
            let added = numer.checked_mul(common / d_denom)?;
            let next = scaled.checked_add(added)?;
            (next.abs() <= MAX_TICKS).then_some((common, next))
        })();
        match fits {
            Some((common, next)) => {
                denom = common;
                ticks = next;
            }
            None => return Some(i),
        }
    }
    None
}
