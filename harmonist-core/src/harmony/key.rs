//! Key detection
//!
//! Krumhansl-Schmuckler key finding: a duration-weighted pitch-class
//! histogram is correlated against the major and minor reference profiles
//! rotated to each of the 12 roots. Forced key centers skip the
//! correlation and take the melodic final as tonic.

use crate::types::note::{pitch_class, Melody, PitchClass};
use crate::types::params::KeyCenter;
use crate::types::time::{to_f64, Beats};
use std::fmt;
use tracing::debug;

/// Krumhansl-Kessler major key profile
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Correlation gap at which confidence reaches one half
const HALF_CONFIDENCE_GAP: f64 = 0.05;

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const HARMONIC_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyQuality {
    Major,
    Minor,
}

impl fmt::Display for KeyQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyQuality::Major => write!(f, "major"),
            KeyQuality::Minor => write!(f, "minor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyAnalysis {
    pub detected_key: PitchClass,
    pub key_quality: KeyQuality,
    /// 0 when the two best candidates tie, approaching 1 as the margin grows
    pub confidence: f64,
}

impl Default for KeyAnalysis {
    /// C major with no confidence
    fn default() -> Self {
        Self {
            detected_key: 0,
            key_quality: KeyQuality::Major,
            confidence: 0.0,
        }
    }
}

impl KeyAnalysis {
    pub fn is_minor(&self) -> bool {
        self.key_quality == KeyQuality::Minor
    }

    /// Diatonic pitch classes of the key (natural minor for minor keys)
    pub fn scale(&self) -> [PitchClass; 7] {
        let steps = match self.key_quality {
            KeyQuality::Major => &MAJOR_SCALE,
            KeyQuality::Minor => &NATURAL_MINOR_SCALE,
        };
        steps.map(|s| pitch_class(self.detected_key as i32 + s as i32))
    }

    /// Scale used to judge chords built on `root`: minor keys borrow the
    /// raised seventh for the dominant and leading-tone degrees
    pub fn scale_for_root(&self, root: PitchClass) -> [PitchClass; 7] {
        let degree = pitch_class(root as i32 - self.detected_key as i32);
        if self.is_minor() && (degree == 7 || degree == 11) {
            HARMONIC_MINOR_SCALE.map(|s| pitch_class(self.detected_key as i32 + s as i32))
        } else {
            self.scale()
        }
    }

    pub fn is_diatonic(&self, pc: PitchClass) -> bool {
        self.scale().contains(&pc)
    }
}

/// Duration-weighted pitch-class histogram; rests contribute nothing
pub fn pitch_class_histogram(melody: &Melody, rhythm: &[Beats]) -> [f64; 12] {
    let mut histogram = [0.0_f64; 12];
    for (element, duration) in melody.iter().zip(rhythm) {
        if let Some(pc) = element.pitch_class() {
            histogram[pc as usize] += to_f64(*duration);
        }
    }
    histogram
}

/// Infer the tonal center of a melody
pub fn detect_key(melody: &Melody, rhythm: &[Beats], key_center: KeyCenter) -> KeyAnalysis {
    let histogram = pitch_class_histogram(melody, rhythm);
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        debug!("no sounding notes, defaulting to C major");
        return KeyAnalysis::default();
    }

    let analysis = match key_center {
        KeyCenter::Automatic => correlate(&histogram),
        forced => forced_key(melody, &histogram, forced),
    };
    debug!(
        key = analysis.detected_key,
        quality = %analysis.key_quality,
        confidence = analysis.confidence,
        "detected key"
    );
    analysis
}

/// Score all 24 keys and keep the best
fn correlate(histogram: &[f64; 12]) -> KeyAnalysis {
    let mut best: Option<(PitchClass, KeyQuality, f64)> = None;
    let mut second = f64::NEG_INFINITY;

    for root in 0..12u8 {
        // Rotate histogram so root = index 0
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = histogram[(i + root as usize) % 12];
        }

        for (quality, profile) in [
            (KeyQuality::Major, &MAJOR_PROFILE),
            (KeyQuality::Minor, &MINOR_PROFILE),
        ] {
            let score = pearson(&rotated, profile);
            match best {
                Some((_, _, best_score)) if score <= best_score => {
                    second = second.max(score);
                }
                Some((_, _, best_score)) => {
                    second = best_score;
                    best = Some((root, quality, score));
                }
                None => best = Some((root, quality, score)),
            }
        }
    }

    let (detected_key, key_quality, best_score) = best.unwrap_or((0, KeyQuality::Major, 0.0));
    let gap = (best_score - second).max(0.0);
    KeyAnalysis {
        detected_key,
        key_quality,
        confidence: (gap / (gap + HALF_CONFIDENCE_GAP)).clamp(0.0, 1.0),
    }
}

/// Tonic from the melodic final; quality forced or read from the final's third
fn forced_key(melody: &Melody, histogram: &[f64; 12], key_center: KeyCenter) -> KeyAnalysis {
    let tonic = melody
        .iter()
        .rev()
        .find_map(|e| e.pitch_class())
        .unwrap_or(0);

    let key_quality = match key_center {
        KeyCenter::ForceMinor => KeyQuality::Minor,
        KeyCenter::Modal => {
            let major_third = histogram[pitch_class(tonic as i32 + 4) as usize];
            let minor_third = histogram[pitch_class(tonic as i32 + 3) as usize];
            if minor_third > major_third {
                KeyQuality::Minor
            } else {
                KeyQuality::Major
            }
        }
        _ => KeyQuality::Major,
    };

    KeyAnalysis {
        detected_key: tonic,
        key_quality,
        confidence: 1.0,
    }
}

/// Pearson correlation coefficient between two 12-element arrays
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}
