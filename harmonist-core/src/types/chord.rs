//! Chord vocabulary
//!
//! Every chord quality the harmonizer knows, each carrying its interval set
//! (semitones above the root, in stacking order), its display suffix and
//! the complexity tier that first makes it eligible for generation.

use crate::types::note::{pitch_class, PitchClass};
use crate::types::params::Complexity;
use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChordQuality {
    // Triads
    Major,
    Minor,
    Diminished,
    Augmented,
    // Suspensions
    Sus2,
    Sus4,
    // Sixths and added tones
    Major6,
    Minor6,
    Add9,
    MinorAdd9,
    // Sevenths
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    Diminished7,
    HalfDiminished7,
    Augmented7,
    Dominant7Sus4,
    // Ninths
    Dominant9,
    Major9,
    Minor9,
    // Elevenths and thirteenths
    Dominant11,
    Minor11,
    Dominant13,
    // Altered dominants
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant7Flat5,
    Dominant7Sharp11,
    Altered,
}

struct QualityInfo {
    symbol: &'static str,
    suffix: &'static str,
    intervals: &'static [u8],
    tier: Complexity,
}

impl ChordQuality {
    /// The whole vocabulary in declaration order
    pub const ALL: [ChordQuality; 29] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
        ChordQuality::Major6,
        ChordQuality::Minor6,
        ChordQuality::Add9,
        ChordQuality::MinorAdd9,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::MinorMajor7,
        ChordQuality::Diminished7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Augmented7,
        ChordQuality::Dominant7Sus4,
        ChordQuality::Dominant9,
        ChordQuality::Major9,
        ChordQuality::Minor9,
        ChordQuality::Dominant11,
        ChordQuality::Minor11,
        ChordQuality::Dominant13,
        ChordQuality::Dominant7Flat9,
        ChordQuality::Dominant7Sharp9,
        ChordQuality::Dominant7Flat5,
        ChordQuality::Dominant7Sharp11,
        ChordQuality::Altered,
    ];

    fn info(self) -> QualityInfo {
        use ChordQuality::*;
        use Complexity as C;
        let (symbol, suffix, intervals, tier): (_, _, &'static [u8], _) = match self {
            Major => ("M", "", &[0, 4, 7], C::Triads),
            Minor => ("m", "m", &[0, 3, 7], C::Triads),
            Diminished => ("dim", "dim", &[0, 3, 6], C::Triads),
            Augmented => ("aug", "aug", &[0, 4, 8], C::Suspended),
            Sus2 => ("sus2", "sus2", &[0, 2, 7], C::Suspended),
            Sus4 => ("sus4", "sus4", &[0, 5, 7], C::Suspended),
            Major6 => ("6", "6", &[0, 4, 7, 9], C::Sixths),
            Minor6 => ("m6", "m6", &[0, 3, 7, 9], C::Sixths),
            Add9 => ("add9", "add9", &[0, 4, 7, 14], C::Sixths),
            MinorAdd9 => ("madd9", "m(add9)", &[0, 3, 7, 14], C::Sixths),
            Dominant7 => ("dom7", "7", &[0, 4, 7, 10], C::Seventh),
            Major7 => ("maj7", "maj7", &[0, 4, 7, 11], C::Seventh),
            Minor7 => ("m7", "m7", &[0, 3, 7, 10], C::Seventh),
            MinorMajor7 => ("mMaj7", "m(maj7)", &[0, 3, 7, 11], C::Seventh),
            Diminished7 => ("dim7", "dim7", &[0, 3, 6, 9], C::Seventh),
            HalfDiminished7 => ("m7b5", "m7b5", &[0, 3, 6, 10], C::Seventh),
            Augmented7 => ("aug7", "aug7", &[0, 4, 8, 10], C::Seventh),
            Dominant7Sus4 => ("7sus4", "7sus4", &[0, 5, 7, 10], C::Seventh),
            Dominant9 => ("dom9", "9", &[0, 4, 7, 10, 14], C::Ninth),
            Major9 => ("maj9", "maj9", &[0, 4, 7, 11, 14], C::Ninth),
            Minor9 => ("m9", "m9", &[0, 3, 7, 10, 14], C::Ninth),
            Dominant11 => ("dom11", "11", &[0, 4, 7, 10, 14, 17], C::Extended),
            Minor11 => ("m11", "m11", &[0, 3, 7, 10, 14, 17], C::Extended),
            Dominant13 => ("dom13", "13", &[0, 4, 7, 10, 14, 21], C::Extended),
            Dominant7Flat9 => ("7b9", "7b9", &[0, 4, 7, 10, 13], C::Altered),
            Dominant7Sharp9 => ("7#9", "7#9", &[0, 4, 7, 10, 15], C::Altered),
            Dominant7Flat5 => ("7b5", "7b5", &[0, 4, 6, 10], C::Altered),
            Dominant7Sharp11 => ("7#11", "7#11", &[0, 4, 7, 10, 18], C::Altered),
            Altered => ("7alt", "7alt", &[0, 4, 8, 10, 13, 15], C::Altered),
        };
        QualityInfo {
            symbol,
            suffix,
            intervals,
            tier,
        }
    }

    /// Semitones above the root, in stacking order (root, third, fifth, ...)
    pub fn intervals(self) -> &'static [u8] {
        self.info().intervals
    }

    /// Short identifier used in progressions and on the command line (`M`, `m`, `dom7`)
    pub fn symbol(self) -> &'static str {
        self.info().symbol
    }

    /// Suffix appended to the root name in a chord label (`""`, `"m"`, `"7"`)
    pub fn suffix(self) -> &'static str {
        self.info().suffix
    }

    /// Lowest complexity level at which this quality may be generated
    pub fn tier(self) -> Complexity {
        self.info().tier
    }

    /// Number of distinct chord tones
    pub fn tone_count(self) -> usize {
        self.intervals().len()
    }

    /// Absolute pitch classes of this quality built on `root`, in stacking order
    pub fn pitch_classes(self, root: PitchClass) -> Vec<PitchClass> {
        self.intervals()
            .iter()
            .map(|&i| pitch_class(root as i32 + i as i32))
            .collect()
    }

    /// Interval of the third (or the suspension replacing it)
    pub fn third(self) -> u8 {
        self.intervals()[1]
    }

    /// Dominant-function qualities with chromatic alterations
    pub fn is_altered_dominant(self) -> bool {
        self.tier() == Complexity::Altered
    }

    /// Qualities eligible at a given complexity
    pub fn eligible(complexity: Complexity) -> impl Iterator<Item = ChordQuality> {
        Self::ALL.into_iter().filter(move |q| q.tier() <= complexity)
    }
}

impl FromStr for ChordQuality {
    type Err = anyhow::Error;

    /// Accepts the symbol (`dom7`), the label suffix (`7`), or the variant name
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(ChordQuality::Major);
        }
        // Symbols are case-sensitive: `M` is major, `m` is minor
        if let Some(q) = Self::ALL.iter().find(|q| q.symbol() == s) {
            return Ok(*q);
        }
        if let Some(q) = Self::ALL.iter().find(|q| !q.suffix().is_empty() && q.suffix() == s) {
            return Ok(*q);
        }
        Self::ALL
            .iter()
            .find(|q| format!("{:?}", q).eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| anyhow!("Unknown chord quality: {}", s))
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
