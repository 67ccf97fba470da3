// harmonist-core/src/types/roman_numeral.rs
use crate::types::chord::ChordQuality;
use crate::types::note::{pitch_class, PitchClass};
use std::fmt;

/// Roman numeral analysis of one progression entry relative to a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomanNumeral {
    pub degree: ScaleDegree,
    pub accidental: Option<Accidental>,
    pub quality: ChordQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDegree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Flat,
    Sharp,
}

impl RomanNumeral {
    /// Analyze a (root, quality) pair in the context of a key
    pub fn from_chord(key: PitchClass, minor: bool, root: PitchClass, quality: ChordQuality) -> Self {
        let semitones = pitch_class(root as i32 - key as i32);
        let (degree, accidental) = if minor {
            Self::minor_degree(semitones)
        } else {
            Self::major_degree(semitones)
        };
        RomanNumeral {
            degree,
            accidental,
            quality,
        }
    }

    fn major_degree(semitones: u8) -> (ScaleDegree, Option<Accidental>) {
        use Accidental::*;
        use ScaleDegree::*;
        match semitones {
            0 => (I, None),
            1 => (II, Some(Flat)),
            2 => (II, None),
            3 => (III, Some(Flat)),
            4 => (III, None),
            5 => (IV, None),
            6 => (IV, Some(Sharp)),
            7 => (V, None),
            8 => (VI, Some(Flat)),
            9 => (VI, None),
            10 => (VII, Some(Flat)),
            _ => (VII, None),
        }
    }

    /// Degrees relative to the natural minor scale
    fn minor_degree(semitones: u8) -> (ScaleDegree, Option<Accidental>) {
        use Accidental::*;
        use ScaleDegree::*;
        match semitones {
            0 => (I, None),
            1 => (II, Some(Flat)),
            2 => (II, None),
            3 => (III, None),
            4 => (III, Some(Sharp)),
            5 => (IV, None),
            6 => (IV, Some(Sharp)),
            7 => (V, None),
            8 => (VI, None),
            9 => (VI, Some(Sharp)),
            10 => (VII, None),
            _ => (VII, Some(Sharp)),
        }
    }

    /// Lower-case numerals for chords built on a minor third
    fn is_lower_case(&self) -> bool {
        self.quality.third() == 3
    }

    fn figure(&self) -> &'static str {
        use ChordQuality::*;
        match self.quality {
            Major | Minor => "",
            Diminished => "°",
            Augmented => "+",
            Sus2 => "sus2",
            Sus4 => "sus4",
            Major6 | Minor6 => "6",
            Add9 | MinorAdd9 => "add9",
            Dominant7 | Minor7 => "7",
            Major7 | MinorMajor7 => "maj7",
            Diminished7 => "°7",
            HalfDiminished7 => "ø7",
            Augmented7 => "+7",
            Dominant7Sus4 => "7sus4",
            Dominant9 | Minor9 => "9",
            Major9 => "maj9",
            Dominant11 | Minor11 => "11",
            Dominant13 => "13",
            Dominant7Flat9 => "7b9",
            Dominant7Sharp9 => "7#9",
            Dominant7Flat5 => "7b5",
            Dominant7Sharp11 => "7#11",
            Altered => "7alt",
        }
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScaleDegree::I => "I",
            ScaleDegree::II => "II",
            ScaleDegree::III => "III",
            ScaleDegree::IV => "IV",
            ScaleDegree::V => "V",
            ScaleDegree::VI => "VI",
            ScaleDegree::VII => "VII",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accidental {
            Some(Accidental::Flat) => write!(f, "b")?,
            Some(Accidental::Sharp) => write!(f, "#")?,
            None => {}
        }
        let numeral = self.degree.to_string();
        if self.is_lower_case() {
            write!(f, "{}", numeral.to_lowercase())?;
        } else {
            write!(f, "{}", numeral)?;
        }
        write!(f, "{}", self.figure())
    }
}

/// Analyze an entire progression for Roman numerals
pub fn analyze_progression(
    key: PitchClass,
    minor: bool,
    chords: impl IntoIterator<Item = (PitchClass, ChordQuality)>,
) -> Vec<RomanNumeral> {
    chords
        .into_iter()
        .map(|(root, quality)| RomanNumeral::from_chord(key, minor, root, quality))
        .collect()
}
