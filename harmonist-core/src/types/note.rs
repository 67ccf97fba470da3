use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// Chromatic pitch class (0-11)
/// 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
pub type PitchClass = u8;

/// Highest MIDI note number
pub const MAX_PITCH: u8 = 127;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Major keys conventionally written with flats (F, Bb, Eb, Ab, Db, Gb)
const FLAT_MAJOR_KEYS: [PitchClass; 6] = [5, 10, 3, 8, 1, 6];

/// Reduce any semitone value to a pitch class
#[inline]
pub fn pitch_class(semitones: i32) -> PitchClass {
    semitones.rem_euclid(12) as PitchClass
}

/// How accidentals are written when a pitch class is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Spelling {
    #[default]
    Sharps,
    Flats,
    /// Follow the key signature of the detected key
    KeyConventional,
}

impl Spelling {
    /// Map a key-center bias (-1..1) to a spelling preference.
    /// Negative leans flat, positive leans sharp, zero follows the key.
    pub fn from_bias(bias: f64) -> Self {
        if bias < 0.0 {
            Spelling::Flats
        } else if bias > 0.0 {
            Spelling::Sharps
        } else {
            Spelling::KeyConventional
        }
    }

    /// Resolve key-conventional spelling against a key into sharps or flats
    pub fn resolve(self, key: PitchClass, minor: bool) -> Spelling {
        match self {
            Spelling::KeyConventional => {
                // A minor key shares its signature with the major key a minor third up
                let signature = if minor { pitch_class(key as i32 + 3) } else { key };
                if FLAT_MAJOR_KEYS.contains(&signature) {
                    Spelling::Flats
                } else {
                    Spelling::Sharps
                }
            }
            other => other,
        }
    }

    /// Name of a pitch class under this spelling. Key-conventional
    /// spelling without a key falls back to sharps.
    pub fn name(self, pc: PitchClass) -> &'static str {
        let idx = (pc % 12) as usize;
        match self {
            Spelling::Flats => FLAT_NAMES[idx],
            Spelling::Sharps | Spelling::KeyConventional => SHARP_NAMES[idx],
        }
    }
}

/// One position of a monophonic melody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MelodyElement {
    /// MIDI note number 0-127
    Pitch(u8),
    Rest,
}

impl MelodyElement {
    pub fn pitch(&self) -> Option<u8> {
        match self {
            MelodyElement::Pitch(p) => Some(*p),
            MelodyElement::Rest => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, MelodyElement::Rest)
    }

    pub fn pitch_class(&self) -> Option<PitchClass> {
        self.pitch().map(|p| p % 12)
    }
}

/// Ordered melody; index order is temporal order
pub type Melody = Vec<MelodyElement>;

/// Split a note token into its pitch class and the remaining (octave) text
fn split_note_name(s: &str) -> Result<(PitchClass, &str)> {
    let mut chars = s.char_indices();
    let base = match chars.next() {
        Some((_, c)) => match c.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(anyhow!("Invalid note name: {}", s)),
        },
        None => return Err(anyhow!("Empty note name")),
    };

    let mut offset = 0i32;
    let mut end = 1;
    for (idx, c) in chars {
        match c {
            '#' => offset += 1,
            'b' => offset -= 1,
            _ => break,
        }
        end = idx + c.len_utf8();
    }

    Ok((pitch_class(base + offset), &s[end..]))
}

impl FromStr for MelodyElement {
    type Err = anyhow::Error;

    /// Parses `_`/`r` as a rest, a bare MIDI number, or a note name with an
    /// optional scientific-pitch octave (`C4` = 60, default octave 4).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "_" || s.eq_ignore_ascii_case("r") {
            return Ok(MelodyElement::Rest);
        }

        if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
            let value: u32 = s
                .parse()
                .map_err(|_| anyhow!("Invalid MIDI note: {}", s))?;
            if value > MAX_PITCH as u32 {
                return Err(anyhow!("MIDI note must be 0-127, got {}", value));
            }
            return Ok(MelodyElement::Pitch(value as u8));
        }

        let (pc, octave_part) = split_note_name(s)?;
        let octave = if octave_part.is_empty() {
            4
        } else {
            octave_part
                .parse::<i32>()
                .map_err(|_| anyhow!("Invalid octave: {}", octave_part))?
        };

        // Accidentals may cross the octave boundary (Cb4 is B3, B#4 is C5)
        let (base_pc, _) = split_note_name(&s[..1])?;
        let accidental = s[1..s.len() - octave_part.len()]
            .chars()
            .map(|c| if c == '#' { 1 } else { -1 })
            .sum::<i32>();
        let midi = (octave + 1) * 12 + base_pc as i32 + accidental;
        debug_assert_eq!(pitch_class(midi), pc);

        if !(0..=MAX_PITCH as i32).contains(&midi) {
            return Err(anyhow!("Note {} is outside the MIDI range", s));
        }
        Ok(MelodyElement::Pitch(midi as u8))
    }
}

impl fmt::Display for MelodyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MelodyElement::Pitch(p) => {
                let octave = (*p as i32) / 12 - 1;
                write!(f, "{}{}", Spelling::Sharps.name(p % 12), octave)
            }
            MelodyElement::Rest => write!(f, "_"),
        }
    }
}
