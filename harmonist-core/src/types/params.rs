//! Harmonization parameters
//!
//! `HarmonyParams` gathers every user-facing option of the pipeline. Each
//! option enum round-trips through a short lower-case token so the shell
//! can set it from text.

use crate::error::HarmonizeError;
use crate::types::chord::ChordQuality;
use crate::types::note::MAX_PITCH;
use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// Minimum width of the voicing range, in semitones
pub const MIN_RANGE_SEMITONES: u8 = 24;

/// Valid chord densities
pub const DENSITY_RANGE: std::ops::RangeInclusive<u8> = 3..=7;

/// How the tonal center is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCenter {
    #[default]
    Automatic,
    ForceMajor,
    ForceMinor,
    Modal,
}

/// Temporal articulation of each voicing within its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoicingStyle {
    #[default]
    Block,
    Broken,
    Arpeggiated,
    Alberti,
    Waltz,
    Rolling,
    Stride,
    Tremolo,
    Sustained,
    Staccato,
}

/// Ordinal ladder of chord vocabulary richness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Complexity {
    Triads,
    Suspended,
    Sixths,
    #[default]
    Seventh,
    Ninth,
    Extended,
    Altered,
}

/// Which chord tone is duplicated when density exceeds the tone count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Doubling {
    #[default]
    Balanced,
    Root,
    Third,
    Fifth,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonyParams {
    pub key_center: KeyCenter,
    /// Spelling preference only (-1 flats .. 1 sharps); never affects pitches
    pub key_center_bias: f64,
    pub voicing_style: VoicingStyle,
    /// Target number of sounding pitches per chord (3-7)
    pub density: u8,
    pub complexity: Complexity,
    pub lowest_note: u8,
    pub highest_note: u8,
    pub prefer_closed_voicing: bool,
    pub allow_inversions: bool,
    pub doubling: Doubling,
    /// Forces one quality for every segment
    pub quality: Option<ChordQuality>,
}

impl Default for HarmonyParams {
    fn default() -> Self {
        Self {
            key_center: KeyCenter::Automatic,
            key_center_bias: 0.0,
            voicing_style: VoicingStyle::Block,
            density: 4,
            complexity: Complexity::Seventh,
            lowest_note: 48,
            highest_note: 84,
            prefer_closed_voicing: true,
            allow_inversions: false,
            doubling: Doubling::Balanced,
            quality: None,
        }
    }
}

impl HarmonyParams {
    /// Reject parameter combinations the pipeline cannot honor
    pub fn validate(&self) -> Result<(), HarmonizeError> {
        if !DENSITY_RANGE.contains(&self.density) {
            return Err(HarmonizeError::InvalidParams(format!(
                "density must be 3-7, got {}",
                self.density
            )));
        }
        if !self.key_center_bias.is_finite() || !(-1.0..=1.0).contains(&self.key_center_bias) {
            return Err(HarmonizeError::InvalidParams(format!(
                "key center bias must be between -1 and 1, got {}",
                self.key_center_bias
            )));
        }
        if self.lowest_note > MAX_PITCH || self.highest_note > MAX_PITCH {
            return Err(HarmonizeError::InvalidParams(
                "note range must lie within 0-127".to_string(),
            ));
        }
        if self.highest_note < self.lowest_note
            || self.highest_note - self.lowest_note < MIN_RANGE_SEMITONES
        {
            return Err(HarmonizeError::InvalidParams(format!(
                "note range {}-{} must span at least {} semitones",
                self.lowest_note, self.highest_note, MIN_RANGE_SEMITONES
            )));
        }
        Ok(())
    }

    /// Set an option by name from its text value
    pub fn set(&mut self, option: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match option {
            "key" | "key-center" => self.key_center = value.parse()?,
            "bias" | "key-center-bias" => {
                self.key_center_bias = value
                    .parse()
                    .map_err(|_| anyhow!("Invalid bias: {}", value))?
            }
            "style" | "voicing-style" => self.voicing_style = value.parse()?,
            "density" => {
                self.density = value
                    .parse()
                    .map_err(|_| anyhow!("Invalid density: {}", value))?
            }
            "complexity" => self.complexity = value.parse()?,
            "lowest" | "lowest-note" => self.lowest_note = parse_note_bound(value)?,
            "highest" | "highest-note" => self.highest_note = parse_note_bound(value)?,
            "range" => {
                let (low, high) = value
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("Expected <low> <high>, got {}", value))?;
                self.lowest_note = parse_note_bound(low)?;
                self.highest_note = parse_note_bound(high.trim())?;
            }
            "closed" | "prefer-closed-voicing" => self.prefer_closed_voicing = parse_flag(value)?,
            "inversions" | "allow-inversions" => self.allow_inversions = parse_flag(value)?,
            "doubling" => self.doubling = value.parse()?,
            "quality" => {
                self.quality = match value {
                    "none" | "auto" => None,
                    other => Some(other.parse()?),
                }
            }
            _ => return Err(anyhow!("Unknown option: {}", option)),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(anyhow!("Expected on/off, got {}", value)),
    }
}

fn parse_note_bound(value: &str) -> Result<u8> {
    use crate::types::note::MelodyElement;
    match value.parse::<MelodyElement>()? {
        MelodyElement::Pitch(p) => Ok(p),
        MelodyElement::Rest => Err(anyhow!("A range bound cannot be a rest")),
    }
}

/// Implements `FromStr` and `Display` for an option enum from a token table
macro_rules! option_tokens {
    ($ty:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn token(self) -> &'static str {
                match self {
                    $($ty::$variant => $token),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .find(|v| v.token() == s)
                    .copied()
                    .ok_or_else(|| {
                        let valid: Vec<_> = Self::ALL.iter().map(|v| v.token()).collect();
                        anyhow!(
                            "Invalid {}: {} (expected one of {})",
                            stringify!($ty),
                            s,
                            valid.join(", ")
                        )
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.token())
            }
        }
    };
}

option_tokens!(KeyCenter {
    Automatic => "automatic",
    ForceMajor => "force-major",
    ForceMinor => "force-minor",
    Modal => "modal",
});

option_tokens!(VoicingStyle {
    Block => "block",
    Broken => "broken",
    Arpeggiated => "arpeggiated",
    Alberti => "alberti",
    Waltz => "waltz",
    Rolling => "rolling",
    Stride => "stride",
    Tremolo => "tremolo",
    Sustained => "sustained",
    Staccato => "staccato",
});

option_tokens!(Complexity {
    Triads => "triads",
    Suspended => "suspended",
    Sixths => "sixths",
    Seventh => "seventh",
    Ninth => "ninth",
    Extended => "extended",
    Altered => "altered",
});

option_tokens!(Doubling {
    Balanced => "balanced",
    Root => "root",
    Third => "third",
    Fifth => "fifth",
});

impl fmt::Display for HarmonyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "key-center:            {}", self.key_center)?;
        writeln!(f, "key-center-bias:       {:.2}", self.key_center_bias)?;
        writeln!(f, "voicing-style:         {}", self.voicing_style)?;
        writeln!(f, "density:               {}", self.density)?;
        writeln!(f, "complexity:            {}", self.complexity)?;
        writeln!(f, "lowest-note:           {}", self.lowest_note)?;
        writeln!(f, "highest-note:          {}", self.highest_note)?;
        writeln!(f, "prefer-closed-voicing: {}", self.prefer_closed_voicing)?;
        writeln!(f, "allow-inversions:      {}", self.allow_inversions)?;
        writeln!(f, "doubling:              {}", self.doubling)?;
        match self.quality {
            Some(q) => write!(f, "quality:               {}", q),
            None => write!(f, "quality:               auto"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = HarmonyParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.density, 4);
        assert_eq!(params.complexity, Complexity::Seventh);
    }

    #[test]
    fn test_validation_rejects_bad_density() {
        let params = HarmonyParams {
            density: 8,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(HarmonizeError::InvalidParams(_))));

        let params = HarmonyParams {
            density: 2,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_narrow_range() {
        let params = HarmonyParams {
            lowest_note: 60,
            highest_note: 72,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let inverted = HarmonyParams {
            lowest_note: 80,
            highest_note: 40,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bias_out_of_range() {
        let params = HarmonyParams {
            key_center_bias: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = HarmonyParams {
            key_center_bias: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_option_tokens_round_trip() {
        for style in VoicingStyle::ALL {
            assert_eq!(style.token().parse::<VoicingStyle>().unwrap(), *style);
        }
        assert_eq!("Force-Major".parse::<KeyCenter>().unwrap(), KeyCenter::ForceMajor);
        assert!("sideways".parse::<Doubling>().is_err());
    }

    #[test]
    fn test_set_options() {
        let mut params = HarmonyParams::default();
        params.set("style", "alberti").unwrap();
        params.set("density", "5").unwrap();
        params.set("lowest", "C2").unwrap();
        params.set("inversions", "on").unwrap();
        params.set("quality", "dom7").unwrap();

        assert_eq!(params.voicing_style, VoicingStyle::Alberti);
        assert_eq!(params.density, 5);
        assert_eq!(params.lowest_note, 36);
        assert!(params.allow_inversions);
        assert_eq!(params.quality, Some(ChordQuality::Dominant7));

        params.set("quality", "auto").unwrap();
        assert_eq!(params.quality, None);
        assert!(params.set("volume", "11").is_err());
    }

    #[test]
    fn test_set_range_moves_both_bounds() {
        let mut params = HarmonyParams::default();
        params.set("range", "C5 C7").unwrap();
        assert_eq!((params.lowest_note, params.highest_note), (72, 96));
        assert!(params.validate().is_ok());

        params.set("range", "40  64").unwrap();
        assert_eq!((params.lowest_note, params.highest_note), (40, 64));

        assert!(params.set("range", "C5").is_err());
        assert!(params.set("range", "C5 _").is_err());
    }
}
