//! Melody text notation
//!
//! Whitespace-separated tokens, one per melody position:
//!
//! ```text
//! # Ode to Joy, first phrase
//! E4 E4 F4 G4 | G4 F4 E4 D4 | C4 C4 D4 E4 | E4:3/2 D4:1/2 D4:2
//! ```
//!
//! A token is a note (`C#5`, `Bb`, default octave 4), a bare MIDI number
//! (`60`) or a rest (`_`, `r`), optionally followed by `:` and a duration in
//! beats (`2`, `1/2`; default 1). `|` bar lines are ignored; lines starting
//! with `#` are comments.

use crate::types::note::{Melody, MelodyElement};
use crate::types::time::{beats, Beats};
use anyhow::{anyhow, Context, Result};
use num_traits::Zero;

/// Parse a positive duration such as `3`, `1/2` or `3/2`
pub fn parse_duration(s: &str) -> Result<Beats> {
    let s = s.trim();
    let value = match s.split_once('/') {
        Some((n, d)) => {
            let n: i64 = n.trim().parse().map_err(|_| anyhow!("Invalid duration: {}", s))?;
            let d: i64 = d.trim().parse().map_err(|_| anyhow!("Invalid duration: {}", s))?;
            if d == 0 {
                return Err(anyhow!("Duration denominator cannot be zero: {}", s));
            }
            Beats::new(n, d)
        }
        None => beats(s.parse().map_err(|_| anyhow!("Invalid duration: {}", s))?),
    };
    if value <= Beats::zero() {
        return Err(anyhow!("Duration must be positive: {}", s));
    }
    Ok(value)
}

fn parse_token(token: &str) -> Result<(MelodyElement, Beats)> {
    let (note, duration) = match token.split_once(':') {
        Some((note, duration)) => (note, parse_duration(duration)?),
        None => (token, beats(1)),
    };
    Ok((note.parse()?, duration))
}

/// Parse melody notation into parallel melody and rhythm sequences
pub fn parse_melody(input: &str) -> Result<(Melody, Vec<Beats>)> {
    let mut melody = Vec::new();
    let mut rhythm = Vec::new();

    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        for token in line.split_whitespace().filter(|t| *t != "|") {
            let (element, duration) = parse_token(token)
                .with_context(|| format!("line {}: bad token '{}'", line_no + 1, token))?;
            melody.push(element);
            rhythm.push(duration);
        }
    }

    if melody.is_empty() {
        return Err(anyhow!("Melody contains no notes or rests"));
    }
    Ok((melody, rhythm))
}

/// Render a melody back into notation, omitting default durations
pub fn format_melody(melody: &Melody, rhythm: &[Beats]) -> String {
    melody
        .iter()
        .zip(rhythm)
        .map(|(element, duration)| {
            if *duration == beats(1) {
                element.to_string()
            } else {
                format!("{}:{}", element, duration)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
