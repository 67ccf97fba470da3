//! WASM bindings for harmonist-core
//!
//! Exposes harmonization of text notation and chord labelling to
//! JavaScript. Results are serialized with serde-wasm-bindgen.

#[cfg(feature = "wasm")]
use crate::harmony::label::generate_chord_label;
#[cfg(feature = "wasm")]
use crate::harmony::part::{harmonize, HarmonizedPart, Part};
#[cfg(feature = "wasm")]
use crate::parser::melody::parse_melody;
#[cfg(feature = "wasm")]
use crate::types::{ChordQuality, HarmonyParams};
#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

/// Result of a harmonization request (JS-serializable)
#[cfg(feature = "wasm")]
#[derive(serde::Serialize, serde::Deserialize)]
struct HarmonizeResult {
    success: bool,
    error: Option<String>,
    part: Option<HarmonizedPart>,
    playback: Vec<Part>,
}

#[cfg(feature = "wasm")]
impl HarmonizeResult {
    fn failure(error: impl ToString) -> Self {
        HarmonizeResult {
            success: false,
            error: Some(error.to_string()),
            part: None,
            playback: Vec::new(),
        }
    }
}

#[cfg(feature = "wasm")]
fn harmonize_notation(notation: &str, params_json: &str) -> HarmonizeResult {
    let params = if params_json.trim().is_empty() {
        HarmonyParams::default()
    } else {
        match serde_json::from_str::<HarmonyParams>(params_json) {
            Ok(params) => params,
            Err(e) => return HarmonizeResult::failure(format!("invalid parameters: {}", e)),
        }
    };

    let (melody, rhythm) = match parse_melody(notation) {
        Ok(parsed) => parsed,
        Err(e) => return HarmonizeResult::failure(format!("{:#}", e)),
    };

    match harmonize(&melody, &rhythm, &params) {
        Ok(part) => HarmonizeResult {
            success: true,
            error: None,
            playback: part.to_playback_parts(),
            part: Some(part),
        },
        Err(e) => HarmonizeResult::failure(e),
    }
}

/// Harmonize melody notation. `params_json` may be empty for defaults.
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn harmonize_js(notation: &str, params_json: &str) -> JsValue {
    serde_wasm_bindgen::to_value(&harmonize_notation(notation, params_json)).unwrap_or(JsValue::NULL)
}

/// Label for a root pitch class and quality symbol, e.g. `(0, "dom7")` -> `"C7"`
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn chord_label_js(root: u8, quality: &str) -> Option<String> {
    let quality: ChordQuality = quality.parse().ok()?;
    Some(generate_chord_label(root % 12, quality))
}
