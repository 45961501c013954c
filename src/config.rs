use eframe::egui::Color32;
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "GENAI_API_KEY";
pub const MODEL_VAR: &str = "MATH_NOTES_MODEL";
pub const ENDPOINT_VAR: &str = "MATH_NOTES_ENDPOINT";
pub const DEBUG_VAR: &str = "MATH_NOTES_DEBUG";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

// ── Ink Style ───────────────────────────────────────────────────────────────

/// Colors and sizes shared by the on-screen canvas and the raster surface.
///
/// Both surfaces render from the same style so a redraw reproduces the
/// original strokes exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InkStyle {
    pub background: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub answer: Color32,
    pub font_size: f32,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            background: Color32::BLACK,
            stroke: Color32::WHITE,
            stroke_width: 5.0,
            answer: Color32::from_rgb(0x11, 0xff, 0x00),
            font_size: 40.0,
        }
    }
}

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Config {
    /// Credential for the recognition model. Absence is only reported when a
    /// recognition request is made.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub debug: bool,
    /// `.env` file the values were read from, if one was found.
    pub env_file: Option<PathBuf>,
    pub canvas_size: (u32, u32),
    pub style: InkStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debug: false,
            env_file: None,
            canvas_size: (1000, 600),
            style: InkStyle::default(),
        }
    }
}

impl Config {
    /// Load a `.env` file from the working directory (if any), then read the
    /// process environment.
    pub fn load() -> Self {
        let env_file = dotenvy::dotenv().ok();
        Self {
            env_file,
            ..Self::from_lookup(|name| std::env::var(name).ok())
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty(API_KEY_VAR),
            model: non_empty(MODEL_VAR).unwrap_or(defaults.model),
            endpoint: non_empty(ENDPOINT_VAR)
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            debug: non_empty(DEBUG_VAR).is_some_and(|v| is_truthy(&v)),
            ..defaults
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
