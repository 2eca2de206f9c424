// Wire types for the dashboard backend.
//
// Field names match the JSON the backend produces; anything the backend
// may omit is an `Option` or carries a serde default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Inverter ─────────────────────────────────────────────────────────

/// `GET /inverter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverterStatus {
    pub on: bool,
}

/// `POST /inverter/toggle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── LEDs ─────────────────────────────────────────────────────────────

/// Built-in LED animations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LedPreset {
    Rainbow,
    Chase,
    Pulse,
}

/// An RGB color triple.
///
/// Deserializes from the `[r, g, b]` array the status endpoint returns;
/// the configure endpoint takes the `"r, g, b"` string form from
/// [`Rgb::to_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The `"r, g, b"` string the configure endpoint expects.
    pub fn to_wire(self) -> String {
        format!("{}, {}, {}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `"r,g,b"`, `"r, g, b"` and `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("expected #rrggbb, got '{s}'"));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("invalid hex color '{s}'"))
            };
            return Ok(Self::new(channel(0)?, channel(2)?, channel(4)?));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(format!("expected 'r, g, b', got '{s}'"));
        };
        let parse = |v: &str| {
            v.parse::<u8>()
                .map_err(|_| format!("color channel '{v}' is not in 0..=255"))
        };
        Ok(Self::new(parse(r)?, parse(g)?, parse(b)?))
    }
}

/// `GET /leds` and the response of `POST /leds/configure`.
///
/// Older backends report power as `"power": "on" | "off"` instead of a
/// boolean `on`; [`LedStatus::is_on`] reads either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<LedPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LedStatus {
    pub fn is_on(&self) -> Option<bool> {
        self.on
            .or_else(|| self.power.as_deref().map(|p| p.eq_ignore_ascii_case("on")))
    }
}

/// `POST /leds/configure` body. Unset fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfigureRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// Sleep timer in milliseconds; `0` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// `"r, g, b"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<LedPreset>,
}

// ── Sensors ──────────────────────────────────────────────────────────

/// A value the backend may send either as a number or as preformatted text
/// (e.g. `80` vs `"80%"`, `480` vs `"8 Days remaining"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => t.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// How close to level an axis is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum LevelRating {
    Good,
    Okay,
    Bad,
}

/// `GET /level_sensor/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSensorData {
    pub pitch: f64,
    pub roll: f64,
    pub level_percent: Reading,
    pub pitch_rating: LevelRating,
    pub roll_rating: LevelRating,
}

/// `GET /smartshunt/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuntData {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub state_of_charge_percent: Reading,
    #[serde(default)]
    pub consumed_ah: Option<f64>,
    #[serde(default)]
    pub time_to_go_min: Reading,
}

// ── Files ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// One entry of a folder listing. `path` is unique within a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub path: String,
    /// Only meaningful for folders.
    #[serde(default)]
    pub locked: bool,
}

impl FileItem {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

/// `POST /files/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub filename: String,
    pub path: String,
}

/// `POST /files/folder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderResponse {
    #[serde(default)]
    pub success: bool,
    pub path: String,
}

/// Bare `{success}` acknowledgement (delete, lock, unlock, authenticate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}
