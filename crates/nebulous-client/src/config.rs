use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use nebulous_types::{GameDifficulty, GameMode, OnlineMode, SplitMultiplier};
use serde::Deserialize;

/// Everything the host can choose about a session.
///
/// Cosmetic identifiers are opaque to the client; `-1` means "none" for the
/// signed byte fields, mirroring the game's conventions.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    // Lobby selection
    #[serde(default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub game_difficulty: GameDifficulty,
    #[serde(default = "default_game_id")]
    pub game_id: i32,
    #[serde(default)]
    pub online_mode: OnlineMode,
    #[serde(default)]
    pub mayhem: bool,

    /// Must match the version the server accepts.
    #[serde(default)]
    pub game_version: u16,

    // Cosmetic identity
    #[serde(default = "default_alias")]
    pub alias: String,
    #[serde(default)]
    pub alias_font: u8,
    #[serde(default = "default_alias_colors")]
    pub alias_colors: Vec<i8>,
    #[serde(default)]
    pub alias_animation: u8,

    #[serde(default)]
    pub skin: u16,
    #[serde(default)]
    pub skin2: u16,
    #[serde(default = "default_none_byte")]
    pub eject_skin: i8,
    #[serde(default = "default_none_byte")]
    pub hat: i8,
    #[serde(default)]
    pub halo: u8,
    #[serde(default = "default_none_byte")]
    pub particle: i8,
    #[serde(default)]
    pub custom_skin: i32,
    #[serde(default)]
    pub custom_skin2: i32,
    #[serde(default)]
    pub custom_particle: i32,

    #[serde(default = "default_blob_color")]
    pub blob_color: u32,

    // Pets
    #[serde(default = "default_none_byte")]
    pub pet1: i8,
    #[serde(default)]
    pub pet1_name: String,
    #[serde(default)]
    pub custom_pet: i32,
    #[serde(default = "default_none_byte")]
    pub pet2: i8,
    #[serde(default)]
    pub pet2_name: String,
    #[serde(default)]
    pub custom_pet2: i32,

    /// 5-entry palette shown behind the level badge.
    #[serde(default = "default_level_colors")]
    pub level_colors: Vec<u8>,

    /// Visual blend rate between the two skins, `[0, 60]`.
    #[serde(default)]
    pub skin_interpolation_rate: f32,

    /// Starts at x8; overwritten by the server's connect result.
    #[serde(default)]
    pub split_multiplier: SplitMultiplier,

    // Screen geometry, for the control packet's aspect ratio
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
}

fn default_game_id() -> i32 {
    -1
}

fn default_alias() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("Blob {:04X}", millis & 0xFFFF)
}

fn default_alias_colors() -> Vec<i8> {
    vec![-1; 6]
}

fn default_none_byte() -> i8 {
    -1
}

fn default_blob_color() -> u32 {
    0xFF1A69E1
}

fn default_level_colors() -> Vec<u8> {
    vec![0x77; 5]
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            game_mode: GameMode::Ffa,
            game_difficulty: GameDifficulty::Easy,
            game_id: default_game_id(),
            online_mode: OnlineMode::Public,
            mayhem: false,
            game_version: 0,
            alias: default_alias(),
            alias_font: 0,
            alias_colors: default_alias_colors(),
            alias_animation: 0,
            skin: 0,
            skin2: 0,
            eject_skin: default_none_byte(),
            hat: default_none_byte(),
            halo: 0,
            particle: default_none_byte(),
            custom_skin: 0,
            custom_skin2: 0,
            custom_particle: 0,
            blob_color: default_blob_color(),
            pet1: default_none_byte(),
            pet1_name: String::new(),
            custom_pet: 0,
            pet2: default_none_byte(),
            pet2_name: String::new(),
            custom_pet2: 0,
            level_colors: default_level_colors(),
            skin_interpolation_rate: 0.0,
            split_multiplier: SplitMultiplier::X8,
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Screen aspect ratio as sent in control packets (always >= 1).
    pub fn aspect_ratio(&self) -> f32 {
        let long = self.screen_width.max(self.screen_height) as f32;
        let short = self.screen_width.min(self.screen_height).max(1) as f32;
        long / short
    }
}
