//! JSON configuration consumed by the engine.
//!
//! The configuration document carries four sections:
//!
//! - `gameSettings` - grid size, timing, scoring and input throttling
//! - `tetrominoes` - piece definitions (one matrix per rotation state)
//! - `texts`, `assets` - presentation data, passed through untouched
//!
//! # Example
//!
//! ```
//! use stackfall_engine::GameConfig;
//!
//! let config = GameConfig::builtin();
//! assert_eq!(config.game_settings.grid_width, 10);
//! assert_eq!(config.tetrominoes.len(), 7);
//! ```

use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::piece::PieceId;

const BUILTIN_CONFIG: &str = include_str!("../assets/default_config.json");

/// Error raised while loading or validating a configuration.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("failed to read configuration: {_0}")]
    Io(std::io::Error),
    #[display("invalid configuration JSON: {_0}")]
    Json(serde_json::Error),
    #[display("configuration defines no tetrominoes")]
    NoPieces,
    #[display("tetromino {id} has no rotation states")]
    EmptyRotations { id: PieceId },
    #[display("tetromino id {id} is defined more than once")]
    DuplicateId { id: PieceId },
    #[display("board size {width}x{height} is not playable")]
    InvalidBoardSize { width: usize, height: usize },
    #[display("setting `{name}` is out of range")]
    InvalidSetting { name: &'static str },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub game_settings: GameSettings,
    pub tetrominoes: Vec<TetrominoConfig>,
    /// Presentation strings; not interpreted by the engine.
    #[serde(default)]
    pub texts: serde_json::Value,
    /// Image and audio locations; not interpreted by the engine.
    #[serde(default)]
    pub assets: serde_json::Value,
}

/// Grid, timing and scoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Pixel size of a cell, kept for the renderer.
    #[serde(default)]
    pub cell_size: u32,
    /// Initial gravity interval in milliseconds.
    pub initial_fall_speed: f64,
    pub level_up_line_count: u32,
    /// Factor applied to the gravity interval on every level-up (below 1.0).
    pub level_up_speed_multiplier: f64,
    pub score_per_line: u64,
    pub score_per_hard_drop_block: u64,
    pub score_per_soft_drop_block: u64,
    /// Minimum interval between accepted horizontal moves, in milliseconds.
    #[serde(default = "default_move_delay")]
    pub move_delay: f64,
    /// Minimum interval between accepted rotations, in milliseconds.
    #[serde(default = "default_rotate_delay")]
    pub rotate_delay: f64,
    /// Minimum interval between accepted soft drops, in milliseconds.
    #[serde(default = "default_soft_drop_delay")]
    pub soft_drop_delay: f64,
}

fn default_move_delay() -> f64 {
    100.0
}

fn default_rotate_delay() -> f64 {
    150.0
}

fn default_soft_drop_delay() -> f64 {
    50.0
}

/// Source of a single piece definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TetrominoConfig {
    /// Identifier, also written into board cells once the piece locks.
    pub id: PieceId,
    pub name: String,
    /// One matrix per rotation state; any non-zero cell is filled.
    pub shapes: Vec<Vec<Vec<u32>>>,
    #[serde(default)]
    pub spawn_offset_x: i32,
    #[serde(default)]
    pub spawn_offset_y: i32,
}

impl GameConfig {
    /// Returns the configuration shipped with the engine.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_CONFIG).expect("built-in configuration should be valid")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R>(reader: R) -> Result<Self, ConfigError>
    where
        R: Read,
    {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Checks the settings the engine relies on to terminate and stay in bounds.
    ///
    /// Shape matrices are not inspected here; see
    /// [`PieceRegistry::from_config`](crate::PieceRegistry::from_config).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GameSettings {
            grid_width,
            grid_height,
            initial_fall_speed,
            level_up_line_count,
            level_up_speed_multiplier,
            move_delay,
            rotate_delay,
            soft_drop_delay,
            ..
        } = self.game_settings;

        let fits = |n: usize| n > 0 && i32::try_from(n).is_ok();
        if !(fits(grid_width) && fits(grid_height)) {
            return Err(ConfigError::InvalidBoardSize {
                width: grid_width,
                height: grid_height,
            });
        }
        if !(initial_fall_speed.is_finite() && initial_fall_speed > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "initialFallSpeed",
            });
        }
        if level_up_line_count == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "levelUpLineCount",
            });
        }
        // Gravity must never slow down on level-up.
        if !(level_up_speed_multiplier > 0.0 && level_up_speed_multiplier < 1.0) {
            return Err(ConfigError::InvalidSetting {
                name: "levelUpSpeedMultiplier",
            });
        }
        for (name, delay) in [
            ("moveDelay", move_delay),
            ("rotateDelay", rotate_delay),
            ("softDropDelay", soft_drop_delay),
        ] {
            if !(delay.is_finite() && delay >= 0.0) {
                return Err(ConfigError::InvalidSetting { name });
            }
        }
        if self.tetrominoes.is_empty() {
            return Err(ConfigError::NoPieces);
        }
        Ok(())
    }
}
