use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snake_kernel::GameConfig;
use std::path::{Path, PathBuf};

/// Everything the desktop app reads from its YAML config file.
///
/// Every section is optional; an empty document yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub window: WindowConfig,
    pub textures: TextureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// RGBA clear colour behind the board.
    pub clear_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            title: "snake".into(),
            clear_color: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// Optional image files for the head and fruit sprites. Missing entries, or
/// files that fail to load, fall back to the built-in sprites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub head: Option<PathBuf>,
    pub fruit: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s).context("parsing app config")?;
        config.game.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_common::GridPosition;

    #[test]
    fn empty_document_gives_defaults() {
        let c = AppConfig::from_yaml_str("{}").unwrap();
        assert_eq!(c, AppConfig::default());
        assert_eq!(c.window.width, 500);
        assert_eq!(c.game.board_size(), 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
game:
  grid_size: 8
  start: { x: 3, y: 4 }
window:
  title: big snake
textures:
  fruit: assets/apple.png
";
        let c = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.game.board_size(), 16);
        assert_eq!(c.game.start, GridPosition::new(3, 4));
        assert_eq!(c.game.initial_length, 4);
        assert_eq!(c.window.title, "big snake");
        assert_eq!(c.window.height, 500);
        assert_eq!(c.textures.fruit, Some(PathBuf::from("assets/apple.png")));
        assert_eq!(c.textures.head, None);
    }

    #[test]
    fn invalid_game_section_is_rejected() {
        let err = AppConfig::from_yaml_str("game: { grid_size: 0 }").unwrap_err();
        assert!(format!("{err:#}").contains("grid_size"));
    }
}
