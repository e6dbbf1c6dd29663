use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::generator::GeneratorConfig;
use crate::ledger::PlayerSlot;
use crate::multiplayer::{MatchSettings, Role};
use crate::session::{Level, Mode};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "planarity";

/// Default pause between autoplayer moves.
pub const BOT_DELAY_MS: u64 = 1500;

pub const KEYS: [&str; 10] = [
    "defaults.mode",
    "defaults.level",
    "defaults.player",
    "generator.coefficient_min",
    "generator.coefficient_max",
    "generator.max_attempts",
    "multiplayer.topic",
    "multiplayer.retry_interval_ms",
    "multiplayer.max_retries",
    "multiplayer.bot_delay_ms",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplayer: Option<MultiplayerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,

    /// Leaderboard slot, 1 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient_min: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient_max: Option<i32>,

    /// Zero means retry forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiplayerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_delay_ms: Option<u64>,
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {key}: {value}. Must be a whole number."))
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `planarity config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# Planarity configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.defaults
            .as_ref()
            .and_then(|d| d.mode)
            .unwrap_or_default()
    }

    pub fn level(&self) -> Level {
        self.defaults
            .as_ref()
            .and_then(|d| d.level)
            .unwrap_or_default()
    }

    pub fn player(&self) -> PlayerSlot {
        self.defaults
            .as_ref()
            .and_then(|d| d.player)
            .and_then(PlayerSlot::new)
            .unwrap_or_default()
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        if let Some(section) = &self.generator {
            if let Some(min) = section.coefficient_min {
                config.coefficient_min = min;
            }
            if let Some(max) = section.coefficient_max {
                config.coefficient_max = max;
            }
            if let Some(attempts) = section.max_attempts {
                config.max_attempts = (attempts > 0).then_some(attempts);
            }
        }
        config
    }

    pub fn match_settings(&self, role: Role) -> MatchSettings {
        let section = self.multiplayer.clone().unwrap_or_default();
        let defaults = MatchSettings::new(role);
        MatchSettings {
            topic: section.topic.unwrap_or(defaults.topic),
            retry_interval: section
                .retry_interval_ms
                .map_or(defaults.retry_interval, Duration::from_millis),
            max_retries: section.max_retries.unwrap_or(defaults.max_retries),
            role,
        }
    }

    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(
            self.multiplayer
                .as_ref()
                .and_then(|m| m.bot_delay_ms)
                .unwrap_or(BOT_DELAY_MS),
        )
    }

    /// Every key with the value in effect, defaults filled in.
    pub fn effective(&self) -> Vec<(&'static str, String)> {
        let generator = self.generator_config();
        let settings = self.match_settings(Role::Host);
        vec![
            ("defaults.mode", value_name(self.mode())),
            ("defaults.level", value_name(self.level())),
            ("defaults.player", self.player().number().to_string()),
            ("generator.coefficient_min", generator.coefficient_min.to_string()),
            ("generator.coefficient_max", generator.coefficient_max.to_string()),
            (
                "generator.max_attempts",
                generator.max_attempts.unwrap_or(0).to_string(),
            ),
            ("multiplayer.topic", settings.topic),
            (
                "multiplayer.retry_interval_ms",
                settings.retry_interval.as_millis().to_string(),
            ),
            ("multiplayer.max_retries", settings.max_retries.to_string()),
            (
                "multiplayer.bot_delay_ms",
                self.bot_delay().as_millis().to_string(),
            ),
        ]
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.mode" => {
                let mode = Mode::from_str(value, true).map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid mode: {value}. Must be 'classic', 'race-against-time', or 'crazy'."
                    )
                })?;
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .mode = Some(mode);
            }
            "defaults.level" => {
                let level = Level::from_str(value, true).map_err(|_| {
                    anyhow::anyhow!("Invalid level: {value}. Must be 'easy', 'normal', or 'hard'.")
                })?;
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .level = Some(level);
            }
            "defaults.player" => {
                let number: u8 = parse_number(key, value)?;
                if PlayerSlot::new(number).is_none() {
                    anyhow::bail!("Invalid player: {value}. Must be between 1 and 5.");
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .player = Some(number);
            }
            "generator.coefficient_min" | "generator.coefficient_max" => {
                let coefficient: i32 = parse_number(key, value)?;
                let mut updated = self.generator_config();
                if key.ends_with("min") {
                    updated.coefficient_min = coefficient;
                } else {
                    updated.coefficient_max = coefficient;
                }
                if updated.coefficient_min > updated.coefficient_max {
                    anyhow::bail!(
                        "Invalid {key}: {value}. coefficient_min ({}) must not exceed coefficient_max ({}).",
                        updated.coefficient_min,
                        updated.coefficient_max
                    );
                }
                let section = self.generator.get_or_insert_with(GeneratorSection::default);
                if key.ends_with("min") {
                    section.coefficient_min = Some(coefficient);
                } else {
                    section.coefficient_max = Some(coefficient);
                }
            }
            "generator.max_attempts" => {
                let attempts: u32 = parse_number(key, value)?;
                self.generator
                    .get_or_insert_with(GeneratorSection::default)
                    .max_attempts = Some(attempts);
            }
            "multiplayer.topic" => {
                if value.is_empty() || value.contains(['+', '#']) {
                    anyhow::bail!(
                        "Invalid topic: {value:?}. Must be non-empty and free of '+' and '#'."
                    );
                }
                self.multiplayer
                    .get_or_insert_with(MultiplayerConfig::default)
                    .topic = Some(value.to_string());
            }
            "multiplayer.retry_interval_ms" => {
                let millis: u64 = parse_number(key, value)?;
                if millis == 0 {
                    anyhow::bail!("Invalid retry_interval_ms: 0. Must be at least 1.");
                }
                self.multiplayer
                    .get_or_insert_with(MultiplayerConfig::default)
                    .retry_interval_ms = Some(millis);
            }
            "multiplayer.max_retries" => {
                let retries: u32 = parse_number(key, value)?;
                self.multiplayer
                    .get_or_insert_with(MultiplayerConfig::default)
                    .max_retries = Some(retries);
            }
            "multiplayer.bot_delay_ms" => {
                let millis: u64 = parse_number(key, value)?;
                self.multiplayer
                    .get_or_insert_with(MultiplayerConfig::default)
                    .bot_delay_ms = Some(millis);
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: {}",
                KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

/// The name clap and the config file use for an enum value.
fn value_name<V: ValueEnum>(value: V) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::default();
        assert_eq!(config.mode(), Mode::Classic);
        assert_eq!(config.level(), Level::Normal);
        assert_eq!(config.player(), PlayerSlot::default());
        assert_eq!(config.generator_config(), GeneratorConfig::default());
        assert_eq!(config.match_settings(Role::Join), MatchSettings::new(Role::Join));
        assert_eq!(config.bot_delay(), Duration::from_millis(BOT_DELAY_MS));
    }

    #[test]
    fn full_coefficient_range_generates() {
        let mut config = Config::default();
        config.set("generator.coefficient_max", "2147483647").unwrap();
        config.set("generator.coefficient_min", "-2147483648").unwrap();
        let mut generator =
            crate::graph::generator::Generator::from_seed(5, config.generator_config()).unwrap();
        assert!(generator.generate().unwrap().crossings() >= 1);
    }

    #[test]
    fn set_every_key() {
        let mut config = Config::default();
        config.set("defaults.mode", "race-against-time").unwrap();
        config.set("defaults.level", "hard").unwrap();
        config.set("defaults.player", "4").unwrap();
        config.set("generator.coefficient_max", "20").unwrap();
        config.set("generator.coefficient_min", "-3").unwrap();
        config.set("generator.max_attempts", "0").unwrap();
        config.set("multiplayer.topic", "planarity/test").unwrap();
        config.set("multiplayer.retry_interval_ms", "250").unwrap();
        config.set("multiplayer.max_retries", "4").unwrap();
        config.set("multiplayer.bot_delay_ms", "900").unwrap();

        assert_eq!(config.mode(), Mode::RaceAgainstTime);
        assert_eq!(config.level(), Level::Hard);
        assert_eq!(config.player().number(), 4);
        assert_eq!(
            config.generator_config(),
            GeneratorConfig {
                coefficient_min: -3,
                coefficient_max: 20,
                max_attempts: None,
            }
        );
        let settings = config.match_settings(Role::Host);
        assert_eq!(settings.topic, "planarity/test");
        assert_eq!(settings.retry_interval, Duration::from_millis(250));
        assert_eq!(settings.max_retries, 4);
        assert_eq!(config.bot_delay(), Duration::from_millis(900));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("defaults.mode", "zen").is_err());
        assert!(config.set("defaults.level", "insane").is_err());
        assert!(config.set("defaults.player", "6").is_err());
        assert!(config.set("defaults.player", "0").is_err());
        assert!(config.set("generator.coefficient_min", "11").is_err());
        assert!(config.set("generator.coefficient_max", "0").is_err());
        assert!(config.set("generator.max_attempts", "-1").is_err());
        assert!(config.set("multiplayer.topic", "planarity/#").is_err());
        assert!(config.set("multiplayer.retry_interval_ms", "0").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn effective_lists_every_key() {
        let keys: Vec<_> = Config::default()
            .effective()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, KEYS);
    }

    #[test]
    fn effective_uses_config_names() {
        let mut config = Config::default();
        config.set("defaults.mode", "race-against-time").unwrap();
        let effective = config.effective();
        assert_eq!(effective[0].1, "race-against-time");
        assert_eq!(effective[1].1, "normal");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        let mut config = Config::default();
        config.set("defaults.level", "easy").unwrap();
        config.set("multiplayer.max_retries", "3").unwrap();
        config.save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Planarity configuration"));
        assert!(!text.contains("generator"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("No config found"));
    }

    #[test]
    fn reads_hand_written_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(
            &path,
            "defaults:\n  mode: crazy\ngenerator:\n  max_attempts: 50\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mode(), Mode::Crazy);
        assert_eq!(config.generator_config().max_attempts, Some(50));
    }
}
