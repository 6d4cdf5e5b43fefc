use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub pyenv: PyenvConfig,
    pub venv: VenvConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PyenvConfig {
    // Executable used for every command
    pub program: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct VenvConfig {
    // Prefix of generated environment names
    pub name_prefix: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub language: String,
    // Whether to use the terminal alternate screen
    pub alt_screen: bool,
}

impl Default for PyenvConfig {
    fn default() -> Self {
        Self {
            program: "pyenv".to_string(),
        }
    }
}

impl Default for VenvConfig {
    fn default() -> Self {
        Self {
            name_prefix: "pvm".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            alt_screen: true,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::load_from(&Self::get_config_path())
    }

    /// Read `path`, creating it with defaults when missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pvm")
            .join("config.toml")
    }

    /// Apply `PVM_PYENV` and `PVM_ALT_SCREEN`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("PVM_PYENV").ok(),
            std::env::var("PVM_ALT_SCREEN").ok(),
        );
    }

    fn apply_overrides(&mut self, program: Option<String>, alt_screen: Option<String>) {
        if let Some(program) = program.filter(|p| !p.trim().is_empty()) {
            self.pyenv.program = program;
        }
        if let Some(v) = alt_screen {
            let v = v.to_lowercase();
            self.display.alt_screen = !(v == "0" || v == "false");
        }
    }

    pub fn get_effective_language(&self) -> String {
        if self.display.language == "auto" {
            // Try to get system language
            std::env::var("LANG")
                .unwrap_or_else(|_| "en_US".to_string())
                .split('.')
                .next()
                .unwrap_or("en")
                .to_string()
        } else {
            self.display.language.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_defaults_when_missing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path)?;
        assert!(path.exists());
        assert_eq!(config.pyenv.program, "pyenv");
        assert_eq!(config.venv.name_prefix, "pvm");
        assert!(config.display.alt_screen);
        Ok(())
    }

    #[test]
    fn partial_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[venv]\nname_prefix = \"lab\"\n")?;
        let config = Config::load_from(&path)?;
        assert_eq!(config.venv.name_prefix, "lab");
        assert_eq!(config.pyenv.program, "pyenv");
        assert_eq!(config.display.language, "auto");
        Ok(())
    }

    #[test]
    fn round_trips_through_toml() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.pyenv.program = "/opt/pyenv/bin/pyenv".into();
        config.display.language = "zh".into();
        config.save_to(&path)?;
        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.pyenv.program, "/opt/pyenv/bin/pyenv");
        assert_eq!(loaded.get_effective_language(), "zh");
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pyenv\nprogram = ")?;
        assert!(Config::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        config.apply_overrides(Some("mypyenv".into()), Some("false".into()));
        assert_eq!(config.pyenv.program, "mypyenv");
        assert!(!config.display.alt_screen);
        config.apply_overrides(Some("  ".into()), Some("1".into()));
        assert_eq!(config.pyenv.program, "mypyenv");
        assert!(config.display.alt_screen);
    }
}
