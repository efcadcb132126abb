use crate::error::{CalcError, CalcResult};
use crate::storage::{CsvHistoryStore, HistoryStore};
use crate::utils::{expand_path, MAX_PRECISION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calculator: CalculatorConfig,
    pub repl: ReplConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Settings the calculator core reads once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub max_history_size: usize,
    pub precision: u32,
    pub max_input_value: f64,
    pub auto_save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    pub prompt: String,
    pub operand_prompt: String,
    pub colors: bool,
    pub input_history_size: usize,
    pub load_history_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub config_dir: PathBuf,
    pub history_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            max_history_size: crate::DEFAULT_MAX_HISTORY,
            precision: 2,
            max_input_value: 1e10,
            auto_save: true,
        }
    }
}

impl CalculatorConfig {
    pub fn validate(&self) -> CalcResult<()> {
        if self.max_history_size == 0 {
            return Err(CalcError::config("max_history_size must be positive"));
        }
        if self.precision > MAX_PRECISION {
            return Err(CalcError::config(format!(
                "precision must be at most {}",
                MAX_PRECISION
            )));
        }
        if !self.max_input_value.is_finite() || self.max_input_value <= 0.0 {
            return Err(CalcError::config("max_input_value must be a positive number"));
        }
        Ok(())
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: format!("{}> ", crate::PROMPT_PREFIX),
            operand_prompt: "  ".to_string(),
            colors: true,
            input_history_size: 1000,
            load_history_on_start: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_DIR);

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_DIR);

        Self {
            config_dir,
            history_dir: data_dir.join("history"),
            log_dir: data_dir.join("logs"),
        }
    }
}

impl PathsConfig {
    /// Expand `~` and environment variables written in the config file
    pub fn expand(&mut self) {
        for path in [&mut self.config_dir, &mut self.history_dir, &mut self.log_dir] {
            let expanded = expand_path(&path.to_string_lossy());
            *path = expanded;
        }
    }
}

impl Config {
    /// Load configuration from file or create default, then apply
    /// `CALCULATOR_*` environment overrides
    pub async fn load(config_path: Option<&Path>) -> CalcResult<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_file(),
        };

        let mut config: Config = if config_file.exists() {
            let content = fs::read_to_string(&config_file).await?;
            toml::from_str(&content)
                .map_err(|e| CalcError::config(format!("Failed to parse config: {}", e)))?
        } else {
            Config::default()
        };

        config.paths.expand();
        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        config.calculator.validate()?;
        Ok(config)
    }

    fn default_config_file() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_DIR)
            .join(crate::CONFIG_FILE)
    }

    /// Apply overrides looked up through `lookup`, which maps a variable
    /// name to its value
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> CalcResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CALCULATOR_MAX_HISTORY_SIZE") {
            self.calculator.max_history_size =
                parse_env("CALCULATOR_MAX_HISTORY_SIZE", &value, "integer")?;
        }
        if let Some(value) = lookup("CALCULATOR_PRECISION") {
            self.calculator.precision = parse_env("CALCULATOR_PRECISION", &value, "integer")?;
        }
        if let Some(value) = lookup("CALCULATOR_MAX_INPUT_VALUE") {
            self.calculator.max_input_value =
                parse_env("CALCULATOR_MAX_INPUT_VALUE", &value, "float")?;
        }
        if let Some(value) = lookup("CALCULATOR_AUTO_SAVE") {
            self.calculator.auto_save = matches!(
                value.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            );
        }
        if let Some(value) = lookup("CALCULATOR_HISTORY_DIR") {
            self.paths.history_dir = expand_path(&value);
        }
        if let Some(value) = lookup("CALCULATOR_LOG_DIR") {
            self.paths.log_dir = expand_path(&value);
        }
        Ok(())
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: Option<&Path>) -> CalcResult<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => self.config_file(crate::CONFIG_FILE),
        };

        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CalcError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_file, content).await?;
        Ok(())
    }

    /// Write the default config file unless one exists
    pub async fn init(&self, force: bool) -> CalcResult<PathBuf> {
        let config_file = self.config_file(crate::CONFIG_FILE);

        if config_file.exists() && !force {
            return Err(CalcError::config(
                "Configuration file already exists. Use --force to overwrite.",
            ));
        }

        self.save(Some(&config_file)).await?;
        self.ensure_directories().await?;
        Ok(config_file)
    }

    /// Check configuration and file system setup
    pub async fn doctor(&self) -> CalcResult<()> {
        println!("Calculator configuration check");
        println!();

        self.check_directory("Config", &self.paths.config_dir).await?;
        self.check_directory("History", &self.paths.history_dir).await?;
        self.check_directory("Log", &self.paths.log_dir).await?;

        let history_file = self.history_file();
        if history_file.exists() {
            let metadata = fs::metadata(&history_file).await?;
            let store = CsvHistoryStore::new(&history_file);
            match store.load() {
                Ok(records) => println!(
                    "✓ History file: {} ({} bytes, {} records)",
                    history_file.display(),
                    metadata.len(),
                    records.len()
                ),
                Err(e) => println!("✗ History file: {} ({})", history_file.display(), e),
            }
        } else {
            println!("⚠ History file: {} (not found)", history_file.display());
        }

        match self.calculator.validate() {
            Ok(()) => println!(
                "✓ Calculator: history {} / precision {} / max input {} / auto-save {}",
                self.calculator.max_history_size,
                self.calculator.precision,
                self.calculator.max_input_value,
                if self.calculator.auto_save { "on" } else { "off" }
            ),
            Err(e) => println!("✗ Calculator: {}", e),
        }

        println!();
        println!("✓ Configuration check complete");
        Ok(())
    }

    /// Remove the persisted calculation history
    pub async fn clear_history(&self) -> CalcResult<()> {
        let history_file = self.history_file();
        if history_file.exists() {
            fs::remove_file(&history_file).await?;
        }
        Ok(())
    }

    /// Ensure all necessary directories exist
    pub async fn ensure_directories(&self) -> CalcResult<()> {
        fs::create_dir_all(&self.paths.config_dir).await?;
        fs::create_dir_all(&self.paths.history_dir).await?;
        if self.logging.log_to_file {
            fs::create_dir_all(&self.paths.log_dir).await?;
        }
        Ok(())
    }

    async fn check_directory(&self, name: &str, path: &Path) -> CalcResult<()> {
        if path.exists() {
            let metadata = fs::metadata(path).await?;
            if metadata.is_dir() {
                println!("✓ {} directory: {}", name, path.display());
            } else {
                println!("✗ {} directory: {} (not a directory)", name, path.display());
            }
        } else {
            println!("⚠ {} directory: {} (will be created)", name, path.display());
        }
        Ok(())
    }

    /// Get the full path to a file in the config directory
    pub fn config_file(&self, filename: &str) -> PathBuf {
        self.paths.config_dir.join(filename)
    }

    /// CSV file holding the persisted calculation history
    pub fn history_file(&self) -> PathBuf {
        self.paths.history_dir.join(crate::HISTORY_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.paths.log_dir.join(crate::LOG_FILE)
    }

    /// Line-editor input history, kept next to the calculation history
    pub fn input_history_file(&self) -> PathBuf {
        self.paths.history_dir.join(crate::INPUT_HISTORY_FILE)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> CalcResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CalcError::config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_config_creation() {
        let config = Config::default();
        assert_eq!(config.calculator.max_history_size, 100);
        assert_eq!(config.calculator.precision, 2);
        assert!(config.calculator.auto_save);
        assert!(config.calculator.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = tempdir().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.calculator.precision = 4;
        config.repl.prompt = "=> ".to_string();
        config.save(Some(&config_file)).await.unwrap();

        let loaded = Config::load(Some(&config_file)).await.unwrap();
        assert_eq!(loaded.repl.prompt, "=> ");
        // a CALCULATOR_PRECISION set in the test environment would win
        if std::env::var("CALCULATOR_PRECISION").is_err() {
            assert_eq!(loaded.calculator.precision, 4);
        }
    }

    #[tokio::test]
    async fn test_invalid_toml_is_config_error() {
        let temp_dir = tempdir().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_file, "calculator = 3").await.unwrap();

        let result = Config::load(Some(&config_file)).await;
        assert!(matches!(result, Err(CalcError::Config { .. })));
    }

    #[tokio::test]
    async fn test_config_file_paths_are_expanded() {
        let temp_dir = tempdir().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.paths.history_dir = PathBuf::from("~/calc-history");
        config.save(Some(&config_file)).await.unwrap();

        let loaded = Config::load(Some(&config_file)).await.unwrap();
        if std::env::var("CALCULATOR_HISTORY_DIR").is_err() {
            assert!(!loaded.history_file().starts_with("~"));
            if let Some(home) = dirs::home_dir() {
                assert_eq!(
                    loaded.history_file(),
                    home.join("calc-history").join(crate::HISTORY_FILE)
                );
            }
        }
    }

    #[tokio::test]
    async fn test_partial_config_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_file, "[calculator]\nmax_history_size = 7\n")
            .await
            .unwrap();

        let loaded = Config::load(Some(&config_file)).await.unwrap();
        let defaults = Config::default();
        if std::env::var("CALCULATOR_MAX_HISTORY_SIZE").is_err() {
            assert_eq!(loaded.calculator.max_history_size, 7);
        }
        if std::env::var("CALCULATOR_PRECISION").is_err() {
            assert_eq!(loaded.calculator.precision, defaults.calculator.precision);
        }
        assert_eq!(loaded.repl.prompt, defaults.repl.prompt);
        assert_eq!(loaded.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides_from(lookup(&[
                ("CALCULATOR_MAX_HISTORY_SIZE", "5"),
                ("CALCULATOR_PRECISION", "3"),
                ("CALCULATOR_MAX_INPUT_VALUE", "1000"),
                ("CALCULATOR_AUTO_SAVE", "off"),
                ("CALCULATOR_HISTORY_DIR", "/tmp/calc-history"),
            ]))
            .unwrap();

        assert_eq!(config.calculator.max_history_size, 5);
        assert_eq!(config.calculator.precision, 3);
        assert_eq!(config.calculator.max_input_value, 1000.0);
        assert!(!config.calculator.auto_save);
        assert_eq!(
            config.history_file(),
            PathBuf::from("/tmp/calc-history").join(crate::HISTORY_FILE)
        );
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides_from(lookup(&[("CALCULATOR_PRECISION", "two")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid integer value for CALCULATOR_PRECISION: two"
        );
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut settings = CalculatorConfig::default();
        settings.max_history_size = 0;
        assert!(settings.validate().is_err());

        let mut settings = CalculatorConfig::default();
        settings.max_input_value = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = CalculatorConfig::default();
        settings.precision = 40;
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config::default();
        config.paths.config_dir = temp_dir.path().join("config");
        config.paths.history_dir = temp_dir.path().join("history");
        config.paths.log_dir = temp_dir.path().join("logs");

        let written = config.init(false).await.unwrap();
        assert!(written.exists());
        assert!(config.paths.history_dir.is_dir());
        assert!(matches!(config.init(false).await, Err(CalcError::Config { .. })));
        assert!(config.init(true).await.is_ok());
    }
}
