use crate::events::ProtectedSet;
use crate::services::drag_state::DragTimings;
use crate::zones::ZoneGeometry;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub detector: DetectorConfig,
    pub zones: ZoneGeometry,
    pub timing: DragTimings,
    /// Окна, которые никогда не перетаскиваются (hex `0x...` или десятичные XID)
    pub protected: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub poll_interval_ms: u64,
    pub max_consecutive_failures: u32,
    /// X-дисплей, `None` - взять из `$DISPLAY`
    pub display: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30,
            max_consecutive_failures: 3,
            display: None,
        }
    }
}

/// Переопределения из командной строки, применяются поверх файла и окружения
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub protected: Vec<String>,
    pub poll_interval_ms: Option<u64>,
    pub display: Option<String>,
}

impl Config {
    pub fn load_with<P: AsRef<Path>>(config_path: P, overrides: &Overrides) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: остаются значения по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SNAPZONE_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        // Идентификаторы из командной строки дополняют список из файла
        self.protected.extend(overrides.protected.iter().cloned());

        if let Some(poll_interval_ms) = overrides.poll_interval_ms {
            self.detector.poll_interval_ms = poll_interval_ms;
        }
        if let Some(display) = &overrides.display {
            self.detector.display = Some(display.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация цикла опроса
        if !(5..=1000).contains(&self.detector.poll_interval_ms) {
            anyhow::bail!(
                "poll_interval_ms должно быть в диапазоне 5..=1000 (получено {})",
                self.detector.poll_interval_ms
            );
        }

        if self.detector.max_consecutive_failures == 0 {
            anyhow::bail!("max_consecutive_failures должно быть больше 0");
        }

        // Валидация геометрии зон
        self.zones.validate()?;

        // Валидация защищённых окон
        ProtectedSet::parse(&self.protected)
            .map_err(|e| anyhow::anyhow!("Неверный список защищённых окон: {}", e))?;

        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.detector.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.poll_interval_ms, 30);
        assert_eq!(config.zones.always_top_px, 40);
        assert_eq!(config.timing.edge_hold_ms, 100);
        assert_eq!(config.timing.grace_period_ms, 500);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_with("/nonexistent/snapzone.toml", &Overrides::default()).unwrap();
        assert_eq!(config.zones, ZoneGeometry::default());
        assert!(config.protected.is_empty());
    }

    #[test]
    fn test_load_partial_toml() {
        let path = std::env::temp_dir().join(format!("snapzone-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
protected = ["0x1a00003"]

[zones]
top_band_px = 100

[timing]
edge_hold_ms = 150
"#
        )
        .unwrap();

        let overrides = Overrides {
            protected: vec!["0x1b00004".to_string()],
            poll_interval_ms: Some(40),
            display: Some(":1".to_string()),
        };
        let config = Config::load_with(&path, &overrides).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.zones.top_band_px, 100);
        assert_eq!(config.zones.edge_band_px, 30);
        assert_eq!(config.timing.edge_hold_ms, 150);
        assert_eq!(config.timing.top_hold_ms, 0);
        assert_eq!(config.protected, vec!["0x1a00003", "0x1b00004"]);
        assert_eq!(config.detector.poll_interval_ms, 40);
        assert_eq!(config.detector.display.as_deref(), Some(":1"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.detector.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detector.max_consecutive_failures = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.protected = vec!["not-a-window".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.zones.always_top_px = 120;
        assert!(config.validate().is_err());
    }
}
