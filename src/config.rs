//! Settings read from the environment (and a `.env` file, loaded by the binaries).

use std::time::Duration;

use crate::markdown::HeadingStyle;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub converter: ConverterSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ConverterSettings {
    pub heading_style: HeadingStyle,
    /// Name of the image folder created next to the Markdown output.
    pub images_dir_name: String,
    /// Upper bound for `hwp5html` / `soffice` runs.
    pub external_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            converter: ConverterSettings {
                heading_style: HeadingStyle::Atx,
                images_dir_name: "images".to_string(),
                external_timeout: Duration::from_secs(120),
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or unparsable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let heading_style = match get("HEADING_STYLE").map(|v| v.parse::<HeadingStyle>()) {
            Some(Ok(style)) => style,
            Some(Err(e)) => {
                log::warn!("HEADING_STYLE: {e}; using ATX");
                defaults.converter.heading_style
            }
            None => defaults.converter.heading_style,
        };

        Settings {
            api: ApiSettings {
                host: get("API_HOST").unwrap_or(defaults.api.host),
                port: get("API_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.api.port),
            },
            converter: ConverterSettings {
                heading_style,
                images_dir_name: get("IMAGES_DIR_NAME")
                    .unwrap_or(defaults.converter.images_dir_name),
                external_timeout: get("EXTERNAL_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.converter.external_timeout),
            },
            log: LogSettings {
                level: get("LOG_LEVEL")
                    .map(|v| v.to_ascii_lowercase())
                    .unwrap_or(defaults.log.level),
            },
        }
    }
}
