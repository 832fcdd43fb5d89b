//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    I18nSettings,
};

/// Name of the optional settings file looked up next to the host's data.
const SETTINGS_FILE: &str = ".bot-i18n.json";

/// Load settings from a directory, if a settings file is present.
///
/// `.bot-i18n.json` ファイルを探して読み込む
///
/// # Returns
/// - `Ok(Some(settings))`: settings file found and parsed
/// - `Ok(None)`: no settings file in `dir`
/// - `Err(ConfigError)`: read or parse failure
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub fn load_from_dir(dir: &Path) -> Result<Option<I18nSettings>, ConfigError> {
    let config_path = dir.join(SETTINGS_FILE);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: I18nSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    /// `load_from_dir`: 設定ファイルが存在する場合
    #[rstest]
    fn test_load_from_dir_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"defaultLocale": "cn", "useSession": true}"#;
        fs::write(temp_dir.path().join(".bot-i18n.json"), config_content).unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(result.is_ok());
        let settings = result.unwrap();
        assert!(settings.is_some());
        let settings = settings.unwrap();
        assert_eq!(settings.default_locale, "cn");
        assert!(settings.use_session);
    }

    /// `load_from_dir`: 設定ファイルが存在しない場合
    #[rstest]
    fn test_load_from_dir_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    /// `load_from_dir`: JSON パースエラー
    #[rstest]
    fn test_load_from_dir_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".bot-i18n.json"), "invalid json").unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(result.is_err());
    }
}
