//! Configuration error types.
//!
//! None of these stop the daemon: every error makes the loader fall back to
//! the built-in defaults. They exist so the reason can be logged.

use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory could be determined for this user.
    #[error("設定ディレクトリが見つかりません")]
    NoConfigDir,

    /// The config file does not exist.
    #[error("設定ファイルが見つかりません: {0}")]
    NotFound(String),

    /// The config file exists but could not be read.
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    ReadError(String),

    /// The config file is not valid JSON for this schema.
    #[error("設定ファイルの解析に失敗しました: {0}")]
    ParseError(String),

    /// The config file parsed but holds unusable values.
    #[error("設定値が不正です: {0}")]
    InvalidValue(String),
}

impl ConfigError {
    /// Returns true if the file simply is not there.
    ///
    /// A missing file is the normal case and is not worth a warning.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NoConfigDir | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::NotFound("/tmp/config.json".to_string());
        assert!(err.to_string().contains("/tmp/config.json"));

        let err = ConfigError::ParseError("expected value".to_string());
        assert!(err.to_string().contains("expected value"));
        assert!(err.to_string().contains("解析"));

        let err = ConfigError::InvalidValue("zero".to_string());
        assert!(err.to_string().contains("不正"));
    }

    #[test]
    fn test_is_missing() {
        assert!(ConfigError::NoConfigDir.is_missing());
        assert!(ConfigError::NotFound("x".into()).is_missing());
        assert!(!ConfigError::ReadError("x".into()).is_missing());
        assert!(!ConfigError::ParseError("x".into()).is_missing());
        assert!(!ConfigError::InvalidValue("x".into()).is_missing());
    }
}
