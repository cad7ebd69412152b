use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides.
///
/// Nested keys are separated by a double underscore, so
/// `CINEMATCH_SEARCH__PROVIDER_TIMEOUT_MS` sets `search.provider_timeout_ms`
/// and `CINEMATCH_PROVIDERS__TMDB__API_KEY` sets `providers.tmdb.api_key`.
/// A single underscore stays part of the key name, which is why the split
/// is on `__` and not `_`.
const ENV_PREFIX: &str = "CINEMATCH_";

/// Layered sources: the TOML file first, then `CINEMATCH_*` variables on top.
fn sources(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from a TOML file with environment overrides.
///
/// A missing file is reported as [`ConfigError::FileNotFound`] rather than
/// silently falling back to environment-only settings.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    sources(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse configuration from a TOML string.
///
/// Goes straight through `toml` without figment, so `CINEMATCH_*` variables
/// in the environment never leak into the result. Tests rely on that.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[search]
provider_timeout_ms = 750

[providers.tmdb]
api_key = "key"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.search.provider_timeout_ms, 750);
    }

    #[test]
    fn test_load_config_from_str_missing_providers() {
        let toml = r#"
[database]
path = "movies.db"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_from_str_reads_streaming_expand() {
        let toml = r#"
[search]
streaming_expand = ["synopsis"]

[providers.tmdb]
api_key = "key"

[providers.streaming]
api_key = "catalog-key"
base_url = "https://catalog.example.com"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.search.streaming_expand,
            vec![crate::provider::ExpandField::Synopsis]
        );
        assert!(config.providers.streaming.is_some());
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[database]
path = "/tmp/cinematch-test.db"

[providers.tmdb]
api_key = "file-key"

[providers.reviews]
api_key = "review-key"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/tmp/cinematch-test.db"
        );
        assert_eq!(config.providers.tmdb.api_key, "file-key");
        assert!(config.providers.reviews.is_some());
        assert!(config.providers.streaming.is_none());
    }
}
