//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "fidelity.toml",
    "./config/config.toml",
    "/etc/fidelity/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup);

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("FIDELITY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment overrides on top of file/default values.
///
/// Unparseable numeric values are ignored and the previous value kept.
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("FIDELITY_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(port) = lookup("FIDELITY_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("FIDELITY_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // MongoDB
    if let Some(val) = lookup("FIDELITY_MONGODB_URI") {
        config.mongodb.uri = Some(val);
    }
    if let Some(val) = lookup("DB_HOST") {
        config.mongodb.host = val;
    }
    if let Some(port) = lookup("DB_PORT").and_then(|v| v.parse().ok()) {
        config.mongodb.port = port;
    }
    if let Some(val) = lookup("DB_USER") {
        config.mongodb.user = Some(val);
    }
    if let Some(val) = lookup("DB_PASS") {
        config.mongodb.password = Some(val);
    }
    if let Some(val) = lookup("DB_NAME") {
        config.mongodb.database = val;
    }

    // Auth
    if let Some(val) = lookup("SECRET_KEY") {
        config.auth.secret_key = val;
    }
    if let Some(val) = lookup("ALGORITHM") {
        config.auth.algorithm = val;
    }
    if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES").and_then(|v| v.parse().ok()) {
        config.auth.access_token_expire_minutes = minutes;
    }

    // Bootstrap
    if let Some(val) = lookup("FIDELITY_BOOTSTRAP_ADMIN_USER") {
        config.bootstrap.admin_user_name = Some(val);
    }
    if let Some(val) = lookup("FIDELITY_BOOTSTRAP_ADMIN_PASSWORD") {
        config.bootstrap.admin_password = Some(val);
    }
    if let Some(val) = lookup("FIDELITY_BOOTSTRAP_TIMEZONE") {
        config.bootstrap.timezone = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_legacy_env_names_override_defaults() {
        let lookup = lookup_from(&[
            ("DB_HOST", "mongo"),
            ("DB_PORT", "27019"),
            ("DB_USER", "svc"),
            ("DB_PASS", "pw"),
            ("DB_NAME", "fidelity_test"),
            ("SECRET_KEY", "k"),
            ("ALGORITHM", "HS384"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "90"),
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &lookup);

        assert_eq!(config.mongodb.connection_uri(), "mongodb://svc:pw@mongo:27019");
        assert_eq!(config.mongodb.database, "fidelity_test");
        assert_eq!(config.auth.secret_key, "k");
        assert_eq!(config.auth.algorithm, "HS384");
        assert_eq!(config.auth.access_token_expire_minutes, 90);
    }

    #[test]
    fn test_bad_numbers_are_ignored() {
        let lookup = lookup_from(&[
            ("FIDELITY_HTTP_PORT", "not-a-port"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "soon"),
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &lookup);

        assert_eq!(config.http.port, 5000);
        assert_eq!(config.auth.access_token_expire_minutes, 30);
    }

    #[test]
    fn test_cors_origins_split() {
        let lookup = lookup_from(&[("FIDELITY_CORS_ORIGINS", "http://a, http://b,,")]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &lookup);
        assert_eq!(config.http.cors_origins, vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[http]\nport = 8080\n\n[auth]\nsecret_key = \"from-file\"\n\n[bootstrap]\ntimezone = \"Europe/Paris\""
        )
        .unwrap();

        let loader = ConfigLoader::with_path(file.path());
        let config = loader
            .load_with(lookup_from(&[("SECRET_KEY", "from-env")]))
            .unwrap();

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.auth.secret_key, "from-env");
        assert_eq!(config.bootstrap.timezone, "Europe/Paris");
        assert_eq!(config.auth.algorithm, "HS256");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let result = ConfigLoader::with_path(file.path()).load_with(|_| None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
