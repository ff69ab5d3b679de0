use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use thiserror::Error;

use crate::keys::KeyMaterial;

/// Environment variables with this prefix override file settings,
/// e.g. `LEGACY_TICKET_VALIDATION_KEY`.
pub const ENV_PREFIX: &str = "LEGACY_TICKET";

/// Cookie name used when the configuration does not set one.
pub const DEFAULT_COOKIE_NAME: &str = ".ASPXAUTH";

/// Failures that must stop startup. No request is served with bad keys.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key text is not valid hex")]
    InvalidKeyEncoding,

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: &'static str, actual: usize },

    #[error("{0} required in configuration")]
    MissingSetting(String),

    #[error("configuration error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Cookie and key settings for the legacy session ticket.
#[derive(Clone)]
pub struct Settings {
    /// Name of the cookie the HTTP layer reads the ticket from.
    pub auth_cookie_name: String,
    pub decryption_algorithm: String,
    pub decryption_key: String,
    pub validation_algorithm: String,
    pub validation_key: String,
    /// Whether the decrypted payload carries its own trailing digest.
    pub inner_digest: bool,
}

impl Settings {
    /// Loads settings from `config_filename`, overridden by the environment.
    pub fn load(config_filename: &str) -> Result<Settings, ConfigurationError> {
        let builder = defaults()?
            .add_source(File::with_name(config_filename))
            .add_source(Environment::with_prefix(ENV_PREFIX));
        let settings = Settings::from_config(&builder.build()?)?;
        log::info!(
            "Loaded ticket settings from {} (cookie {})",
            config_filename,
            settings.auth_cookie_name
        );
        Ok(settings)
    }

    /// Parses settings from in-memory text in the given format.
    pub fn from_str(text: &str, format: FileFormat) -> Result<Settings, ConfigurationError> {
        let builder = defaults()?.add_source(File::from_str(text, format));
        Settings::from_config(&builder.build()?)
    }

    fn from_config(settings: &Config) -> Result<Settings, ConfigurationError> {
        Ok(Settings {
            auth_cookie_name: required(settings, "auth_cookie_name")?,
            decryption_algorithm: required(settings, "decryption_algorithm")?,
            decryption_key: required(settings, "decryption_key")?,
            validation_algorithm: required(settings, "validation_algorithm")?,
            validation_key: required(settings, "validation_key")?,
            inner_digest: settings.get_bool("inner_digest")?,
        })
    }

    /// Builds the key material described by these settings.
    pub fn key_material(&self) -> Result<KeyMaterial, ConfigurationError> {
        let keys = KeyMaterial::from_hex(
            &self.decryption_algorithm,
            &self.decryption_key,
            &self.validation_algorithm,
            &self.validation_key,
        )?;
        log::info!(
            "Ticket keys ready: {:?} with {}-bit key, {:?} with {}-byte digest",
            keys.decryption_algorithm(),
            keys.decryption_key().len() * 8,
            keys.validation_algorithm(),
            keys.digest_size()
        );
        Ok(keys)
    }
}

// Keys never appear in debug output.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("decryption_algorithm", &self.decryption_algorithm)
            .field("validation_algorithm", &self.validation_algorithm)
            .field("inner_digest", &self.inner_digest)
            .finish()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigurationError> {
    Ok(Config::builder()
        .set_default("auth_cookie_name", DEFAULT_COOKIE_NAME)?
        .set_default("decryption_algorithm", "AES")?
        .set_default("validation_algorithm", "SHA1")?
        .set_default("inner_digest", false)?)
}

fn required(settings: &Config, key: &str) -> Result<String, ConfigurationError> {
    match settings.get_string(key) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Err(ConfigurationError::MissingSetting(key.to_string())),
        Err(e) => Err(e.into()),
    }
}
