//! Token signing secret configuration.
//!
//! The HS256 secret is read from a file whose path comes from the
//! environment. Release builds insist on a real secret; debug builds fall back
//! to a random one so local runs work without provisioning.

pub mod fingerprint;

use mockable::Env;
use rand::RngCore;
use std::path::PathBuf;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

const SECRET_DEFAULT_PATH: &str = "/var/run/secrets/token_secret";
/// Minimum secret length accepted in release builds.
pub const SECRET_MIN_LEN: usize = 32;
const SECRET_FILE_ENV: &str = "SHOP_TOKEN_SECRET_FILE";
const ALLOW_EPHEMERAL_ENV: &str = "SHOP_ALLOW_EPHEMERAL_SECRET";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for secret validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate a missing secret and warn.
    Debug,
    /// Release builds require a provisioned secret.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mechanic_shop::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub const fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Signing secret plus its log-safe fingerprint.
pub struct TokenSettings {
    /// Raw secret bytes, wiped on drop.
    pub secret: Zeroizing<Vec<u8>>,
    /// Whether the secret was generated for this process only.
    pub ephemeral: bool,
}

impl TokenSettings {
    /// Truncated SHA-256 fingerprint of the secret for startup logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint::secret_fingerprint(&self.secret)
    }
}

/// Errors raised while loading the signing secret.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A toggle is present but holds an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the secret file failed.
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret file is shorter than [`SECRET_MIN_LEN`] in release builds.
    #[error("token secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not generate throwaway secrets.
    #[error("SHOP_ALLOW_EPHEMERAL_SECRET must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Load the token secret from the environment and build mode.
///
/// # Examples
///
/// ```rust
/// use mechanic_shop::inbound::http::token_config::{BuildMode, token_settings_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let file = tempfile::NamedTempFile::new()?;
/// std::fs::write(file.path(), vec![b'k'; 32])?;
/// let path = file.path().to_string_lossy().into_owned();
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "SHOP_TOKEN_SECRET_FILE" => Some(path.clone()),
///     _ => None,
/// });
///
/// let settings = token_settings_from_env(&env, BuildMode::Release)?;
/// assert_eq!(settings.secret.len(), 32);
/// assert!(!settings.ephemeral);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// See [`TokenConfigError`].
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let path = PathBuf::from(
        env.string(SECRET_FILE_ENV)
            .unwrap_or_else(|| SECRET_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SECRET_MIN_LEN {
                bytes.zeroize();
                return Err(TokenConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: SECRET_MIN_LEN,
                });
            }
            Ok(TokenSettings {
                secret: Zeroizing::new(bytes),
                ephemeral: false,
            })
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary token secret (dev only)"
            );
            Ok(TokenSettings {
                secret: ephemeral_secret(),
                ephemeral: true,
            })
        }
        Err(error) => Err(TokenConfigError::SecretRead {
            path,
            source: error,
        }),
    }
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(vec![0_u8; SECRET_MIN_LEN * 2]);
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(TokenConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(
                value = %value,
                "invalid SHOP_ALLOW_EPHEMERAL_SECRET; defaulting to disabled"
            );
            Ok(false)
        }
        None => Err(TokenConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
