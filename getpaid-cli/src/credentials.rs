//! Credential loading for the CLI.
//!
//! Sources, in order:
//!
//! 1. **Flags / environment** - `--api-key`, `--bearer-token`, `--token`
//!    (`GETPAID_API_KEY`, `GETPAID_BEARER_TOKEN`, `GETPAID_TOKEN`)
//! 2. **Keychain** - API key stored with `getpaid auth set-key`
//!
//! The keychain is consulted only when no flag or variable supplies any
//! credential, so an explicit bearer token is never outranked by a stored key.

use getpaid_http::CredentialConfig;
use tracing::{debug, instrument, warn};

use crate::Cli;

// ============================================================================
// Constants
// ============================================================================

/// Keychain service name.
const KEYCHAIN_SERVICE: &str = "getpaid";

/// Keychain account holding the API key.
const KEYCHAIN_ACCOUNT: &str = "api_key";

// ============================================================================
// Source
// ============================================================================

/// Where the credentials for an invocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Command-line flag or `GETPAID_*` variable.
    Flags,
    /// System keychain.
    Keychain,
    /// Nothing found.
    None,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flags => write!(f, "flags/environment"),
            Self::Keychain => write!(f, "keychain"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Credentials given directly on the command line or via environment.
pub fn from_cli(cli: &Cli) -> CredentialConfig {
    CredentialConfig {
        api_key: non_empty(cli.api_key.as_deref()),
        bearer_token: non_empty(cli.bearer_token.as_deref()),
        token: non_empty(cli.token.as_deref()),
        ..Default::default()
    }
}

/// Resolves the credentials for this invocation.
pub fn resolve(cli: &Cli) -> (CredentialConfig, CredentialSource) {
    resolve_with(from_cli(cli), KeychainStore::load)
}

fn resolve_with(
    explicit: CredentialConfig,
    keychain: impl FnOnce() -> Option<String>,
) -> (CredentialConfig, CredentialSource) {
    if has_any(&explicit) {
        debug!(source = "flags", "Using explicit credentials");
        return (explicit, CredentialSource::Flags);
    }

    match keychain() {
        Some(api_key) => {
            debug!(source = "keychain", "Using stored API key");
            (
                CredentialConfig {
                    api_key: Some(api_key),
                    ..Default::default()
                },
                CredentialSource::Keychain,
            )
        }
        None => (explicit, CredentialSource::None),
    }
}

fn has_any(config: &CredentialConfig) -> bool {
    config.api_key.is_some() || config.bearer_token.is_some() || config.token.is_some()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Masks a secret for display, keeping a short prefix and suffix.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{prefix}...{suffix}")
}

// ============================================================================
// Keychain Store
// ============================================================================

/// API key storage in the system keychain.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeychainStore;

impl KeychainStore {
    /// Loads the stored API key, if any.
    #[instrument]
    pub fn load() -> Option<String> {
        let entry = match keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Keychain unavailable");
                return None;
            }
        };

        match entry.get_password() {
            Ok(key) if !key.is_empty() => Some(key),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read keychain");
                None
            }
        }
    }

    /// Stores the API key, replacing any previous one.
    #[instrument(skip(api_key))]
    pub fn save(api_key: &str) -> Result<(), keyring::Error> {
        keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)?.set_password(api_key)?;
        debug!("API key saved to keychain");
        Ok(())
    }

    /// Removes the stored API key. Returns false if none was stored.
    #[instrument]
    pub fn delete() -> Result<bool, keyring::Error> {
        match keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
