//! Service-scoped RSA key material.
//!
//! Each service owns four PEM files in the key directory, named
//! `<service><KeyType><TokenType>.pem` (e.g. `attendifyPublicAccess.pem`).
//! They are provisioned out-of-band; this module only reads them, and a
//! missing file is reported with everything needed to locate it.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::error;

/// Which token family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenType::Access => "Access",
            TokenType::Refresh => "Refresh",
        })
    }
}

/// Which half of the key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Private,
    Public,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyType::Private => "Private",
            KeyType::Public => "Public",
        })
    }
}

/// Key material errors. All of them are configuration errors.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("invalid service name {0:?}")]
    InvalidService(String),

    #[error(
        "unable to read {key_type} {token_type} key for service \"{service}\" from {}: {source}",
        .path.display()
    )]
    Unreadable {
        service: String,
        token_type: TokenType,
        key_type: KeyType,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "malformed {key_type} {token_type} key for service \"{service}\" at {}: {source}",
        .path.display()
    )]
    Malformed {
        service: String,
        token_type: TokenType,
        key_type: KeyType,
        path: PathBuf,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Resolves and reads per-service key files from a directory.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a key file. Service names are restricted to
    /// `[A-Za-z0-9_-]` so a token-supplied name cannot escape the directory.
    pub fn resolve_key_path(
        &self,
        service: &str,
        token_type: TokenType,
        key_type: KeyType,
    ) -> Result<PathBuf, KeyStoreError> {
        let valid = !service.is_empty()
            && service
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KeyStoreError::InvalidService(service.to_string()));
        }
        Ok(self.dir.join(format!("{service}{key_type}{token_type}.pem")))
    }

    /// Read a key file. Every call hits the filesystem.
    pub fn read_key(
        &self,
        service: &str,
        token_type: TokenType,
        key_type: KeyType,
    ) -> Result<Vec<u8>, KeyStoreError> {
        let path = self.resolve_key_path(service, token_type, key_type)?;
        std::fs::read(&path).map_err(|source| {
            error!(
                service,
                %token_type,
                %key_type,
                path = %path.display(),
                "failed to read key file: {source}"
            );
            KeyStoreError::Unreadable {
                service: service.to_string(),
                token_type,
                key_type,
                path,
                source,
            }
        })
    }

    pub(crate) fn malformed(
        &self,
        service: &str,
        token_type: TokenType,
        key_type: KeyType,
        source: jsonwebtoken::errors::Error,
    ) -> KeyStoreError {
        let path = self
            .resolve_key_path(service, token_type, key_type)
            .unwrap_or_else(|_| self.dir.clone());
        KeyStoreError::Malformed {
            service: service.to_string(),
            token_type,
            key_type,
            path,
            source,
        }
    }
}
