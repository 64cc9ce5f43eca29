//! Lifecycle of the server's P-256 push key pair.
//!
//! A single key pair signs every push request and its public half is handed to
//! browsers when they subscribe. It is created lazily on first use, persisted
//! through a [`KeyStore`] and reused for the life of the deployment.

use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::storage::KeyStore;
use log::*;
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;
use std::fmt;
use std::sync::Arc;

/// Width in bytes of a P-256 coordinate or scalar.
pub const COORDINATE_WIDTH: usize = 32;

/// SEC1 tag of an uncompressed curve point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Raw components of the server key: the public point `(x, y)` and the private scalar `d`.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerKeyPair {
    x: Vec<u8>,
    y: Vec<u8>,
    d: Vec<u8>,
}

impl ServerKeyPair {
    pub fn generate() -> Result<Self, Error> {
        let signing_key = SigningKey::random(&mut OsRng);
        let point = VerifyingKey::from(&signing_key).to_encoded_point(false);

        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::KeyUnavailable),
            });
        };

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d: signing_key.to_bytes().to_vec(),
        })
    }

    pub fn from_parts(x: Vec<u8>, y: Vec<u8>, d: Vec<u8>) -> Self {
        Self { x, y, d }
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    pub fn d(&self) -> &[u8] {
        &self.d
    }

    /// The 65-byte uncompressed point `0x04 || X || Y` that browsers expect as
    /// `applicationServerKey`.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + 2 * COORDINATE_WIDTH);
        bytes.push(UNCOMPRESSED_POINT_TAG);
        bytes.extend_from_slice(&fixed_width(&self.x));
        bytes.extend_from_slice(&fixed_width(&self.y));
        bytes
    }

    /// The private scalar as exactly 32 big-endian bytes.
    pub fn private_key_bytes(&self) -> Vec<u8> {
        fixed_width(&self.d).to_vec()
    }
}

impl fmt::Debug for ServerKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerKeyPair")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &"[redacted]")
            .finish()
    }
}

// Stored values may have lost leading zero bytes, or carry extra leading bytes.
// Either way the value is the trailing 32 bytes, left-padded with zeros.
fn fixed_width(bytes: &[u8]) -> [u8; COORDINATE_WIDTH] {
    let mut out = [0u8; COORDINATE_WIDTH];
    if bytes.len() >= COORDINATE_WIDTH {
        out.copy_from_slice(&bytes[bytes.len() - COORDINATE_WIDTH..]);
    } else {
        out[COORDINATE_WIDTH - bytes.len()..].copy_from_slice(bytes);
    }
    out
}

#[derive(Clone)]
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
}

impl KeyManager {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Returns the stored key pair, generating and persisting one when none exists yet.
    ///
    /// Two first-time callers racing here may both generate a key; the last write
    /// wins and the other caller's key is discarded.
    pub async fn get_or_create_keys(&self) -> Result<ServerKeyPair, Error> {
        match self.store.read_key().await {
            Ok(Some(key)) => return Ok(key),
            Ok(None) => {}
            Err(err) => {
                warn!("Failed to read the server key: {err}");
                return Err(key_unavailable(err));
            }
        }

        info!("No server key found, generating a new P-256 key pair");
        let key = ServerKeyPair::generate()?;

        if let Err(err) = self.store.write_key(&key).await {
            error!("Failed to persist the generated server key: {err}");
            return Err(key_unavailable(err));
        }

        Ok(key)
    }

    pub async fn public_key_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.get_or_create_keys().await?.public_key_bytes())
    }
}

fn key_unavailable(source: Error) -> Error {
    Error {
        source: Some(Box::new(source)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::KeyUnavailable),
    }
}
