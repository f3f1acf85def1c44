//! Symmetric document encryption.
//!
//! A document is serialized, encrypted under a key derived from the caller's
//! passphrase, and base64 encoded for transport. Decryption reverses the
//! steps and must end in a valid serialized node; a wrong key and corrupted
//! ciphertext both surface as `DecryptionFailed`.
//!
//! Key schedule, with `H` the configured hash:
//!
//! - cipher key = `H(passphrase)`, truncated to the cipher's key size
//! - nonce = a fresh random value, prepended to the ciphertext
//!
//! `NonceStrategy::Derived` uses `H(H(passphrase))` as the nonce instead.
//! That reuses one nonce for every document sealed under the same key, so
//! it is only for callers who need byte-identical ciphertexts.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use base64::Engine;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use chacha20poly1305::ChaCha20Poly1305;
use jsonkit_core::{AlgorithmKind, Error, Node};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::serial;

const NONCE_LEN: usize = 12;

/// Block or stream cipher used for documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cipher {
    #[default]
    Aes256,
    Aes128,
    ChaCha20,
}

impl Cipher {
    fn key_len(&self) -> usize {
        match self {
            Cipher::Aes256 | Cipher::ChaCha20 => 32,
            Cipher::Aes128 => 16,
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cipher::Aes256 => "aes256",
            Cipher::Aes128 => "aes128",
            Cipher::ChaCha20 => "chacha20",
        })
    }
}

impl FromStr for Cipher {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "aes256" => Ok(Cipher::Aes256),
            "aes128" => Ok(Cipher::Aes128),
            "chacha20" => Ok(Cipher::ChaCha20),
            _ => Err(Error::unsupported(AlgorithmKind::Cipher, s)),
        }
    }
}

/// Hash used for the key schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(input).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(input).to_vec(),
            HashAlgorithm::Blake3 => blake3::hash(input).as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        })
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(Error::unsupported(AlgorithmKind::Hash, s)),
        }
    }
}

/// How blocks are chained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    /// Authenticated encryption: GCM for AES, Poly1305 for ChaCha20.
    #[default]
    Aead,
    /// Unauthenticated keystream. ChaCha20 only.
    Stream,
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockMode::Aead => "aead",
            BlockMode::Stream => "stream",
        })
    }
}

impl FromStr for BlockMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aead" | "gcm" => Ok(BlockMode::Aead),
            "stream" => Ok(BlockMode::Stream),
            _ => Err(Error::unsupported(AlgorithmKind::BlockMode, s)),
        }
    }
}

/// Where the nonce comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonceStrategy {
    /// `H(H(passphrase))`. Same key, same nonce.
    Derived,
    /// Random per encryption, stored in front of the ciphertext.
    #[default]
    Random,
}

/// Cipher, hash and mode triple plus nonce strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub cipher: Cipher,
    pub hash: HashAlgorithm,
    pub mode: BlockMode,
    pub nonce: NonceStrategy,
}

impl CryptoConfig {
    /// Reject cipher and mode pairs that have no implementation.
    pub fn validate(&self) -> Result<(), Error> {
        match (self.cipher, self.mode) {
            (Cipher::Aes256 | Cipher::Aes128, BlockMode::Stream) => Err(Error::unsupported(
                AlgorithmKind::BlockMode,
                format!("{} with {}", self.mode, self.cipher),
            )),
            _ => Ok(()),
        }
    }

    fn schedule(&self, passphrase: &str) -> KeySchedule {
        let first = self.hash.digest(passphrase.as_bytes());
        let second = self.hash.digest(&first);
        KeySchedule {
            key: first[..self.cipher.key_len()].to_vec(),
            nonce: second[..NONCE_LEN].to_vec(),
        }
    }
}

struct KeySchedule {
    key: Vec<u8>,
    nonce: Vec<u8>,
}

/// A fully custom encryption layer.
///
/// When a store has a hook attached, it is used for every import and export
/// in place of the built-in ciphers.
pub trait CryptoHook: Send + Sync {
    fn encrypt(&self, document: &Node, key: &str) -> Result<Vec<u8>, Error>;

    fn decrypt(&self, payload: &[u8], key: &str) -> Result<Node, Error>;
}

/// Serialize, encrypt and base64 encode a document.
pub fn encrypt(document: &Node, key: &str, config: &CryptoConfig) -> Result<String, Error> {
    config.validate()?;
    let plaintext = serial::to_bytes(document)?;
    let schedule = config.schedule(key);

    let nonce = match config.nonce {
        NonceStrategy::Derived => schedule.nonce.clone(),
        NonceStrategy::Random => {
            let mut nonce = vec![0u8; NONCE_LEN];
            rand::rngs::OsRng.fill_bytes(&mut nonce);
            nonce
        }
    };

    let ciphertext = apply(config, &schedule.key, &nonce, &plaintext, Direction::Encrypt)
        .map_err(|message| Error::Encryption { message })?;

    let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
    if config.nonce == NonceStrategy::Random {
        out.extend_from_slice(&nonce);
    }
    out.extend_from_slice(&ciphertext);
    Ok(base64::engine::general_purpose::STANDARD.encode(out))
}

/// Reverse [`encrypt`].
pub fn decrypt(payload: &[u8], key: &str, config: &CryptoConfig) -> Result<Node, Error> {
    config.validate()?;
    let raw = base64::engine::general_purpose::STANDARD
        .decode(payload.trim_ascii())
        .map_err(|_| Error::DecryptionFailed)?;
    let schedule = config.schedule(key);

    let (nonce, ciphertext) = match config.nonce {
        NonceStrategy::Derived => (schedule.nonce.as_slice(), raw.as_slice()),
        NonceStrategy::Random => {
            if raw.len() < NONCE_LEN {
                return Err(Error::DecryptionFailed);
            }
            raw.split_at(NONCE_LEN)
        }
    };

    let plaintext = apply(config, &schedule.key, nonce, ciphertext, Direction::Decrypt)
        .map_err(|message| {
            log::debug!("document decryption rejected: {}", message);
            Error::DecryptionFailed
        })?;

    serial::from_bytes(&plaintext).map_err(|_| Error::DecryptionFailed)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn apply(
    config: &CryptoConfig,
    key: &[u8],
    nonce: &[u8],
    input: &[u8],
    direction: Direction,
) -> Result<Vec<u8>, String> {
    match (config.cipher, config.mode) {
        (Cipher::Aes256, BlockMode::Aead) => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| e.to_string())?;
            aead(&cipher, nonce, input, direction)
        }
        (Cipher::Aes128, BlockMode::Aead) => {
            let cipher = Aes128Gcm::new_from_slice(key).map_err(|e| e.to_string())?;
            aead(&cipher, nonce, input, direction)
        }
        (Cipher::ChaCha20, BlockMode::Aead) => {
            let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|e| e.to_string())?;
            aead(&cipher, nonce, input, direction)
        }
        (Cipher::ChaCha20, BlockMode::Stream) => {
            let mut cipher = ChaCha20::new_from_slices(key, nonce).map_err(|e| e.to_string())?;
            let mut buffer = input.to_vec();
            cipher.apply_keystream(&mut buffer);
            Ok(buffer)
        }
        (cipher, mode) => Err(format!("{} with {} is not supported", mode, cipher)),
    }
}

fn aead<A: Aead>(
    cipher: &A,
    nonce: &[u8],
    input: &[u8],
    direction: Direction,
) -> Result<Vec<u8>, String> {
    let nonce = aes_gcm::aead::Nonce::<A>::from_slice(nonce);
    match direction {
        Direction::Encrypt => cipher.encrypt(nonce, input),
        Direction::Decrypt => cipher.decrypt(nonce, input),
    }
    .map_err(|_| "aead operation failed".to_string())
}
