//! Key files: a hex-encoded 32-byte ed25519 seed on a single line.

use crate::signing::Factotum;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use localns_core::{Error, Result};
use rand::rngs::OsRng;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn load_signing_key(path: &Path) -> Result<SigningKey> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, "read key", e))?;
    let bytes = hex::decode(text.trim()).map_err(|e| {
        Error::configuration(format!("key file '{}': {e}", path.display()))
    })?;
    let seed: [u8; SECRET_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        Error::configuration(format!(
            "key file '{}': expected {SECRET_KEY_LENGTH} bytes, got {}",
            path.display(),
            bytes.len()
        ))
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

/// Generate a key and write it to `path`, readable by the owner only.
/// Refuses to overwrite an existing file.
pub fn generate_key_file(path: &Path) -> Result<SigningKey> {
    let key = SigningKey::generate(&mut OsRng);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| Error::io(path, "create key", e))?;
    writeln!(file, "{}", hex::encode(key.to_bytes())).map_err(|e| Error::io(path, "write key", e))?;

    tracing::info!(path = %path.display(), "generated signing key");
    Ok(key)
}

/// Build a factotum from key files; an absent current key yields a random one.
pub fn load_factotum(current: Option<&Path>, previous: Option<&Path>) -> Result<Factotum> {
    let factotum = match current {
        Some(path) => Factotum::new(load_signing_key(path)?),
        None => {
            tracing::warn!("no signing key configured; entries are signed with an ephemeral key");
            Factotum::generate()
        }
    };
    match previous {
        Some(path) => Ok(factotum.with_previous(load_signing_key(path)?)),
        None => Ok(factotum),
    }
}
