//! Entry signing and verification.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use localns_core::{
    Attribute, Entry, Error, Packing, PathName, Result, SignatureBuf, SignaturePair, Version,
    DIGEST_PLACEHOLDER_LEN, KEY_PLACEHOLDER_LEN, SIGNATURE_PAIR_LEN,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical fields of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHash(pub [u8; 32]);

/// The fields of an entry that a signature binds
pub struct CanonicalFields<'a> {
    pub signed_name: &'a PathName,
    pub link: Option<&'a PathName>,
    pub attr: Attribute,
    pub packing: Packing,
    pub version: Version,
}

impl<'a> CanonicalFields<'a> {
    pub fn of(entry: &'a Entry) -> Self {
        CanonicalFields {
            signed_name: &entry.signed_name,
            link: entry.link.as_ref(),
            attr: entry.attr,
            packing: entry.packing,
            version: entry.version,
        }
    }

    /// Hash the fields.
    ///
    /// Plain packing binds metadata only: the key and content digest slots
    /// are always zero-filled placeholders.
    pub fn hash(&self) -> EntryHash {
        let key = [0u8; KEY_PLACEHOLDER_LEN];
        let digest = [0u8; DIGEST_PLACEHOLDER_LEN];

        let mut h = Sha256::new();
        put_bytes(&mut h, self.signed_name.as_str().as_bytes());
        put_bytes(&mut h, self.link.map_or(&[][..], |l| l.as_str().as_bytes()));
        h.update([self.attr.code(), self.packing.code()]);
        h.update(self.version.to_be_bytes());
        put_bytes(&mut h, &key);
        put_bytes(&mut h, &digest);
        EntryHash(h.finalize().into())
    }
}

fn put_bytes(h: &mut Sha256, bytes: &[u8]) {
    h.update((bytes.len() as u32).to_be_bytes());
    h.update(bytes);
}

/// Signatures produced for one entry hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signatures {
    pub primary: SignaturePair,
    /// Signature with the previous key while a rotation is in progress
    pub rotation: Option<SignaturePair>,
}

impl Signatures {
    pub fn pack(&self) -> SignatureBuf {
        SignatureBuf::encode(&self.primary, self.rotation.as_ref())
    }
}

/// Signing collaborator
pub trait EntrySigner: Send + Sync {
    fn sign(&self, hash: &EntryHash) -> Result<Signatures>;
}

/// Holds the name space owner's signing keys
pub struct Factotum {
    current: SigningKey,
    previous: Option<SigningKey>,
}

impl Factotum {
    pub fn new(current: SigningKey) -> Self {
        Factotum {
            current,
            previous: None,
        }
    }

    /// A factotum with a fresh random key, for servers started without one
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    /// Also sign with `previous` so verifiers holding the old key keep working
    #[must_use]
    pub fn with_previous(mut self, previous: SigningKey) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.current.verifying_key()
    }

    pub fn previous_verifying_key(&self) -> Option<VerifyingKey> {
        self.previous.as_ref().map(SigningKey::verifying_key)
    }
}

impl std::fmt::Debug for Factotum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factotum")
            .field("current", &hex::encode(self.verifying_key().to_bytes()))
            .field("rotating", &self.previous.is_some())
            .finish()
    }
}

impl EntrySigner for Factotum {
    fn sign(&self, hash: &EntryHash) -> Result<Signatures> {
        let primary = to_pair(&self.current.sign(&hash.0));
        let rotation = self.previous.as_ref().map(|k| to_pair(&k.sign(&hash.0)));
        Ok(Signatures { primary, rotation })
    }
}

fn to_pair(sig: &Signature) -> SignaturePair {
    SignaturePair::from_bytes(&sig.to_bytes())
}

/// Check an entry's signature against `key`.
///
/// Either packed signature may match, so entries signed during a key
/// rotation verify under the old and the new key alike.
pub fn verify_entry(entry: &Entry, key: &VerifyingKey) -> Result<()> {
    let hash = CanonicalFields::of(entry).hash();
    let candidates = [entry.signature.primary(), entry.signature.rotation()];
    let verified = candidates.iter().flatten().any(|pair| {
        let bytes: [u8; SIGNATURE_PAIR_LEN] = pair.to_bytes();
        key.verify(&hash.0, &Signature::from_bytes(&bytes)).is_ok()
    });
    if verified {
        Ok(())
    } else {
        Err(Error::invalid(
            "signature",
            format!("{}: no signature matches key", entry.name),
        ))
    }
}
