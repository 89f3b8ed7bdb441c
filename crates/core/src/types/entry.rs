//! Directory entries and their parts.

use crate::constants::{SIGNATURE_BUF_LEN, SIGNATURE_HALF_LEN, SIGNATURE_PAIR_LEN};
use crate::errors::{Error, Result};
use crate::types::path::{PathName, UserName};
use crate::types::reference::CompositeRef;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// What kind of object an entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// A plain file
    None,
    Directory,
}

impl Attribute {
    /// Byte bound into the entry hash
    pub fn code(&self) -> u8 {
        match self {
            Attribute::None => 0,
            Attribute::Directory => 1,
        }
    }
}

/// How an entry's content is packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Packing {
    /// Content stored in the clear; the signature binds metadata only
    Plain,
}

impl Packing {
    /// Byte bound into the entry hash
    pub fn code(&self) -> u8 {
        match self {
            Packing::Plain => 1,
        }
    }
}

/// Change indicator derived from a file's modification time.
///
/// Two observations of the same file describe the same content exactly
/// when their versions are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Version {
    seconds: i64,
    nanos: u32,
}

impl Version {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Version { seconds, nanos }
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Version {
                seconds: i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
                nanos: d.subsec_nanos(),
            },
            Err(before) => {
                // Pre-epoch times still need a total order.
                let d = before.duration();
                let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
                if d.subsec_nanos() == 0 {
                    Version {
                        seconds: -secs,
                        nanos: 0,
                    }
                } else {
                    Version {
                        seconds: -secs - 1,
                        nanos: 1_000_000_000 - d.subsec_nanos(),
                    }
                }
            }
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Big-endian encoding used when hashing
    pub fn to_be_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..8].copy_from_slice(&self.seconds.to_be_bytes());
        out[8..].copy_from_slice(&self.nanos.to_be_bytes());
        out
    }
}

/// Where an entry's bytes live in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRef {
    /// Store endpoint that serves the bytes
    pub location: String,
    /// Local path relative to the served root, slash separated
    pub relative_path: String,
    /// Offset of this block within the logical file
    pub offset: u64,
    pub size: u64,
}

impl ContentRef {
    /// The composite reference a client hands to the store
    pub fn reference(&self) -> CompositeRef {
        CompositeRef::new(self.relative_path.clone(), self.offset)
    }
}

/// One signature, split into its R and S halves
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignaturePair {
    pub r: [u8; SIGNATURE_HALF_LEN],
    pub s: [u8; SIGNATURE_HALF_LEN],
}

impl SignaturePair {
    pub const ZERO: SignaturePair = SignaturePair {
        r: [0; SIGNATURE_HALF_LEN],
        s: [0; SIGNATURE_HALF_LEN],
    };

    pub fn from_bytes(bytes: &[u8; SIGNATURE_PAIR_LEN]) -> Self {
        let mut r = [0u8; SIGNATURE_HALF_LEN];
        let mut s = [0u8; SIGNATURE_HALF_LEN];
        r.copy_from_slice(&bytes[..SIGNATURE_HALF_LEN]);
        s.copy_from_slice(&bytes[SIGNATURE_HALF_LEN..]);
        SignaturePair { r, s }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_PAIR_LEN] {
        let mut out = [0u8; SIGNATURE_PAIR_LEN];
        out[..SIGNATURE_HALF_LEN].copy_from_slice(&self.r);
        out[SIGNATURE_HALF_LEN..].copy_from_slice(&self.s);
        out
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Debug for SignaturePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("SignaturePair(zero)");
        }
        write!(f, "SignaturePair(")?;
        for b in &self.r[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Fixed-size buffer holding a primary signature and an optional rotation
/// signature, laid out as `R1 S1 R2 S2`.
///
/// An absent rotation signature is all zeros.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBuf([u8; SIGNATURE_BUF_LEN]);

impl SignatureBuf {
    /// A buffer with no signatures at all
    pub fn zeroed() -> Self {
        SignatureBuf([0; SIGNATURE_BUF_LEN])
    }

    pub fn encode(primary: &SignaturePair, rotation: Option<&SignaturePair>) -> Self {
        let mut buf = [0u8; SIGNATURE_BUF_LEN];
        buf[..SIGNATURE_PAIR_LEN].copy_from_slice(&primary.to_bytes());
        let rotation = rotation.copied().unwrap_or(SignaturePair::ZERO);
        buf[SIGNATURE_PAIR_LEN..].copy_from_slice(&rotation.to_bytes());
        SignatureBuf(buf)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let buf: [u8; SIGNATURE_BUF_LEN] = bytes.try_into().map_err(|_| {
            Error::invalid(
                "signature",
                format!("expected {SIGNATURE_BUF_LEN} bytes, got {}", bytes.len()),
            )
        })?;
        Ok(SignatureBuf(buf))
    }

    /// The primary signature; `None` when the buffer is zeroed
    pub fn primary(&self) -> Option<SignaturePair> {
        self.pair(0)
    }

    /// The rotation signature, if one was packed
    pub fn rotation(&self) -> Option<SignaturePair> {
        self.pair(1)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_BUF_LEN] {
        &self.0
    }

    fn pair(&self, index: usize) -> Option<SignaturePair> {
        let start = index * SIGNATURE_PAIR_LEN;
        let mut bytes = [0u8; SIGNATURE_PAIR_LEN];
        bytes.copy_from_slice(&self.0[start..start + SIGNATURE_PAIR_LEN]);
        let pair = SignaturePair::from_bytes(&bytes);
        (!pair.is_zero()).then_some(pair)
    }
}

impl Default for SignatureBuf {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for SignatureBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureBuf")
            .field("primary", &self.primary())
            .field("rotation", &self.rotation())
            .finish()
    }
}

impl Serialize for SignatureBuf {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

/// Signed metadata describing one object in the name space.
///
/// Entries are built once and replaced, never edited in place; the cache
/// hands out shared references to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: PathName,
    /// The name bound into the signature
    pub signed_name: PathName,
    /// Always `None`; links are not followed or produced
    pub link: Option<PathName>,
    pub attr: Attribute,
    pub packing: Packing,
    pub version: Version,
    /// Always the name space owner
    pub writer: UserName,
    /// Present only for complete file entries
    pub content: Option<ContentRef>,
    pub signature: SignatureBuf,
    /// False when the caller may see the name but not the content
    pub complete: bool,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.attr == Attribute::Directory
    }

    /// Logical size in bytes; zero for directories and incomplete entries
    pub fn size(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.size)
    }

    /// Redact everything that reveals content: the content reference and
    /// the signature.
    pub fn mark_incomplete(&mut self) {
        self.content = None;
        self.signature = SignatureBuf::zeroed();
        self.complete = false;
    }
}
