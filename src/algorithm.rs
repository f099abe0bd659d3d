use crate::{Error, Result};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use digest::{Digest, DynDigest};
use md5::Md5;
use sha2::{Sha256, Sha512, Sha512_256};

/// Hash function behind a digest algorithm name
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum HashAlgorithm {
    MD5,
    SHA2_256,
    SHA2_512,
    SHA2_512_256,
}

/// Names accepted in the `algorithm` challenge field (upper-cased, without `-sess`).
/// The empty name is an absent field, which RFC 2617 treats as MD5.
const REGISTRY: [(&str, HashAlgorithm); 5] = [
    ("", HashAlgorithm::MD5),
    ("MD5", HashAlgorithm::MD5),
    ("SHA-256", HashAlgorithm::SHA2_256),
    ("SHA-512", HashAlgorithm::SHA2_512),
    ("SHA-512-256", HashAlgorithm::SHA2_512_256),
];

const SESS_SUFFIX: &str = "-sess";

impl HashAlgorithm {
    /// Look up a base algorithm name (case-insensitive) in the registry
    pub fn lookup(name: &str) -> Option<HashAlgorithm> {
        REGISTRY
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, h)| h)
    }

    fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            HashAlgorithm::MD5 => Box::new(Md5::new()),
            HashAlgorithm::SHA2_256 => Box::new(Sha256::new()),
            HashAlgorithm::SHA2_512 => Box::new(Sha512::new()),
            HashAlgorithm::SHA2_512_256 => Box::new(Sha512_256::new()),
        }
    }

    /// Calculate a hex-encoded hash of bytes. A fresh hasher is created on every call.
    pub fn hash(self, bytes: &[u8]) -> String {
        let mut hash = self.hasher();
        hash.update(bytes);
        hex::encode(hash.finalize())
    }

    /// Calculate a hash of string's bytes
    pub fn hash_str(self, s: &str) -> String {
        self.hash(s.as_bytes())
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::MD5 => "MD5",
            HashAlgorithm::SHA2_256 => "SHA-256",
            HashAlgorithm::SHA2_512 => "SHA-512",
            HashAlgorithm::SHA2_512_256 => "SHA-512-256",
        }
    }
}

/// Algorithm and the -sess flag pair
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Algorithm {
    pub hash: HashAlgorithm,
    pub sess: bool,
}

impl Algorithm {
    /// Compose from hash function and the -sess flag
    pub fn new(hash: HashAlgorithm, sess: bool) -> Algorithm {
        Algorithm { hash, sess }
    }

    /// Resolve an `algorithm` field value as sent by the server.
    ///
    /// The `-sess` suffix is stripped and matched case-insensitively; what is left must be in
    /// the registry. An empty value resolves to plain MD5.
    ///
    /// # Errors
    /// [`Error::AlgorithmNotImplemented`] for anything outside the registry.
    pub fn resolve(name: &str) -> Result<Algorithm> {
        let (base, sess) = match strip_suffix_ignore_case(name, SESS_SUFFIX) {
            // a bare "-sess" names no hash function
            Some(base) if base.is_empty() => {
                return Err(Error::AlgorithmNotImplemented(name.to_string()))
            }
            Some(base) => (base, true),
            None => (name, false),
        };

        HashAlgorithm::lookup(base)
            .map(|hash| Algorithm::new(hash, sess))
            .ok_or_else(|| Error::AlgorithmNotImplemented(name.to_string()))
    }

    pub fn hash(self, bytes: &[u8]) -> String {
        self.hash.hash(bytes)
    }

    pub fn hash_str(self, s: &str) -> String {
        self.hash.hash_str(s)
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    if tail.eq_ignore_ascii_case(suffix) {
        Some(head)
    } else {
        None
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::resolve(s)
    }
}

impl Default for Algorithm {
    /// Get a MD5 instance
    fn default() -> Self {
        Algorithm::new(HashAlgorithm::MD5, false)
    }
}

impl Display for Algorithm {
    /// Format to the form used in HTTP headers
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.hash.name())?;

        if self.sess {
            f.write_str(SESS_SUFFIX)?;
        }

        Ok(())
    }
}

/// QOP field values
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Qop {
    AUTH,
    AUTH_INT,
}

impl FromStr for Qop {
    type Err = Error;

    /// Parse from "auth" or "auth-int" as used in HTTP headers
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auth") {
            Ok(Qop::AUTH)
        } else if s.eq_ignore_ascii_case("auth-int") {
            Ok(Qop::AUTH_INT)
        } else {
            Err(Error::QopNotSupported(s.into()))
        }
    }
}

impl Display for Qop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Qop::AUTH => "auth",
            Qop::AUTH_INT => "auth-int",
        })
    }
}
