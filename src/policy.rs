//! Pluggable decisions of the interceptor: which qop to answer with, and where client nonces
//! come from.

use crate::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Picks one qop from the options offered by the server.
/// `None` answers in legacy mode (RFC 2069), without qop, cnonce, or nc.
pub trait QopPolicy: Send + Sync {
    fn select(&self, offered: &[String]) -> Option<String>;
}

/// Take whatever the server listed first
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstOffered;

impl QopPolicy for FirstOffered {
    fn select(&self, offered: &[String]) -> Option<String> {
        offered.first().cloned()
    }
}

impl<F> QopPolicy for F
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    fn select(&self, offered: &[String]) -> Option<String> {
        self(offered)
    }
}

/// Produces client nonces
pub trait CnonceSource: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Hex-encoded random bytes from the operating system RNG
#[derive(Debug, Clone, Copy)]
pub struct RandomCnonce {
    len: usize,
}

impl RandomCnonce {
    /// Nonce of `len` random bytes (twice as many hex characters)
    pub fn new(len: usize) -> Self {
        RandomCnonce { len }
    }
}

impl Default for RandomCnonce {
    /// 16 bytes
    fn default() -> Self {
        RandomCnonce::new(16)
    }
}

impl CnonceSource for RandomCnonce {
    fn generate(&self) -> Result<String> {
        let mut bytes = vec![0u8; self.len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::RandomSource(e.to_string()))?;
        Ok(hex::encode(bytes))
    }
}

/// Always the same cnonce. Use only for tests.
#[derive(Debug, Clone)]
pub struct FixedCnonce(pub String);

impl FixedCnonce {
    pub fn new(cnonce: impl Into<String>) -> Self {
        FixedCnonce(cnonce.into())
    }
}

impl CnonceSource for FixedCnonce {
    fn generate(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

impl<F> CnonceSource for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn generate(&self) -> Result<String> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_offered() {
        let offered = vec!["auth-int".to_string(), "auth".to_string()];
        assert_eq!(FirstOffered.select(&offered).as_deref(), Some("auth-int"));
        assert_eq!(FirstOffered.select(&[]), None);
    }

    #[test]
    fn test_closure_policy() {
        let prefer_auth = |offered: &[String]| offered.iter().find(|q| *q == "auth").cloned();
        let offered = vec!["auth-int".to_string(), "auth".to_string()];
        assert_eq!(prefer_auth.select(&offered).as_deref(), Some("auth"));
    }

    #[test]
    fn test_random_cnonce() {
        let source = RandomCnonce::default();
        let a = source.generate().unwrap();
        let b = source.generate().unwrap();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_and_failing_sources() {
        assert_eq!(FixedCnonce::new("0a4f113b").generate().unwrap(), "0a4f113b");

        let broken = || -> Result<String> { Err(Error::RandomSource("no entropy".into())) };
        assert_eq!(
            broken.generate(),
            Err(Error::RandomSource("no entropy".into()))
        );
    }
}
