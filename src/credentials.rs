use crate::algorithm::{Algorithm, Qop};
use crate::utils::QuoteForDigest;
use crate::Result;
use bytes::Bytes;
use std::fmt::Write;

/// Everything needed to answer one challenge.
///
/// Built fresh for every response by [`DigestTransport`](crate::DigestTransport) and dropped
/// right after; nothing in here is meant to be stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login username
    pub username: String,
    /// Login password (plain)
    pub password: String,

    /// Realm from the challenge
    pub realm: String,
    /// Server nonce from the challenge
    pub nonce: String,
    /// How many requests have been signed with this server nonce, this one included
    pub nonce_count: u32,
    /// Server opaque string, echoed back if present
    pub opaque: Option<String>,
    /// The qop chosen from the server's list. None in legacy compat mode (RFC 2069)
    pub qop: Option<String>,
    /// Algorithm as named by the server; a `-sess` suffix enables session keying
    pub algorithm: String,
    /// The server asked for a hashed username
    pub userhash: bool,

    /// Server nonce latched at the start of the session (session keying only)
    pub nonce_prime: String,
    /// Client nonce latched at the start of the session (session keying only)
    pub cnonce_prime: String,

    /// HTTP method of the request being signed
    pub method: String,
    /// Request target (path and query)
    pub uri: String,
    /// Request payload body, hashed for auth-int
    pub body: Bytes,
    /// Client nonce for this response
    pub cnonce: String,
}

impl Credentials {
    /// Resolve the hash function named by the challenge
    pub fn algorithm(&self) -> Result<Algorithm> {
        Algorithm::resolve(&self.algorithm)
    }

    fn qop(&self) -> Result<Option<Qop>> {
        match self.qop.as_deref() {
            None | Some("") => Ok(None),
            Some(q) => q.parse().map(Some),
        }
    }

    fn a1(&self, algo: Algorithm) -> String {
        let mut a1 = format!("{}:{}:{}", self.username, self.realm, self.password);
        if algo.sess {
            // session pair, not this request's nonces
            let _ = write!(a1, ":{}:{}", self.nonce_prime, self.cnonce_prime);
        }
        a1
    }

    fn a2(&self, algo: Algorithm, qop: Option<Qop>) -> String {
        match qop {
            Some(Qop::AUTH_INT) => format!(
                "{}:{}:{}",
                self.method,
                self.uri,
                algo.hash(&self.body)
            ),
            _ => format!("{}:{}", self.method, self.uri),
        }
    }

    /// Compute the digest `response` value.
    ///
    /// # Errors
    /// - [`Error::AlgorithmNotImplemented`](crate::Error::AlgorithmNotImplemented) for an unknown
    ///   algorithm
    /// - [`Error::QopNotSupported`](crate::Error::QopNotSupported) for a qop other than `auth` or
    ///   `auth-int`
    pub fn response(&self) -> Result<String> {
        let algo = self.algorithm()?;
        let qop = self.qop()?;
        Ok(self.compute_response(algo, qop))
    }

    fn compute_response(&self, algo: Algorithm, qop: Option<Qop>) -> String {
        let ha1 = algo.hash_str(&self.a1(algo));
        let ha2 = algo.hash_str(&self.a2(algo, qop));

        let kd = match qop {
            Some(q) => format!(
                "{ha1}:{nonce}:{nc:08x}:{cnonce}:{qop}:{ha2}",
                ha1 = ha1,
                nonce = self.nonce,
                nc = self.nonce_count,
                cnonce = self.cnonce,
                qop = q,
                ha2 = ha2
            ),
            None => format!("{}:{}:{}", ha1, self.nonce, ha2),
        };

        algo.hash_str(&kd)
    }

    /// Produce the complete `Authorization` header value.
    ///
    /// Fields are always emitted in the same order, optional ones only when negotiated.
    pub fn authorization(&self) -> Result<String> {
        let algo = self.algorithm()?;
        let qop = self.qop()?;
        let response = self.compute_response(algo, qop);

        let username = if self.userhash {
            algo.hash_str(&format!("{}:{}", self.username, self.realm))
        } else {
            self.username.clone()
        };

        let mut auth = String::from("Digest ");
        let _ = write!(auth, "username=\"{}\"", username.quote_for_digest());
        let _ = write!(auth, ", realm=\"{}\"", self.realm.quote_for_digest());
        let _ = write!(auth, ", nonce=\"{}\"", self.nonce.quote_for_digest());
        let _ = write!(auth, ", uri=\"{}\"", self.uri.quote_for_digest());

        if let Some(opaque) = &self.opaque {
            let _ = write!(auth, ", opaque=\"{}\"", opaque.quote_for_digest());
        }

        if let Some(q) = qop {
            let _ = write!(
                auth,
                ", cnonce=\"{}\", nc={:08x}, qop={}",
                self.cnonce.quote_for_digest(),
                self.nonce_count,
                q
            );
        }

        let _ = write!(auth, ", response=\"{}\"", response);

        if !self.algorithm.is_empty() {
            let _ = write!(auth, ", algorithm={}", self.algorithm);
        }

        if self.userhash {
            auth.push_str(", userhash=true");
        }

        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::Credentials;
    use crate::Error;
    use digest::Digest;
    use md5::Md5;

    const RFC7616_NONCE: &str = "7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v";
    const RFC7616_OPAQUE: &str = "FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS";
    const RFC7616_CNONCE: &str = "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ";

    fn rfc7616(algorithm: &str) -> Credentials {
        Credentials {
            username: "Mufasa".into(),
            password: "Circle of Life".into(),
            realm: "http-auth@example.org".into(),
            algorithm: algorithm.into(),
            opaque: Some(RFC7616_OPAQUE.into()),
            qop: Some("auth".into()),
            nonce: RFC7616_NONCE.into(),
            nonce_prime: RFC7616_NONCE.into(),
            nonce_count: 1,
            cnonce: RFC7616_CNONCE.into(),
            method: "GET".into(),
            uri: "/dir/index.html".into(),
            ..Default::default()
        }
    }

    fn md5_hex(s: &str) -> String {
        hex::encode(Md5::digest(s.as_bytes()))
    }

    #[test]
    fn test_rfc7616_md5() {
        assert_eq!(
            rfc7616("MD5").response().unwrap(),
            "8ca523f5e9506fed4657c9700eebdbec"
        );
    }

    #[test]
    fn test_rfc7616_sha256() {
        assert_eq!(
            rfc7616("SHA-256").response().unwrap(),
            "753927fa0e85d155564e2e272a28d1802ca10daf4496794697cf8db5856cb6c1"
        );
    }

    #[test]
    fn test_rfc7616_sha256_header() {
        let str = rfc7616("SHA-256")
            .authorization()
            .unwrap()
            .replace(", ", ",\n  ");

        assert_eq!(
            str,
            r#"
Digest username="Mufasa",
  realm="http-auth@example.org",
  nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
  uri="/dir/index.html",
  opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS",
  cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
  nc=00000001,
  qop=auth,
  response="753927fa0e85d155564e2e272a28d1802ca10daf4496794697cf8db5856cb6c1",
  algorithm=SHA-256
"#
            .trim()
        );
    }

    #[test]
    fn test_rfc2617() {
        let creds = Credentials {
            username: "Mufasa".into(),
            password: "Circle Of Life".into(),
            realm: "testrealm@host.com".into(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".into(),
            nonce_count: 1,
            opaque: Some("5ccc069c403ebaf9f0171e9517f40e41".into()),
            qop: Some("auth".into()),
            cnonce: "0a4f113b".into(),
            method: "GET".into(),
            uri: "/dir/index.html".into(),
            ..Default::default()
        };

        let str = creds.authorization().unwrap().replace(", ", ",\n  ");

        // no algorithm in the challenge, so none in the answer
        assert_eq!(
            str,
            r#"
Digest username="Mufasa",
  realm="testrealm@host.com",
  nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
  uri="/dir/index.html",
  opaque="5ccc069c403ebaf9f0171e9517f40e41",
  cnonce="0a4f113b",
  nc=00000001,
  qop=auth,
  response="6629fae49393a05397450978507c4ef1"
"#
            .trim()
        );
    }

    #[test]
    fn test_rfc2069() {
        let creds = Credentials {
            username: "Mufasa".into(),
            password: "CircleOfLife".into(),
            realm: "testrealm@host.com".into(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".into(),
            nonce_count: 1,
            opaque: Some("5ccc069c403ebaf9f0171e9517f40e41".into()),
            cnonce: "ignored".into(),
            method: "GET".into(),
            uri: "/dir/index.html".into(),
            ..Default::default()
        };

        // RFC 2069 has a wrong hash in its example, see errata
        let str = creds.authorization().unwrap().replace(", ", ",\n  ");
        assert_eq!(
            str,
            r#"
Digest username="Mufasa",
  realm="testrealm@host.com",
  nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
  uri="/dir/index.html",
  opaque="5ccc069c403ebaf9f0171e9517f40e41",
  response="1949323746fe6a43ef61f9606e7febea"
"#
            .trim()
        );
    }

    #[test]
    fn test_session_keying_uses_latched_pair() {
        let mut creds = rfc7616("MD5-sess");
        creds.nonce = "second-nonce".into();
        creds.nonce_prime = "first-nonce".into();
        creds.cnonce_prime = "first-cnonce".into();
        creds.cnonce = "second-cnonce".into();
        creds.nonce_count = 3;

        let ha1 = md5_hex("Mufasa:http-auth@example.org:Circle of Life:first-nonce:first-cnonce");
        let ha2 = md5_hex("GET:/dir/index.html");
        let expected = md5_hex(&format!(
            "{}:second-nonce:00000003:second-cnonce:auth:{}",
            ha1, ha2
        ));

        assert_eq!(creds.response().unwrap(), expected);

        // a different per-request cnonce does not move the session key
        let mut other = creds.clone();
        other.cnonce = "third-cnonce".into();
        let expected_other = md5_hex(&format!(
            "{}:second-nonce:00000003:third-cnonce:auth:{}",
            ha1, ha2
        ));
        assert_eq!(other.response().unwrap(), expected_other);
    }

    #[test]
    fn test_auth_int_hashes_body() {
        let mut creds = rfc7616("MD5");
        creds.qop = Some("auth-int".into());
        creds.method = "POST".into();
        creds.body = "hello=world".into();

        let ha1 = md5_hex("Mufasa:http-auth@example.org:Circle of Life");
        let ha2 = md5_hex(&format!("POST:/dir/index.html:{}", md5_hex("hello=world")));
        let expected = md5_hex(&format!(
            "{}:{}:00000001:{}:auth-int:{}",
            ha1, RFC7616_NONCE, RFC7616_CNONCE, ha2
        ));

        assert_eq!(creds.response().unwrap(), expected);
        assert!(creds.authorization().unwrap().contains(", qop=auth-int, "));
    }

    #[test]
    fn test_unknown_algorithm() {
        let creds = rfc7616("SHA-1");
        assert_eq!(
            creds.authorization(),
            Err(Error::AlgorithmNotImplemented("SHA-1".into()))
        );
        assert_eq!(
            creds.response(),
            Err(Error::AlgorithmNotImplemented("SHA-1".into()))
        );
    }

    #[test]
    fn test_unsupported_qop() {
        let mut creds = rfc7616("MD5");
        creds.qop = Some("auth-conf".into());
        assert_eq!(
            creds.authorization(),
            Err(Error::QopNotSupported("auth-conf".into()))
        );
    }

    #[test]
    fn test_userhash() {
        let mut creds = rfc7616("MD5");
        creds.userhash = true;

        let header = creds.authorization().unwrap();
        let hashed = md5_hex("Mufasa:http-auth@example.org");

        assert!(header.starts_with(&format!("Digest username=\"{}\"", hashed)));
        assert!(header.ends_with(", algorithm=MD5, userhash=true"));
        // the response itself is still keyed on the plain username
        assert!(header.contains("response=\"8ca523f5e9506fed4657c9700eebdbec\""));
    }

    #[test]
    fn test_rfc7616_sha512() {
        assert_eq!(
            rfc7616("SHA-512").response().unwrap(),
            "27d9ebedb4e86595d8b99152ce456620c8e47c48afbd771dbc4468bb758ca66e\
             7312383d49ad044219d4a2c5c218e66c584fa00b2728798bcff9435825eed0ad"
        );
    }

    /// RFC 7616 section 3.9.2, with the values corrected by errata 4897
    #[test]
    fn test_rfc7616_sha512_256_userhash() {
        let creds = Credentials {
            username: "J\u{e4}s\u{f8}n Doe".into(),
            password: "Secret, or not?".into(),
            realm: "api@example.org".into(),
            algorithm: "SHA-512-256".into(),
            opaque: Some("HRPCssKJSGjCrkzDg8OhwpzCiGPChXYjwrI2QmXDnsOS".into()),
            qop: Some("auth".into()),
            nonce: "5TsQWLVdgBdmrQ0XsxbDODV+57QdFR34I9HAbC/RVvkK".into(),
            nonce_count: 1,
            cnonce: "NTg6RKcb9boFIAS3KrFK9BGeh+iDa/sm6jUMp2wds69v".into(),
            userhash: true,
            method: "GET".into(),
            uri: "/doe.json".into(),
            ..Default::default()
        };

        assert_eq!(
            creds.response().unwrap(),
            "3798d4131c277846293534c3edc11bd8a5e4cdcbff78b05db9d95eeb1cec68a5"
        );
        assert_eq!(
            creds.authorization().unwrap().replace(", ", ",\n  "),
            r#"
Digest username="793263caabb707a56211940d90411ea4a575adeccb7e360aeb624ed06ece9b0b",
  realm="api@example.org",
  nonce="5TsQWLVdgBdmrQ0XsxbDODV+57QdFR34I9HAbC/RVvkK",
  uri="/doe.json",
  opaque="HRPCssKJSGjCrkzDg8OhwpzCiGPChXYjwrI2QmXDnsOS",
  cnonce="NTg6RKcb9boFIAS3KrFK9BGeh+iDa/sm6jUMp2wds69v",
  nc=00000001,
  qop=auth,
  response="3798d4131c277846293534c3edc11bd8a5e4cdcbff78b05db9d95eeb1cec68a5",
  algorithm=SHA-512-256,
  userhash=true
"#
            .trim()
        );
    }

    #[test]
    fn test_quoting() {
        let mut creds = rfc7616("MD5");
        creds.username = r#"Mu"fasa"#.into();
        let header = creds.authorization().unwrap();
        assert!(header.starts_with(r#"Digest username="Mu\"fasa""#));
    }
}
