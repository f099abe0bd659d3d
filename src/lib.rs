//! This crate implements the client side of HTTP Digest Auth (RFC 2617, 7616) as a transport
//! wrapper: requests go out unauthenticated, and when the server answers `401` with a Digest
//! challenge the request is replayed once with a computed `Authorization` header.
//!
//! The building blocks are usable on their own: [`Challenge`] parses the `WWW-Authenticate`
//! value, [`Credentials`] computes the response, [`NonceTracker`] counts nonce uses.
//! [`DigestTransport`] ties them together around any [`Transport`].
//!
//! # Examples
//!
//! Answering a challenge by hand:
//!
//! ```
//! use digest_transport::Credentials;
//!
//! // Value from the WWW-Authenticate HTTP header (usually in a HTTP 401 response)
//! let www_authenticate = r#"Digest realm="http-auth@example.org", qop="auth, auth-int", algorithm=MD5, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;
//!
//! // Parse the prompt header. You can inspect the parsed object, its fields are public.
//! let challenge = digest_transport::parse(www_authenticate).unwrap();
//!
//! let credentials = Credentials {
//!     username: "Mufasa".into(),
//!     password: "Circle of Life".into(),
//!     realm: challenge.realm.clone(),
//!     nonce: challenge.nonce.clone(),
//!     // first use of this nonce
//!     nonce_count: 1,
//!     opaque: challenge.opaque.clone(),
//!     qop: challenge.qop.first().cloned(),
//!     algorithm: challenge.algorithm.clone(),
//!     method: "GET".into(),
//!     uri: "/dir/index.html".into(),
//!     // normally random, fixed here to match the RFC example
//!     cnonce: "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ".into(),
//!     ..Default::default()
//! };
//!
//! assert_eq!(credentials.response().unwrap(), "8ca523f5e9506fed4657c9700eebdbec");
//! assert_eq!(
//!     credentials.authorization().unwrap(),
//!     r#"Digest username="Mufasa", realm="http-auth@example.org", nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", uri="/dir/index.html", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS", cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ", nc=00000001, qop=auth, response="8ca523f5e9506fed4657c9700eebdbec", algorithm=MD5"#
//! );
//! ```
//!
//! Letting the transport do it (needs the `reqwest` feature):
//!
//! ```no_run
//! # #[cfg(feature = "reqwest")]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use digest_transport::DigestTransport;
//!
//! let transport = DigestTransport::with_default_transport("Mufasa", "Circle of Life")?;
//! let request = http::Request::get("http://example.org/dir/index.html")
//!     .body(http_body_util::Empty::<bytes::Bytes>::new())?;
//! let response = transport.execute(request).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod algorithm;
mod challenge;
mod credentials;
mod error;
mod nonce;
mod policy;
mod transport;
mod utils;

#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use error::{Error, Result, SendError};

pub use crate::algorithm::{Algorithm, HashAlgorithm, Qop};
pub use crate::challenge::Challenge;
pub use crate::credentials::Credentials;
pub use crate::nonce::NonceTracker;
pub use crate::policy::{CnonceSource, FirstOffered, FixedCnonce, QopPolicy, RandomCnonce};
pub use crate::transport::{Builder, DigestTransport, SessionKey, Transport};

#[cfg(feature = "reqwest")]
pub use crate::reqwest_transport::{default_client_builder, ReqwestTransport};

/// Parse the WWW-Authenticate header value.
/// It's just a convenience method to call [`Challenge::parse()`](struct.Challenge.html#method.parse).
pub fn parse(www_authenticate: &str) -> Result<Challenge> {
    Challenge::parse(www_authenticate)
}

#[test]
fn test_parse_respond() {
    let src = r#"
    Digest
       realm="http-auth@example.org",
       qop="auth, auth-int",
       algorithm=SHA-256,
       nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
       opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"
    "#;

    let prompt = crate::parse(src).unwrap();
    let transport = DigestTransport::builder("Mufasa", "Circle of Life")
        .transport(std::sync::Arc::new(NeverSends))
        .build()
        .unwrap();

    let cnonce = "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ".to_string();
    let answer = transport
        .credentials("GET", "/dir/index.html", bytes::Bytes::new(), cnonce, &prompt)
        .authorization()
        .unwrap();

    let str = answer.replace(", ", ",\n  ");

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

#[cfg(test)]
struct NeverSends;

#[cfg(test)]
#[async_trait::async_trait]
impl Transport for NeverSends {
    type Error = std::convert::Infallible;
    type ResponseBody = http_body_util::Empty<bytes::Bytes>;

    async fn send(
        &self,
        _: http::Request<bytes::Bytes>,
    ) -> std::result::Result<http::Response<Self::ResponseBody>, Self::Error> {
        unreachable!()
    }
}
