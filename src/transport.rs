use crate::challenge::{self, Challenge};
use crate::credentials::Credentials;
use crate::nonce::NonceTracker;
use crate::policy::{CnonceSource, FirstOffered, QopPolicy, RandomCnonce};
use crate::{Error, Result, SendError};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;
use std::fmt::{self, Debug, Display, Formatter};
use std::result;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Something that can send a buffered request and hand back the server's response.
///
/// This is the seam to the actual HTTP client; connection handling, TLS, proxies and timeouts
/// all live behind it. The response body is returned unread, so it can be streamed.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type ResponseBody: Body<Data = Bytes> + Send + 'static;

    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> result::Result<Response<Self::ResponseBody>, Self::Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Error = T::Error;
    type ResponseBody = T::ResponseBody;

    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> result::Result<Response<Self::ResponseBody>, Self::Error> {
        (**self).send(request).await
    }
}

/// Server/client nonce pair captured on the first challenge, used to key `-sess` algorithms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub nonce: String,
    pub cnonce: String,
}

/// Transport wrapper that answers Digest challenges.
///
/// Every request is sent as-is first. If the server replies `401 Unauthorized` with a Digest
/// challenge, credentials are computed and the request is replayed exactly once with an
/// `Authorization` header. Whatever the replay returns is the final result.
///
/// One instance can serve many concurrent requests; the nonce counters and the session key
/// are shared between them.
pub struct DigestTransport<T> {
    username: String,
    password: String,
    transport: T,
    qop_policy: Box<dyn QopPolicy>,
    cnonce_source: Box<dyn CnonceSource>,
    nonce_counter: NonceTracker,
    session: OnceLock<SessionKey>,
}

impl<T: Debug> Debug for DigestTransport<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestTransport")
            .field("username", &self.username)
            .field("transport", &self.transport)
            .field("nonce_counter", &self.nonce_counter)
            .field("session", &self.session.get())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DigestTransport<T> {
    /// Wrap `transport` with the default strategies: answer with the first offered qop, and
    /// 16 random bytes of client nonce.
    pub fn new(username: impl Into<String>, password: impl Into<String>, transport: T) -> Self {
        DigestTransport {
            username: username.into(),
            password: password.into(),
            transport,
            qop_policy: Box::new(FirstOffered),
            cnonce_source: Box::new(RandomCnonce::default()),
            nonce_counter: NonceTracker::new(),
            session: OnceLock::new(),
        }
    }

    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> Builder<T> {
        Builder::new(username, password)
    }

    /// The wrapped transport
    pub fn inner(&self) -> &T {
        &self.transport
    }

    pub fn nonce_counter(&self) -> &NonceTracker {
        &self.nonce_counter
    }

    /// Session key latched by the first challenge, if any challenge was seen yet
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.session.get()
    }

    /// Send a request, answering a Digest challenge if the server raises one.
    ///
    /// The request body is read into memory first so that it can be sent twice and hashed for
    /// `auth-int`. Response bodies are passed back unread, except for the body of a `401`,
    /// which is drained before the retry.
    ///
    /// # Errors
    /// - [`SendError::Body`] if the request body or the body of the 401 could not be read.
    ///   In the first case nothing was sent.
    /// - [`SendError::Transport`] for any failure of the wrapped transport, on either attempt.
    /// - [`SendError::Unauthenticated`] with the original 401 if the challenge could not be
    ///   answered (malformed, unknown algorithm or qop, no cnonce). No retry is made then.
    pub async fn execute<B>(
        &self,
        request: Request<B>,
    ) -> result::Result<Response<T::ResponseBody>, SendError<T::Error>>
    where
        B: Body,
        B::Error: Display,
        <T::ResponseBody as Body>::Error: Display,
    {
        let (parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| SendError::Body(Error::BodyCopy(e.to_string())))?
            .to_bytes();

        self.round_trip(parts, body).await
    }

    async fn round_trip(
        &self,
        parts: Parts,
        body: Bytes,
    ) -> result::Result<Response<T::ResponseBody>, SendError<T::Error>>
    where
        <T::ResponseBody as Body>::Error: Display,
    {
        let mut retry = replay(&parts, &body);

        let response = self
            .transport
            .send(Request::from_parts(parts, body))
            .await
            .map_err(SendError::Transport)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let response = buffer(response).await.map_err(SendError::Body)?;
        let authorization = match self.answer(&retry, response.headers()) {
            Ok(authorization) => authorization,
            Err(error) => {
                warn!(%error, uri = %retry.uri(), "unable to answer authentication challenge");
                return Err(SendError::Unauthenticated { response, error });
            }
        };

        retry.headers_mut().insert(AUTHORIZATION, authorization);
        debug!(
            method = %retry.method(),
            uri = %retry.uri(),
            "replaying request with digest credentials"
        );

        self.transport
            .send(retry)
            .await
            .map_err(SendError::Transport)
    }

    fn answer(&self, request: &Request<Bytes>, headers: &HeaderMap) -> Result<HeaderValue> {
        let challenge = find_challenge(headers)?;
        debug!(
            realm = %challenge.realm,
            algorithm = %challenge.algorithm,
            qop = ?challenge.qop,
            stale = challenge.stale,
            "received digest challenge"
        );

        let cnonce = self.cnonce_source.generate()?;
        let uri = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let credentials = self.credentials(
            request.method().as_str(),
            uri,
            request.body().clone(),
            cnonce,
            &challenge,
        );
        debug!(nc = credentials.nonce_count, qop = ?credentials.qop, "computing digest response");

        let authorization = credentials.authorization()?;
        HeaderValue::from_str(&authorization).map_err(|e| Error::InvalidHeader(e.to_string()))
    }

    /// Build the credentials answering `challenge` for one request.
    ///
    /// Bumps the counter of the challenge's nonce, and latches the session key if this is the
    /// first challenge this transport has seen.
    pub fn credentials(
        &self,
        method: &str,
        uri: &str,
        body: Bytes,
        cnonce: String,
        challenge: &Challenge,
    ) -> Credentials {
        let session = self.session.get_or_init(|| SessionKey {
            nonce: challenge.nonce.clone(),
            cnonce: cnonce.clone(),
        });

        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            realm: challenge.realm.clone(),
            nonce: challenge.nonce.clone(),
            nonce_count: self.nonce_counter.increment(&challenge.nonce),
            opaque: challenge.opaque.clone(),
            qop: self.qop_policy.select(&challenge.qop),
            algorithm: challenge.algorithm.clone(),
            userhash: challenge.userhash,
            nonce_prime: session.nonce.clone(),
            cnonce_prime: session.cnonce.clone(),
            method: method.to_string(),
            uri: uri.to_string(),
            body,
            cnonce,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for DigestTransport<T>
where
    <T::ResponseBody as Body>::Error: Display,
{
    type Error = SendError<T::Error>;
    type ResponseBody = T::ResponseBody;

    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> result::Result<Response<Self::ResponseBody>, Self::Error> {
        let (parts, body) = request.into_parts();
        self.round_trip(parts, body).await
    }
}

/// Copy of the request head sharing the buffered body. Extensions are not carried over.
fn replay(parts: &Parts, body: &Bytes) -> Request<Bytes> {
    let mut request = Request::new(body.clone());
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    request
}

/// Read a whole response body into memory
async fn buffer<B>(response: Response<B>) -> Result<Response<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::BodyCopy(e.to_string()))?
        .to_bytes();
    Ok(Response::from_parts(parts, body))
}

/// First `Digest` challenge among the `WWW-Authenticate` headers
fn find_challenge(headers: &HeaderMap) -> Result<Challenge> {
    let mut offered = Vec::new();

    for value in headers.get_all(WWW_AUTHENTICATE) {
        let value = value
            .to_str()
            .map_err(|e| Error::BadChallenge(format!("unreadable WWW-Authenticate: {}", e)))?;

        let (scheme, _) = challenge::split_scheme(value);
        if challenge::is_digest_scheme(scheme) {
            return Challenge::parse(value);
        }
        offered.push(scheme);
    }

    if offered.is_empty() {
        Err(Error::BadChallenge("no WWW-Authenticate header".into()))
    } else {
        Err(Error::BadChallenge(format!(
            "no Digest challenge, server offered {}",
            offered.join(", ")
        )))
    }
}

/// Builder for a [`DigestTransport`] with custom strategies
pub struct Builder<T> {
    username: String,
    password: String,
    transport: Option<T>,
    qop_policy: Box<dyn QopPolicy>,
    cnonce_source: Box<dyn CnonceSource>,
}

impl<T: Transport> Builder<T> {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Builder {
            username: username.into(),
            password: password.into(),
            transport: None,
            qop_policy: Box::new(FirstOffered),
            cnonce_source: Box::new(RandomCnonce::default()),
        }
    }

    /// The transport that carries both attempts
    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn qop_policy(mut self, policy: impl QopPolicy + 'static) -> Self {
        self.qop_policy = Box::new(policy);
        self
    }

    pub fn cnonce_source(mut self, source: impl CnonceSource + 'static) -> Self {
        self.cnonce_source = Box::new(source);
        self
    }

    /// # Errors
    /// [`Error::NilTransport`] if no transport was given.
    pub fn build(self) -> Result<DigestTransport<T>> {
        let transport = self.transport.ok_or(Error::NilTransport)?;

        Ok(DigestTransport {
            username: self.username,
            password: self.password,
            transport,
            qop_policy: self.qop_policy,
            cnonce_source: self.cnonce_source,
            nonce_counter: NonceTracker::new(),
            session: OnceLock::new(),
        })
    }
}
