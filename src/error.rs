use bytes::Bytes;
use http::Response;
use std::result;
use thiserror::Error;

/// Protocol-level failures: challenge parsing, credential computation, request preparation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The interceptor was built without an underlying transport
    #[error("transport is nil")]
    NilTransport,
    #[error("challenge is bad: {0}")]
    BadChallenge(String),
    #[error("algorithm not implemented: {0}")]
    AlgorithmNotImplemented(String),
    #[error("qop not supported: {0}")]
    QopNotSupported(String),
    #[error("random source failed: {0}")]
    RandomSource(String),
    /// A request body, or the body of a 401 challenge, could not be read
    #[error("could not copy body: {0}")]
    BodyCopy(String),
    /// The computed `Authorization` value is not a legal header value
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Outcome of a failed trip through [`DigestTransport`](crate::DigestTransport).
#[derive(Debug, Error)]
pub enum SendError<E> {
    /// The underlying transport failed; passed through unchanged
    #[error("transport error: {0}")]
    Transport(#[source] E),
    /// The request body or the 401 body could not be buffered.
    /// For the request body nothing was sent.
    #[error("{0}")]
    Body(#[source] Error),
    /// The server demanded authentication but no answer could be computed.
    /// The original 401 response is handed back, body read into memory, so the caller can
    /// inspect it.
    #[error("unable to answer challenge: {error}")]
    Unauthenticated {
        response: Response<Bytes>,
        #[source]
        error: Error,
    },
}

impl<E> SendError<E> {
    /// The unanswered 401 response, if this is an `Unauthenticated` error
    pub fn unauthenticated_response(&self) -> Option<&Response<Bytes>> {
        match self {
            SendError::Unauthenticated { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn into_unauthenticated_response(self) -> Option<Response<Bytes>> {
        match self {
            SendError::Unauthenticated { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The protocol error behind this failure, if it is not a transport error
    pub fn digest_error(&self) -> Option<&Error> {
        match self {
            SendError::Transport(_) => None,
            SendError::Body(e) => Some(e),
            SendError::Unauthenticated { error, .. } => Some(error),
        }
    }
}
