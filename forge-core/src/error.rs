use std::time::Duration;

use forge_schema::{Document, ShapeId};

/// Below-application-layer transport failures.
///
/// Retry-safety here is only the intrinsic default; `forge-retry`'s
/// classifier is the authority that decides whether a given occurrence is
/// actually retried, since it also sees idempotency and model hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFault {
    /// The transport could not establish a connection within its deadline.
    ConnectTimeout,
    /// The connection was closed before a full response was received.
    ConnectionClosed,
    /// A TLS handshake or certificate validation failure.
    Tls,
    /// The transport's own wire protocol (HTTP/1.1, HTTP/2 framing, ...) was violated.
    TransportProtocol,
    /// A socket-level error (reset, refused, unreachable, ...).
    TransportSocket,
    /// The socket stayed open but made no progress within its deadline.
    TransportSocketTimeout,
}

impl TransportFault {
    /// Whether this fault kind is retry-safe by default. Only `ConnectTimeout`
    /// is — a request never reached the peer, so resending cannot duplicate
    /// a side effect. Every other transport fault may have reached the peer
    /// after the local socket gave up, so it is not retried by default.
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, TransportFault::ConnectTimeout)
    }
}

impl std::fmt::Display for TransportFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportFault::ConnectTimeout => "connect timeout",
            TransportFault::ConnectionClosed => "connection closed",
            TransportFault::Tls => "tls error",
            TransportFault::TransportProtocol => "transport protocol error",
            TransportFault::TransportSocket => "transport socket error",
            TransportFault::TransportSocketTimeout => "transport socket timeout",
        };
        write!(f, "{s}")
    }
}

/// Classification of an [`Error::Unmodeled`] response, mirroring the HTTP
/// status family it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Client,
    Server,
    Unknown,
}

/// A registered error shape materialized from the wire, with its decoded
/// payload kept as a [`Document`] since the core has no generated member
/// accessors to deserialize into.
#[derive(Debug, Clone)]
pub struct ModeledError {
    pub shape: ShapeId,
    pub payload: Document,
    pub http_status: Option<u16>,
}

/// A raw HTTP response kept around for caller inspection when an error
/// could not be resolved to a modeled shape.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// The failure taxonomy shared by the execution pipeline, the HTTP binding
/// engine, and the retry classifier (§7 of the design).
///
/// Every variant is reachable through [`Error::is_retry_safe`],
/// [`Error::is_throttle`], and [`Error::retry_after`] so callers never need
/// to match on the taxonomy just to ask "should this have been retried".
/// The retry *decision* itself is made by `forge-retry`'s classifier, which
/// has access to the operation schema and idempotency signals this type
/// does not carry.
#[derive(Debug, Clone)]
pub enum Error {
    /// The protocol failed to build a request from the input value.
    Serialization(String),
    /// A below-application-layer transport failure.
    Transport {
        fault: TransportFault,
        message: String,
    },
    /// The response could not be parsed into either an output or a known
    /// error shape; carries the [`RawResponse`] for inspection.
    Deserialization { message: String, raw: RawResponse },
    /// A registered error shape, with its full payload.
    Modeled(ModeledError),
    /// A response that was neither a known output nor a known error shape.
    Unmodeled {
        fault: Fault,
        message: String,
        raw: RawResponse,
    },
    /// The retry strategy refused to issue another token for this scope.
    RetryExhausted { attempts: u32, cause: Box<Error> },
    /// The call was cancelled by the caller before it completed.
    Cancelled,
    /// A call-scoped deadline elapsed.
    Timeout,
    /// A retry token was reused after being consumed by a prior transition.
    IllegalToken,
}

impl Error {
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization(message.into())
    }

    pub fn transport(fault: TransportFault, message: impl Into<String>) -> Self {
        Error::Transport {
            fault,
            message: message.into(),
        }
    }

    /// The intrinsic retry-safety default for this error kind, ignoring any
    /// idempotency or model hints (those live in `forge-retry`'s classifier).
    pub fn is_retry_safe(&self) -> bool {
        match self {
            Error::Transport { fault, .. } => fault.is_retry_safe(),
            Error::Serialization(_)
            | Error::Deserialization { .. }
            | Error::RetryExhausted { .. }
            | Error::Cancelled
            | Error::Timeout
            | Error::IllegalToken => false,
            Error::Modeled(_) | Error::Unmodeled { .. } => false,
        }
    }

    pub fn is_throttle(&self) -> bool {
        false
    }

    pub fn retry_after(&self) -> Option<Duration> {
        None
    }

    pub fn message(&self) -> String {
        match self {
            Error::Serialization(m) => m.clone(),
            Error::Transport { message, .. } => message.clone(),
            Error::Deserialization { message, .. } => message.clone(),
            Error::Modeled(e) => format!("modeled error {}", e.shape),
            Error::Unmodeled { message, .. } => message.clone(),
            Error::RetryExhausted { attempts, .. } => {
                format!("retry exhausted after {attempts} attempt(s)")
            }
            Error::Cancelled => "cancelled".to_string(),
            Error::Timeout => "call timeout exceeded".to_string(),
            Error::IllegalToken => "retry token reused after consumption".to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for Error {}
