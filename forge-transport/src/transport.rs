use async_trait::async_trait;
use forge_core::Error;
use forge_http::{HttpRequestParts, HttpResponseParts};

use crate::kind::MessageExchangeKind;

/// A pluggable sender for one [`MessageExchangeKind`] (§3 "Transport
/// abstraction"). Shared across calls and must be internally thread-safe
/// (§6 "Shared resources").
#[async_trait]
pub trait Transport: Send + Sync {
    fn message_exchange_kind(&self) -> MessageExchangeKind;

    /// Send `request` and await the response. Below-application-layer
    /// failures must be returned as `Error::Transport` with the matching
    /// [`forge_core::TransportFault`], never as a generic string — the
    /// retry classifier dispatches on that subkind.
    async fn send(&self, request: HttpRequestParts) -> Result<HttpResponseParts, Error>;
}
