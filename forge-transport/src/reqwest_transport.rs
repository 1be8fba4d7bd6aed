use std::time::Duration;

use async_trait::async_trait;
use forge_core::{Error, TransportFault};
use forge_http::{HttpRequestParts, HttpResponseParts};

use crate::kind::MessageExchangeKind;
use crate::transport::Transport;

/// The default [`Transport`], backed by `reqwest`'s connection-pooling
/// HTTP client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn message_exchange_kind(&self) -> MessageExchangeKind {
        MessageExchangeKind::Http
    }

    async fn send(&self, request: HttpRequestParts) -> Result<HttpResponseParts, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::serialization(format!("invalid http method `{}`: {e}", request.method)))?;

        let mut builder = self.client.request(method, &request.uri);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        tracing::debug!(uri = %request.uri, method = %request.method, "sending request");

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let version = format!("{:?}", response.version());
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response.bytes().await.map_err(classify_send_error)?.to_vec();

        tracing::debug!(status, "received response");
        Ok(HttpResponseParts::new(status, headers, body).with_version(version))
    }
}

/// Maps a `reqwest::Error` onto the intrinsic [`TransportFault`] taxonomy
/// the retry classifier dispatches on (§7 "Transport(cause) subtree").
fn classify_send_error(error: reqwest::Error) -> Error {
    let fault = if error.is_timeout() {
        if error.is_connect() {
            TransportFault::ConnectTimeout
        } else {
            TransportFault::TransportSocketTimeout
        }
    } else if error.is_connect() {
        TransportFault::ConnectTimeout
    } else if error.is_request() || error.is_builder() {
        TransportFault::TransportProtocol
    } else if error.is_decode() || error.is_body() {
        TransportFault::ConnectionClosed
    } else {
        TransportFault::TransportSocket
    };
    Error::transport(fault, error.to_string())
}

#[derive(Default)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl ReqwestTransportBuilder {
    /// Applied by the underlying transport per §6 "Timeouts": a connect
    /// timeout that elapses surfaces as `ConnectTimeout`, which is
    /// retry-safe by default.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport(TransportFault::TransportProtocol, e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}
