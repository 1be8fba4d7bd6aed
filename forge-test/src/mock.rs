use std::sync::Mutex;

use async_trait::async_trait;
use forge_core::Error;
use forge_http::{HttpBindingProtocol, HttpRequestParts, HttpResponseParts, HttpTrait};
use forge_schema::{Document, OperationSchema, PayloadCodec, SchemaRegistry};
use forge_transport::{MessageExchangeKind, Transport};

/// What a matched request resolves to.
pub enum MockOutcome {
    /// Hand back a fully-built response, bypassing the protocol entirely.
    Response(HttpResponseParts),
    /// Serialize `value` through the codec as if a server had produced it,
    /// at `http_trait.code`. This only encodes the body; a mock that needs
    /// header- or payload-bound output members should build an explicit
    /// [`MockOutcome::Response`] instead.
    Output { http_trait: HttpTrait, value: Document },
    /// Fail the attempt outright, without involving the protocol.
    Error(Error),
}

/// One registered expectation: a predicate plus a factory producing the
/// outcome each time it matches, so the same matcher can answer more than
/// one attempt (e.g. a retry) without being consumed.
pub struct MockMatcher {
    matches: Box<dyn Fn(&HttpRequestParts) -> bool + Send + Sync>,
    respond: Box<dyn Fn(&HttpRequestParts) -> MockOutcome + Send + Sync>,
}

impl MockMatcher {
    pub fn new(
        matches: impl Fn(&HttpRequestParts) -> bool + Send + Sync + 'static,
        respond: impl Fn(&HttpRequestParts) -> MockOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            matches: Box::new(matches),
            respond: Box::new(respond),
        }
    }

    /// Convenience matcher keyed on method and a path suffix (the endpoint
    /// prefix varies by test, the operation path does not).
    pub fn method_and_path(
        method: &'static str,
        path_suffix: &'static str,
        respond: impl Fn(&HttpRequestParts) -> MockOutcome + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            move |request| request.method.eq_ignore_ascii_case(method) && request.uri.ends_with(path_suffix),
            respond,
        )
    }
}

/// A [`Transport`] that never touches the network: it records every
/// request it is asked to send, and resolves each one against a list of
/// matchers consulted in registration order (§4.6). The first matcher
/// whose predicate accepts the request answers it; a request nothing
/// matches fails with [`Error::serialization`].
pub struct MockTransport {
    registry: SchemaRegistry,
    codec: Box<dyn PayloadCodec>,
    matchers: Mutex<Vec<MockMatcher>>,
    requests: Mutex<Vec<HttpRequestParts>>,
}

impl MockTransport {
    pub fn new(registry: SchemaRegistry, codec: impl PayloadCodec + 'static) -> Self {
        Self {
            registry,
            codec: Box::new(codec),
            matchers: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn expect(&self, matcher: MockMatcher) {
        self.matchers.lock().unwrap().push(matcher);
    }

    /// Every request sent through this transport, in the order it arrived.
    pub fn requests(&self) -> Vec<HttpRequestParts> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The schema registry this transport's codec is bound to — mostly
    /// useful so a test can look up a shape by the same registry the real
    /// client would use.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn message_exchange_kind(&self) -> MessageExchangeKind {
        MessageExchangeKind::Http
    }

    async fn send(&self, request: HttpRequestParts) -> Result<HttpResponseParts, Error> {
        self.requests.lock().unwrap().push(request.clone());

        let outcome = {
            let matchers = self.matchers.lock().unwrap();
            matchers.iter().find_map(|matcher| {
                if (matcher.matches)(&request) {
                    Some((matcher.respond)(&request))
                } else {
                    None
                }
            })
        };

        match outcome {
            Some(MockOutcome::Response(response)) => Ok(response),
            Some(MockOutcome::Output { http_trait, value }) => {
                let body = self
                    .codec
                    .encode(&value)
                    .map_err(|e| Error::serialization(e.to_string()))?;
                Ok(HttpResponseParts::new(
                    http_trait.code,
                    vec![("content-type".to_string(), self.codec.media_type().to_string())],
                    body,
                ))
            }
            Some(MockOutcome::Error(error)) => Err(error),
            None => Err(Error::serialization(format!(
                "no matcher registered for {} {}",
                request.method, request.uri
            ))),
        }
    }
}

/// Deserializes `response` back into a [`Document`] the way the real
/// client would, for a test that wants to assert on the body it just
/// handed `MockTransport`. Exposed so a test doesn't have to reach past
/// this crate into `forge-http` just to check its own fixture.
pub fn decode_output(
    registry: &SchemaRegistry,
    codec: &dyn PayloadCodec,
    default_namespace: &str,
    operation: &OperationSchema,
    response: &HttpResponseParts,
) -> Result<Document, Error> {
    HttpBindingProtocol::new(registry, codec, default_namespace).deserialize_output(operation, response)
}
