use tokio_util::sync::CancellationToken;

use forge_auth::{select_auth_scheme, AuthSchemeResolverParams};
use forge_core::{Context, Endpoint, Error};
use forge_http::{ErrorHeaderExtractor, HttpBindingProtocol, HttpRequestParts, HttpResponseParts, HttpTrait};
use forge_retry::{classify, Classification, ClassifyInput};
use forge_schema::{traits::well_known, Document, OperationSchema};
use forge_transport::MessageExchangeKind;

use crate::config::{CallConfig, CallOverride};
use crate::operation::http_trait_for;
use crate::user_agent::UserAgentBuilder;

const ATTEMPT_HEADER: &str = "amz-sdk-request";
const USER_AGENT_HEADER: &str = "user-agent";

/// Drive one call through the full sequence in §4.1: per-call
/// configuration, a single serialization, a retry loop of signed attempts,
/// and the completion hooks that run exactly once regardless of how many
/// attempts it took.
pub async fn invoke(
    operation: &OperationSchema,
    input: Document,
    base_config: &CallConfig,
    override_fn: Option<CallOverride>,
) -> Result<Document, Error> {
    let config = match override_fn {
        Some(f) => base_config.with_override(f),
        None => base_config.clone(),
    };

    let mut context = config.context.clone().with_operation(operation.id.clone());
    let http_trait = http_trait_for(operation)?;

    let outcome = run_call_with_deadline(operation, &http_trait, input, &config, &mut context).await;

    let (output, error) = match outcome {
        Ok(output) => (Some(output), None),
        Err(e) => (None, Some(e)),
    };
    let error = config
        .interceptors
        .dispatch_modify(error, |i, e| i.modify_before_completion(&mut context, e))?;
    let _ = config
        .interceptors
        .dispatch_read(|i| i.read_after_execution(&mut context, error.as_ref()));

    match error {
        Some(e) => Err(e),
        None => Ok(output.expect("a call with no completion error must carry an output")),
    }
}

/// Races `run_call` against the context's call-scoped deadline and
/// cancellation token (§5 "Cancellation and Timeouts"). Neither guard is
/// active unless the caller set one via [`Context::with_call_timeout`] or
/// [`Context::with_cancellation_token`], so a call with neither configured
/// pays no `tokio::select!` overhead beyond a no-op match.
async fn run_call_with_deadline(
    operation: &OperationSchema,
    http_trait: &HttpTrait,
    input: Document,
    config: &CallConfig,
    context: &mut Context,
) -> Result<Document, Error> {
    let remaining = context.remaining_call_time();
    let token = context.cancellation_token().cloned();
    let call = run_call(operation, http_trait, input, config, context);

    match (remaining, token) {
        (None, None) => call.await,
        (Some(remaining), None) => tokio::time::timeout(remaining, call).await.unwrap_or(Err(Error::Timeout)),
        (None, Some(token)) => race_cancellation(call, token).await,
        (Some(remaining), Some(token)) => race_cancellation(timeout_or_err(remaining, call), token).await,
    }
}

async fn timeout_or_err(remaining: std::time::Duration, call: impl std::future::Future<Output = Result<Document, Error>>) -> Result<Document, Error> {
    tokio::time::timeout(remaining, call).await.unwrap_or(Err(Error::Timeout))
}

async fn race_cancellation(call: impl std::future::Future<Output = Result<Document, Error>>, token: CancellationToken) -> Result<Document, Error> {
    tokio::select! {
        result = call => result,
        _ = token.cancelled() => Err(Error::Cancelled),
    }
}

async fn run_call(
    operation: &OperationSchema,
    http_trait: &HttpTrait,
    input: Document,
    config: &CallConfig,
    context: &mut Context,
) -> Result<Document, Error> {
    config.interceptors.dispatch_read(|i| i.read_before_execution(context))?;

    let input = config
        .interceptors
        .dispatch_modify(input, |i, v| i.modify_before_serialization(context, v))?;
    config.interceptors.dispatch_read(|i| i.read_before_serialization(context))?;

    let protocol = HttpBindingProtocol::new(&config.registry, config.codec.as_ref(), &config.default_namespace);
    let endpoint = resolve_endpoint(operation, config, context);
    let request = protocol.serialize_input(operation, http_trait, &input, &endpoint)?;
    config.interceptors.dispatch_read(|i| i.read_after_serialization(context))?;

    let request = config
        .interceptors
        .dispatch_modify(request, |i, r| i.modify_before_retry_loop(context, r))?;
    let request = set_user_agent_header(request, &config.user_agent, context);

    let scope = forge_retry::scope_key(config.retry_scope.as_deref(), &operation.id.to_string());
    let (mut token, mut delay) = config.retry_strategy.acquire_initial_token(&scope)?;
    let idempotent = context.idempotency_token().is_some() || operation.is_inherently_retryable();

    loop {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let attempt_request = set_attempt_header(request.clone(), token.attempt(), config.retry_strategy.max_attempts());
        match run_attempt(operation, http_trait, &protocol, &config.error_header_extractor, attempt_request, config, context).await {
            Ok(output) => {
                config.retry_strategy.record_success(token)?;
                return Ok(output);
            }
            Err((error, classification)) => {
                if !classification.should_retry(idempotent) {
                    return Err(error);
                }
                let (next_token, next_delay) =
                    config.retry_strategy.refresh_retry_token(token, &error, &classification, classification.retry_after)?;
                token = next_token;
                delay = next_delay;
            }
        }
    }
}

/// Replace the resolver's endpoint URI with the context's per-call
/// override, if any, while still merging in the extra headers either side
/// declared.
fn resolve_endpoint(operation: &OperationSchema, config: &CallConfig, context: &Context) -> Endpoint {
    let resolved = config.endpoint_resolver.resolve(&operation.id, context);
    let Some(override_endpoint) = context.endpoint_override() else {
        return resolved;
    };
    let mut merged = Endpoint::new(override_endpoint.uri());
    for (name, value) in resolved.extra_headers() {
        merged = merged.with_header(name.clone(), value.clone());
    }
    for (name, value) in override_endpoint.extra_headers() {
        merged = merged.with_header(name.clone(), value.clone());
    }
    merged
}

/// Set once per call, not per attempt (§6): the feature set it's built
/// from only changes if an interceptor mutates the context before the
/// retry loop starts.
fn set_user_agent_header(mut request: HttpRequestParts, user_agent: &UserAgentBuilder, context: &Context) -> HttpRequestParts {
    request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case(USER_AGENT_HEADER));
    request.headers.push((USER_AGENT_HEADER.to_string(), user_agent.build(context.features())));
    request
}

fn set_attempt_header(mut request: HttpRequestParts, attempt: u32, max_attempts: u32) -> HttpRequestParts {
    request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case(ATTEMPT_HEADER));
    request
        .headers
        .push((ATTEMPT_HEADER.to_string(), format!("attempt={attempt}; max={max_attempts}")));
    request
}

/// One attempt: sign, transmit, deserialize. Returns the classified error
/// alongside the error itself so the retry loop doesn't have to
/// re-classify after the attempt-completion hooks have already run.
async fn run_attempt(
    operation: &OperationSchema,
    http_trait: &HttpTrait,
    protocol: &HttpBindingProtocol<'_>,
    error_header_extractor: &ErrorHeaderExtractor,
    request: HttpRequestParts,
    config: &CallConfig,
    context: &mut Context,
) -> Result<Document, (Error, Classification)> {
    let result = run_attempt_inner(operation, http_trait, protocol, error_header_extractor, request, config, context).await;

    let (output, mut error) = match result {
        Ok(output) => (Some(output), None),
        Err(e) => (None, Some(e)),
    };

    let _ = config
        .interceptors
        .dispatch_read(|i| i.read_after_deserialization(context, error.as_ref()));

    let swapped = config
        .interceptors
        .dispatch_modify(error, |i, e| i.modify_before_attempt_completion(context, e));
    error = match swapped {
        Ok(e) => e,
        Err(e) => Some(e),
    };

    let _ = config.interceptors.dispatch_read(|i| i.read_after_attempt(context, error.as_ref()));

    match error {
        None => Ok(output.expect("an attempt with no error must carry an output")),
        Some(error) => {
            let classification = classify_error(&error, context, config);
            Err((error, classification))
        }
    }
}

async fn run_attempt_inner(
    operation: &OperationSchema,
    http_trait: &HttpTrait,
    protocol: &HttpBindingProtocol<'_>,
    error_header_extractor: &ErrorHeaderExtractor,
    request: HttpRequestParts,
    config: &CallConfig,
    context: &mut Context,
) -> Result<Document, Error> {
    config.interceptors.dispatch_read(|i| i.read_before_attempt(context))?;

    let request = config
        .interceptors
        .dispatch_modify(request, |i, r| i.modify_before_signing(context, r))?;
    config.interceptors.dispatch_read(|i| i.read_before_signing(context))?;

    let params = AuthSchemeResolverParams::new(&operation.auth_schemes);
    let selected = select_auth_scheme(config.auth_scheme_resolver.as_ref(), &config.auth_catalog, &params, context).await?;
    let signer_properties = selected.scheme.signer_properties(context);
    let mut request = request;
    selected.scheme.signer().sign(&mut request, &selected.identity, &signer_properties)?;
    config.interceptors.dispatch_read(|i| i.read_after_signing(context))?;

    let request = config
        .interceptors
        .dispatch_modify(request, |i, r| i.modify_before_transmit(context, r))?;
    config.interceptors.dispatch_read(|i| i.read_before_transmit(context))?;

    let transport = config.transports.resolve(MessageExchangeKind::Http)?;
    tracing::debug!(operation = %operation.id, "sending attempt");
    let response = transport.send(request).await?;
    config.interceptors.dispatch_read(|i| i.read_after_transmit(context))?;

    let response = config
        .interceptors
        .dispatch_modify(response, |i, r| i.modify_before_deserialization(context, r))?;
    config.interceptors.dispatch_read(|i| i.read_before_deserialization(context))?;

    if protocol.is_success(http_trait, response.status) {
        protocol.deserialize_output(operation, &response)
    } else {
        Err(protocol.deserialize_error(
            operation,
            &response,
            error_header_extractor,
            config.unknown_error_factory.as_deref(),
        ))
    }
}

fn classify_error(error: &Error, context: &Context, config: &CallConfig) -> Classification {
    let http_status = response_status(error);
    let retry_after_header = retry_after_header(error);
    let idempotent = context.idempotency_token().is_some();
    let (retryable_hint, throttling_hint) = match error {
        Error::Modeled(modeled) => {
            let shape = config.registry.shape(&modeled.shape);
            (
                shape.and_then(|s| s.traits.get(well_known::RETRYABLE)).and_then(|v| v.as_bool()),
                shape.and_then(|s| s.traits.get(well_known::THROTTLING)).and_then(|v| v.as_bool()),
            )
        }
        _ => (None, None),
    };

    classify(
        ClassifyInput {
            error,
            http_status,
            retry_after_header,
            idempotent,
            retryable_hint,
            throttling_hint,
        },
        context.clock().as_ref(),
    )
}

fn response_status(error: &Error) -> Option<u16> {
    match error {
        Error::Modeled(modeled) => modeled.http_status,
        Error::Deserialization { raw, .. } | Error::Unmodeled { raw, .. } => raw.status,
        _ => None,
    }
}

fn retry_after_header(error: &Error) -> Option<&str> {
    let headers = match error {
        Error::Deserialization { raw, .. } | Error::Unmodeled { raw, .. } => &raw.headers,
        _ => return None,
    };
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("retry-after"))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forge_core::Context as CoreContext;
    use forge_schema::{Member, Shape, ShapeId, ShapeKind};
    use forge_test::{MockMatcher, MockOutcome, MockTransport};
    use forge_transport::Transport;

    use super::*;
    use crate::config::CallConfig;

    fn echo_registry() -> forge_schema::SchemaRegistry {
        forge_schema::SchemaRegistry::builder()
            .shape(
                Shape::new(ShapeId::new("com.example", "EchoInput"), ShapeKind::Structure)
                    .with_member(Member::new("id", ShapeId::new("smithy.api", "String")).with_trait("httpLabel", true.into())),
            )
            .shape(Shape::new(ShapeId::new("com.example", "EchoOutput"), ShapeKind::Structure))
            .operation(
                OperationSchema::new(
                    ShapeId::new("com.example", "Echo"),
                    ShapeId::new("com.example", "EchoInput"),
                    ShapeId::new("com.example", "EchoOutput"),
                )
                .with_trait("http", serde_json::json!({"method": "GET", "path": "/echo/{id}", "code": 200})),
            )
            .build()
    }

    #[tokio::test]
    async fn a_successful_attempt_returns_the_decoded_output() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(200, vec![], b"{}".to_vec()))
        }));

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("42".into()))]));

        let output = invoke(operation, input, &config, None).await.unwrap();
        assert_eq!(output, Document::Map(std::collections::BTreeMap::new()));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn unmatched_requests_surface_as_a_non_retried_error() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));

        let result = invoke(operation, input, &config, None).await;
        assert!(result.is_err());
        assert_eq!(mock.request_count(), 1, "a non-retried error must not re-attempt");
    }

    #[tokio::test]
    async fn unknown_error_factory_overrides_the_default_unmodeled_error() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(400, vec![], br#"{"__type":"com.foo#SomeUnknownError"}"#.to_vec()))
        }));

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .unknown_error_factory(|_response, _operation| forge_core::Error::Unmodeled {
                fault: forge_core::Fault::Client,
                message: "Hi!".to_string(),
                raw: forge_core::RawResponse {
                    status: Some(400),
                    headers: vec![],
                    body: vec![],
                },
            })
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));

        let err = invoke(operation, input, &config, None).await.unwrap_err();
        assert!(matches!(err, Error::Unmodeled { fault: forge_core::Fault::Client, ref message, .. } if message == "Hi!"));
    }

    #[test]
    fn attempt_header_is_replaced_not_appended() {
        let request = HttpRequestParts {
            method: "GET".into(),
            uri: "https://example.com".into(),
            headers: vec![(ATTEMPT_HEADER.to_string(), "stale".into())],
            body: vec![],
        };
        let request = set_attempt_header(request, 2, 3);
        let values: Vec<_> = request.headers.iter().filter(|(k, _)| k == ATTEMPT_HEADER).collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].1, "attempt=2; max=3");
    }

    #[test]
    fn endpoint_override_replaces_uri_but_keeps_resolver_headers() {
        let registry = echo_registry();
        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://resolved.example.com").with_header("x-resolver", "1"))
            .build()
            .unwrap();

        let context = CoreContext::new().with_endpoint_override(Endpoint::new("https://override.example.com").with_header("x-override", "1"));
        let endpoint = resolve_endpoint(operation, &config, &context);
        assert_eq!(endpoint.uri(), "https://override.example.com");
        assert!(endpoint.extra_headers().iter().any(|(k, _)| k == "x-resolver"));
        assert!(endpoint.extra_headers().iter().any(|(k, _)| k == "x-override"));
    }

    #[test]
    fn user_agent_header_is_replaced_not_appended() {
        let request = HttpRequestParts {
            method: "GET".into(),
            uri: "https://example.com".into(),
            headers: vec![(USER_AGENT_HEADER.to_string(), "stale".into())],
            body: vec![],
        };
        let builder = UserAgentBuilder::new("1.0.0", "1.79.0");
        let request = set_user_agent_header(request, &builder, &CoreContext::new());
        let values: Vec<_> = request.headers.iter().filter(|(k, _)| k == USER_AGENT_HEADER).collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].1, "smithy-forge/1.0.0 lang/rust#1.79.0");
    }

    #[tokio::test]
    async fn every_outgoing_request_carries_a_user_agent_header() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(200, vec![], b"{}".to_vec()))
        }));

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));
        invoke(operation, input, &config, None).await.unwrap();

        let sent = mock.requests();
        let user_agent = sent[0].headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(USER_AGENT_HEADER));
        assert!(user_agent.is_some_and(|(_, v)| v.starts_with("smithy-forge/")));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_or_err_rejects_once_the_deadline_elapses() {
        let never = std::future::pending::<Result<Document, Error>>();
        let result = timeout_or_err(std::time::Duration::from_millis(0), never).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn race_cancellation_returns_cancelled_once_the_token_fires() {
        let token = CancellationToken::new();
        token.cancel();
        let never = std::future::pending::<Result<Document, Error>>();
        let result = race_cancellation(never, token).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn race_cancellation_passes_through_the_inner_result_when_not_cancelled() {
        let token = CancellationToken::new();
        let ready = std::future::ready(Ok(Document::Null));
        let result = race_cancellation(ready, token).await;
        assert_eq!(result.unwrap(), Document::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn invoke_times_out_when_the_call_deadline_has_already_elapsed() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(200, vec![], b"{}".to_vec()))
        }));

        let clock: Arc<dyn forge_core::Clock> = Arc::new(forge_core::FixedClock::new(0));
        let context = CoreContext::new().with_clock(clock).with_call_timeout(std::time::Duration::ZERO);

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .context(context)
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));

        let err = invoke(operation, input, &config, None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn invoke_propagates_cancellation_before_the_transport_is_touched() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(200, vec![], b"{}".to_vec()))
        }));

        let token = CancellationToken::new();
        token.cancel();
        let context = CoreContext::new().with_cancellation_token(token);

        let config = CallConfig::builder()
            .registry(registry.clone())
            .default_namespace("com.example")
            .endpoint(Endpoint::new("https://example.com"))
            .with_transport(mock.clone() as Arc<dyn Transport>)
            .context(context)
            .build()
            .unwrap();

        let operation = registry.operation(&ShapeId::new("com.example", "Echo")).unwrap();
        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));

        let err = invoke(operation, input, &config, None).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
