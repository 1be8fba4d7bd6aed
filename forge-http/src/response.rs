use std::collections::BTreeMap;

use forge_core::{Error, Fault, ModeledError, RawResponse};
use forge_schema::{traits::well_known, Document, OperationSchema, PayloadCodec, SchemaRegistry, Shape};

use crate::binding::{classify_output, Binding};
use crate::http_trait::ErrorHeaderExtractor;

/// A received HTTP response, independent of any particular HTTP client
/// library.
#[derive(Clone, Debug)]
pub struct HttpResponseParts {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub version: String,
}

impl HttpResponseParts {
    /// Build a response with the default `HTTP/1.1` version, for transports
    /// and test fixtures that don't otherwise know (or care) which HTTP
    /// version carried the bytes.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            version: "HTTP/1.1".to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn headers_named(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn to_raw(&self) -> RawResponse {
        RawResponse {
            status: Some(self.status),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Reconstruct the output value from a successful response, per the member
/// binding classification in §4.2 ("Output binding").
pub fn build_output(
    output_shape: &Shape,
    response: &HttpResponseParts,
    codec: &dyn PayloadCodec,
) -> Result<Document, Error> {
    let mut fields: BTreeMap<String, Document> = BTreeMap::new();
    let mut payload_member: Option<&str> = None;
    let mut has_body_members = false;

    for member in output_shape.members() {
        match classify_output(member) {
            Binding::StatusCode => {
                fields.insert(member.name.clone(), Document::Number(response.status.into()));
            }
            Binding::Header(key) => {
                let values = response.headers_named(&key);
                if values.is_empty() {
                    continue;
                }
                let packed = member.traits.get_str("httpHeaderPacking") == Some("comma");
                let value = if values.len() > 1 && !packed {
                    Document::List(values.into_iter().map(|v| Document::String(v.to_string())).collect())
                } else {
                    Document::String(values.join(", "))
                };
                fields.insert(member.name.clone(), value);
            }
            Binding::Payload => payload_member = Some(member.name.as_str()),
            Binding::Body => has_body_members = true,
            Binding::Label | Binding::Query(_) => {}
        }
    }

    if let Some(name) = payload_member {
        let is_streaming = output_shape
            .member(name)
            .map(|m| m.traits.has(well_known::STREAMING))
            .unwrap_or(false);
        let value = if is_streaming {
            Document::Blob(response.body.clone())
        } else {
            codec
                .decode(&response.body)
                .map_err(|e| deserialization_error(e.to_string(), response))?
        };
        fields.insert(name.to_string(), value);
    } else if has_body_members || response.body.is_empty() {
        let decoded = codec
            .decode(&response.body)
            .map_err(|e| deserialization_error(e.to_string(), response))?;
        if let Document::Map(body_fields) = decoded {
            for (name, value) in body_fields {
                fields.insert(name, value);
            }
        }
    }

    Ok(Document::Map(fields))
}

fn deserialization_error(message: String, response: &HttpResponseParts) -> Error {
    Error::Deserialization {
        message,
        raw: response.to_raw(),
    }
}

/// Produces the [`Error::Unmodeled`] returned when neither a header
/// extractor nor a body discriminator resolves to a registered error shape
/// (§4.2 "Error response", point 4; §8 scenario (c)). Given the full raw
/// response and the operation that was called, callers can replace the
/// built-in message (or fault classification) entirely — e.g. a service
/// that wants its own wording instead of the default "HTTP version, status
/// code, operation id" message.
pub type UnknownErrorFactory = dyn Fn(&HttpResponseParts, &OperationSchema) -> Error + Send + Sync;

/// Resolve an error response to a modeled shape, in the order §4.2 "Error
/// response" specifies: a header extractor, then a body discriminator, then
/// falling back to an unmodeled error classified by status family.
pub fn build_error(
    response: &HttpResponseParts,
    operation: &OperationSchema,
    registry: &SchemaRegistry,
    codec: &dyn PayloadCodec,
    header_extractor: &ErrorHeaderExtractor,
    default_namespace: &str,
    unknown_error_factory: Option<&UnknownErrorFactory>,
) -> Error {
    let decoded_body = codec.decode(&response.body).ok();

    let candidate = header_extractor
        .header_name
        .as_deref()
        .and_then(|name| response.header(name))
        .map(str::to_string)
        .or_else(|| body_discriminator(decoded_body.as_ref()));

    if let Some(reference) = candidate {
        if let Some(shape) = registry.resolve_error(&reference, default_namespace) {
            if operation.errors.is_empty() || operation.errors.contains(&shape.id) {
                return Error::Modeled(ModeledError {
                    shape: shape.id.clone(),
                    payload: decoded_body.unwrap_or(Document::Map(Default::default())),
                    http_status: Some(response.status),
                });
            }
        }
    }

    if let Some(factory) = unknown_error_factory {
        return factory(response, operation);
    }

    Error::Unmodeled {
        fault: fault_for_status(response.status),
        message: format!(
            "{} {}: unrecognized error response for operation {}",
            response.version, response.status, operation.id
        ),
        raw: response.to_raw(),
    }
}

fn body_discriminator(decoded: Option<&Document>) -> Option<String> {
    let map = decoded?.as_map()?;
    for key in ["__type", "code", "Code"] {
        if let Some(value) = map.get(key).and_then(Document::as_str) {
            return Some(value.rsplit('#').next().unwrap_or(value).to_string());
        }
    }
    None
}

fn fault_for_status(status: u16) -> Fault {
    match status / 100 {
        4 => Fault::Client,
        5 => Fault::Server,
        _ => Fault::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_schema::{JsonCodec, Member, ShapeId, ShapeKind};

    fn string_shape_id() -> ShapeId {
        ShapeId::new("smithy.api", "String")
    }

    #[test]
    fn status_code_member_reads_from_response_status() {
        let shape = Shape::new(ShapeId::new("com.example", "Output"), ShapeKind::Structure)
            .with_member(Member::new("status", string_shape_id()).with_trait("httpResponseCode", true.into()));
        let response = HttpResponseParts::new(201, vec![], vec![]);
        let output = build_output(&shape, &response, &JsonCodec).unwrap();
        assert_eq!(output.get("status").and_then(|d| d.as_bool()), None);
        assert_eq!(output.get("status").unwrap().clone(), Document::Number(201.into()));
    }

    #[test]
    fn header_extractor_resolves_error_shape_before_body_is_consulted() {
        let registry = SchemaRegistry::builder()
            .shape(Shape::new(ShapeId::new("com.example", "NotFound"), ShapeKind::Structure).with_trait("error", "client".into()))
            .build();
        let op = OperationSchema::new(
            ShapeId::new("com.example", "GetWidget"),
            ShapeId::new("com.example", "In"),
            ShapeId::new("com.example", "Out"),
        )
        .with_error(ShapeId::new("com.example", "NotFound"));

        let response = HttpResponseParts::new(404, vec![("x-error-type".to_string(), "NotFound".to_string())], b"{}".to_vec());
        let extractor = ErrorHeaderExtractor::named("x-error-type");
        let err = build_error(&response, &op, &registry, &JsonCodec, &extractor, "com.example", None);
        assert!(matches!(err, Error::Modeled(m) if m.shape == ShapeId::new("com.example", "NotFound")));
    }

    #[test]
    fn unresolvable_error_falls_back_to_unmodeled_classified_by_status() {
        let registry = SchemaRegistry::builder().build();
        let op = OperationSchema::new(
            ShapeId::new("com.example", "GetWidget"),
            ShapeId::new("com.example", "In"),
            ShapeId::new("com.example", "Out"),
        );
        let response = HttpResponseParts::new(503, vec![], vec![]);
        let err = build_error(&response, &op, &registry, &JsonCodec, &ErrorHeaderExtractor::default(), "com.example", None);
        assert!(matches!(err, Error::Unmodeled { fault: Fault::Server, .. }));
    }

    #[test]
    fn unmodeled_message_includes_version_status_and_operation_id() {
        let registry = SchemaRegistry::builder().build();
        let op = OperationSchema::new(
            ShapeId::new("com.example", "GetWidget"),
            ShapeId::new("com.example", "In"),
            ShapeId::new("com.example", "Out"),
        );
        let response = HttpResponseParts::new(503, vec![], vec![]).with_version("HTTP/2.0");
        let err = build_error(&response, &op, &registry, &JsonCodec, &ErrorHeaderExtractor::default(), "com.example", None);
        match err {
            Error::Unmodeled { message, .. } => {
                assert!(message.contains("HTTP/2.0"));
                assert!(message.contains("503"));
                assert!(message.contains("com.example#GetWidget"));
            }
            other => panic!("expected Unmodeled, got {other:?}"),
        }
    }

    #[test]
    fn unknown_error_factory_overrides_the_default_unmodeled_error() {
        let registry = SchemaRegistry::builder().build();
        let op = OperationSchema::new(
            ShapeId::new("com.example", "GetWidget"),
            ShapeId::new("com.example", "In"),
            ShapeId::new("com.example", "Out"),
        );
        let response = HttpResponseParts::new(400, vec![], br#"{"__type":"com.foo#SomeUnknownError"}"#.to_vec());
        let factory: &UnknownErrorFactory = &|_response, _operation| Error::Unmodeled {
            fault: Fault::Client,
            message: "Hi!".to_string(),
            raw: RawResponse {
                status: Some(400),
                headers: vec![],
                body: vec![],
            },
        };
        let err = build_error(
            &response,
            &op,
            &registry,
            &JsonCodec,
            &ErrorHeaderExtractor::default(),
            "com.example",
            Some(factory),
        );
        assert!(matches!(err, Error::Unmodeled { fault: Fault::Client, message, .. } if message == "Hi!"));
    }
}
