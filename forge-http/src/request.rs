use std::collections::BTreeMap;

use forge_core::{DataStream, Endpoint, Error};
use forge_schema::{traits::well_known, Document, PayloadCodec, Shape};

use crate::binding::{classify_input, scalar_to_wire_string, Binding};
use crate::http_trait::HttpTrait;
use crate::merge;
use crate::query::QueryParams;

/// A fully materialized HTTP request, independent of any particular HTTP
/// client library.
#[derive(Clone, Debug)]
pub struct HttpRequestParts {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Project `input` onto an HTTP request per the operation's `input_shape`
/// and `http_trait`, using `codec` for whichever members land in the body.
pub fn build_request(
    input_shape: &Shape,
    input: &Document,
    http_trait: &HttpTrait,
    codec: &dyn PayloadCodec,
    endpoint: &Endpoint,
) -> Result<HttpRequestParts, Error> {
    let fields = input
        .as_map()
        .ok_or_else(|| Error::serialization("input value is not a structure"))?;

    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    let mut query = QueryParams::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut payload_member: Option<&str> = None;
    let mut body_fields: BTreeMap<String, Document> = BTreeMap::new();

    for member in input_shape.members() {
        let Some(value) = fields.get(&member.name) else {
            continue;
        };
        match classify_input(member) {
            Binding::Label => {
                let rendered = scalar_to_wire_string(value, member)
                    .ok_or_else(|| Error::serialization(format!("label `{}` has no scalar value", member.name)))?;
                labels.insert(member.name.clone(), rendered);
            }
            Binding::Query(key) => push_multi(&mut query, &key, value, member),
            Binding::Header(key) => push_header(&mut headers, &key, value, member),
            Binding::Payload => payload_member = Some(member.name.as_str()),
            Binding::Body => {
                body_fields.insert(member.name.clone(), value.clone());
            }
            Binding::StatusCode => {}
        }
    }

    let path = http_trait
        .pattern
        .render(|name| labels.get(name).cloned())
        .map_err(|e| Error::serialization(e.to_string()))?;

    let mut merged = merge::merge(endpoint.uri(), &path);
    if !query.is_empty() {
        merged.push('?');
        merged.push_str(&query.render());
    }

    let mut stream_content_type: Option<String> = None;
    let body = match payload_member {
        Some(name) => {
            let value = fields.get(name).cloned().unwrap_or(Document::Null);
            if let Some(member) = input_shape.member(name).filter(|m| m.traits.has(well_known::STREAMING)) {
                let raw = match value {
                    Document::Blob(bytes) => bytes,
                    Document::String(s) => s.into_bytes(),
                    Document::Null => Vec::new(),
                    other => codec
                        .encode(&other)
                        .map_err(|e| Error::serialization(e.to_string()))?,
                };
                let mut stream = DataStream::from_bytes(raw);
                if let Some(media_type) = member.traits.get_str(well_known::MEDIA_TYPE) {
                    stream = stream.with_content_type(media_type.to_string());
                }
                stream_content_type = stream.content_type().map(str::to_string);
                stream.read().map(|bytes| bytes.to_vec()).unwrap_or_default()
            } else {
                codec.encode(&value).map_err(|e| Error::serialization(e.to_string()))?
            }
        }
        None if body_fields.is_empty() => Vec::new(),
        None => {
            let doc = Document::Map(body_fields.into_iter().collect());
            codec.encode(&doc).map_err(|e| Error::serialization(e.to_string()))?
        }
    };

    if !body.is_empty() && !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
        let media_type = stream_content_type.unwrap_or_else(|| codec.media_type().to_string());
        headers.push(("content-type".to_string(), media_type));
    }

    for (name, value) in endpoint.extra_headers() {
        headers.push((name.clone(), value.clone()));
    }

    Ok(HttpRequestParts {
        method: http_trait.method.clone(),
        uri: merged,
        headers,
        body,
    })
}

fn push_multi(query: &mut QueryParams, key: &str, value: &Document, member: &forge_schema::Member) {
    match value {
        Document::List(items) => {
            for item in items {
                if let Some(s) = scalar_to_wire_string(item, member) {
                    query.push(key, s);
                }
            }
        }
        other => {
            if let Some(s) = scalar_to_wire_string(other, member) {
                query.push(key, s);
            }
        }
    }
}

fn push_header(headers: &mut Vec<(String, String)>, key: &str, value: &Document, member: &forge_schema::Member) {
    let packed = member.traits.get_str("httpHeaderPacking") == Some("comma");
    match value {
        Document::List(items) if packed => {
            let joined = items
                .iter()
                .filter_map(|item| scalar_to_wire_string(item, member))
                .collect::<Vec<_>>()
                .join(", ");
            if !joined.is_empty() {
                headers.push((key.to_string(), joined));
            }
        }
        Document::List(items) => {
            for item in items {
                if let Some(s) = scalar_to_wire_string(item, member) {
                    headers.push((key.to_string(), s));
                }
            }
        }
        other => {
            if let Some(s) = scalar_to_wire_string(other, member) {
                headers.push((key.to_string(), s));
            }
        }
    }
}
