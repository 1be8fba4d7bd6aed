use crate::document::Document;

/// Error from encoding or decoding a payload.
#[derive(Debug)]
pub enum CodecError {
    /// The payload bytes were not valid for this codec's wire format.
    Malformed(String),
    /// A schema-required member was absent from the decoded value.
    MissingMember(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            CodecError::MissingMember(name) => write!(f, "missing required member: {name}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// A pluggable reader/writer that turns a structure value into bytes (and
/// back) without any transport-specific knowledge.
///
/// The HTTP binding engine in `forge-http` holds one of these behind a
/// `&dyn PayloadCodec` and calls it once per body-bound structure; the
/// codec itself never sees headers, status codes, or path segments — those
/// are the binding engine's job. A protocol picks its codec (JSON, CBOR,
/// XML) independently of how it maps members onto the wire envelope.
pub trait PayloadCodec: Send + Sync {
    /// The `content-type` this codec produces and expects.
    fn media_type(&self) -> &'static str;

    /// Serialize a document-shaped value into the wire payload.
    fn encode(&self, value: &Document) -> Result<Vec<u8>, CodecError>;

    /// Parse wire bytes into a document-shaped value. An empty slice
    /// decodes to `Document::Map` with no members, never an error.
    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError>;
}

/// JSON payload codec, the default for `application/json` and the
/// `x-amz-json-1.x` family (the protocol picks the media type string; the
/// wire shape is identical).
#[derive(Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, value: &Document) -> Result<Vec<u8>, CodecError> {
        let json: serde_json::Value = value.clone().into();
        serde_json::to_vec(&json).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError> {
        if bytes.is_empty() {
            return Ok(Document::Map(Default::default()));
        }
        let json: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
        Ok(Document::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec;
        let doc = Document::from(serde_json::json!({"id": "1", "count": 3}));
        let bytes = codec.encode(&doc).unwrap();
        let back = codec.decode(&bytes).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn json_codec_decodes_empty_body_as_empty_map() {
        let codec = JsonCodec;
        let doc = codec.decode(&[]).unwrap();
        assert_eq!(doc, Document::Map(Default::default()));
    }

    #[test]
    fn json_codec_rejects_malformed_bytes() {
        let codec = JsonCodec;
        assert!(codec.decode(b"{not json").is_err());
    }
}
