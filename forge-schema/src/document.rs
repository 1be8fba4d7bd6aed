use std::collections::BTreeMap;

use serde_json::Number;

/// A self-describing dynamically typed value.
///
/// Used at call sites where no static schema is bound yet, or where a
/// payload's shape is not known ahead of time (e.g. a union discriminant
/// read before the full value is decoded). Round-tripping between a
/// `Document` and a schema-bound value is defined member-by-member, by
/// member name or by a `jsonName`/`xmlName` trait override.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Blob(Vec<u8>),
    List(Vec<Document>),
    Map(BTreeMap<String, Document>),
}

impl Document {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Document>> {
        match self {
            Document::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Document::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_map().and_then(|m| m.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Bool(b),
            serde_json::Value::Number(n) => Document::Number(n),
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(a) => Document::List(a.into_iter().map(Document::from).collect()),
            serde_json::Value::Object(o) => {
                Document::Map(o.into_iter().map(|(k, v)| (k, Document::from(v))).collect())
            }
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => serde_json::Value::Null,
            Document::Bool(b) => serde_json::Value::Bool(b),
            Document::Number(n) => serde_json::Value::Number(n),
            Document::String(s) => serde_json::Value::String(s),
            Document::Blob(bytes) => {
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Document::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            Document::Map(m) => {
                serde_json::Value::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_value() {
        let value = serde_json::json!({"a": 1, "b": [true, null, "x"]});
        let doc = Document::from(value.clone());
        let back: serde_json::Value = doc.into();
        assert_eq!(value, back);
    }

    #[test]
    fn get_reads_map_members() {
        let doc = Document::from(serde_json::json!({"name": "widget"}));
        assert_eq!(doc.get("name").and_then(Document::as_str), Some("widget"));
        assert_eq!(doc.get("missing"), None);
    }
}
