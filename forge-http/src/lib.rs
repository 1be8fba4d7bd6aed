//! HTTP-binding protocol engine: turns a schema-bound input value into an
//! HTTP request, and an HTTP response back into an output or error value.
//!
//! This crate knows path templates, query/header/payload/body member
//! binding, and endpoint merging. It knows nothing about signing, retries,
//! or which transport actually sends the bytes — those live in
//! `forge-auth`, `forge-retry`, and `forge-transport`.

pub mod binding;
pub mod http_trait;
pub mod merge;
pub mod path;
pub mod protocol;
pub mod query;
pub mod request;
pub mod response;

pub use binding::{classify_input, classify_output, scalar_to_wire_string, Binding};
pub use http_trait::{ErrorHeaderExtractor, HttpTrait, HttpTraitError};
pub use path::{InvalidPattern, PathPattern, Segment};
pub use protocol::HttpBindingProtocol;
pub use query::QueryParams;
pub use request::{build_request, HttpRequestParts};
pub use response::{build_error, build_output, HttpResponseParts, UnknownErrorFactory};
