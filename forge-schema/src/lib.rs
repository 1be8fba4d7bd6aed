//! Shape/trait/operation schema registry for forge RPC clients.
//!
//! A [`SchemaRegistry`] is the in-memory model a generated client ships with:
//! it describes every structure, union, list, map, enum, and operation shape
//! the service exposes, addressed by [`ShapeId`]. The HTTP binding engine in
//! `forge-http` and the auth/retry layers in `forge-auth`/`forge-retry`
//! consult it to know which members bind where and which errors are modeled.

pub mod codec;
pub mod document;
pub mod id;
pub mod schema;
pub mod traits;

pub use codec::{CodecError, JsonCodec, PayloadCodec};
pub use document::Document;
pub use id::ShapeId;
pub use schema::{Member, OperationSchema, Shape, ShapeKind, SchemaRegistry, SchemaRegistryBuilder};
pub use traits::TraitMap;
