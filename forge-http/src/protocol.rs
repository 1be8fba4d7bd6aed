use forge_core::{Endpoint, Error};
use forge_schema::{Document, OperationSchema, PayloadCodec, SchemaRegistry};

use crate::http_trait::{ErrorHeaderExtractor, HttpTrait};
use crate::request::{build_request, HttpRequestParts};
use crate::response::{build_error, build_output, HttpResponseParts, UnknownErrorFactory};

/// Binds one operation's `http` trait, error header extractor, and payload
/// codec into the handful of calls the execution pipeline needs: serialize
/// an input, and deserialize a response as either an output or an error.
///
/// One instance is built per operation at client construction and held by
/// the pipeline for the life of the client; it carries no per-call state.
pub struct HttpBindingProtocol<'a> {
    pub registry: &'a SchemaRegistry,
    pub codec: &'a dyn PayloadCodec,
    pub default_namespace: &'a str,
}

impl<'a> HttpBindingProtocol<'a> {
    pub fn new(registry: &'a SchemaRegistry, codec: &'a dyn PayloadCodec, default_namespace: &'a str) -> Self {
        Self {
            registry,
            codec,
            default_namespace,
        }
    }

    pub fn serialize_input(
        &self,
        operation: &OperationSchema,
        http_trait: &HttpTrait,
        input: &Document,
        endpoint: &Endpoint,
    ) -> Result<HttpRequestParts, Error> {
        let input_shape = self
            .registry
            .shape(&operation.input)
            .ok_or_else(|| Error::serialization(format!("unregistered input shape {}", operation.input)))?;
        build_request(input_shape, input, http_trait, self.codec, endpoint)
    }

    pub fn deserialize_output(
        &self,
        operation: &OperationSchema,
        response: &HttpResponseParts,
    ) -> Result<Document, Error> {
        let output_shape = self
            .registry
            .shape(&operation.output)
            .ok_or_else(|| Error::serialization(format!("unregistered output shape {}", operation.output)))?;
        build_output(output_shape, response, self.codec)
    }

    pub fn deserialize_error(
        &self,
        operation: &OperationSchema,
        response: &HttpResponseParts,
        header_extractor: &ErrorHeaderExtractor,
        unknown_error_factory: Option<&UnknownErrorFactory>,
    ) -> Error {
        build_error(
            response,
            operation,
            self.registry,
            self.codec,
            header_extractor,
            self.default_namespace,
            unknown_error_factory,
        )
    }

    /// Whether `status` should be treated as a successful response for this
    /// operation's `http` trait (an exact match, since success codes are not
    /// ranges in this model).
    pub fn is_success(&self, http_trait: &HttpTrait, status: u16) -> bool {
        status == http_trait.code
    }
}
