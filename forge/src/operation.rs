use forge_core::Error;
use forge_http::HttpTrait;
use forge_schema::{traits::well_known, OperationSchema};

/// Parse the `http` trait carried on `operation` into a usable
/// [`HttpTrait`]. Done once per call rather than cached on the operation
/// schema itself, since `OperationSchema` only carries traits as opaque
/// JSON values until something downstream needs them typed.
pub fn http_trait_for(operation: &OperationSchema) -> Result<HttpTrait, Error> {
    let value = operation
        .traits
        .get(well_known::HTTP)
        .ok_or_else(|| Error::serialization(format!("operation {} has no `http` trait", operation.id)))?;
    HttpTrait::from_trait_value(value).map_err(|e| Error::serialization(e.to_string()))
}
