use forge_core::{Context, Error};
use forge_http::{HttpRequestParts, HttpResponseParts};
use forge_schema::Document;

/// The fixed hook set a pipeline attempt invokes, in the order given in
/// §4.1. Every method defaults to a no-op so an interceptor only
/// implements the phases it cares about.
///
/// `read_*` hooks only observe; `modify_*` hooks thread a value through
/// and may transform it. Both kinds may write to `context` (e.g. stamping
/// an id, recording a timer start) since the context is single-owner per
/// call and hooks run strictly sequentially — never concurrently.
pub trait Interceptor: Send + Sync {
    fn read_before_execution(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_serialization(&self, _context: &mut Context, input: Document) -> Result<Document, Error> {
        Ok(input)
    }

    fn read_before_serialization(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn read_after_serialization(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_retry_loop(&self, _context: &mut Context, request: HttpRequestParts) -> Result<HttpRequestParts, Error> {
        Ok(request)
    }

    fn read_before_attempt(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_signing(&self, _context: &mut Context, request: HttpRequestParts) -> Result<HttpRequestParts, Error> {
        Ok(request)
    }

    fn read_before_signing(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn read_after_signing(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_transmit(&self, _context: &mut Context, request: HttpRequestParts) -> Result<HttpRequestParts, Error> {
        Ok(request)
    }

    fn read_before_transmit(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn read_after_transmit(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_deserialization(&self, _context: &mut Context, response: HttpResponseParts) -> Result<HttpResponseParts, Error> {
        Ok(response)
    }

    fn read_before_deserialization(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn read_after_deserialization(&self, _context: &mut Context, _error: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_attempt_completion(&self, _context: &mut Context, error: Option<Error>) -> Result<Option<Error>, Error> {
        Ok(error)
    }

    fn read_after_attempt(&self, _context: &mut Context, _error: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }

    fn modify_before_completion(&self, _context: &mut Context, error: Option<Error>) -> Result<Option<Error>, Error> {
        Ok(error)
    }

    fn read_after_execution(&self, _context: &mut Context, _error: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }
}
