//! Mock transport for exercising a `forge` client without a network: a
//! [`mock::MockTransport`] records every outbound request and resolves it
//! against matchers consulted in registration order (§4.6), so a test can
//! assert on what the client sent and control exactly what it gets back —
//! a pre-built response, an output serialized through the codec, or a
//! fabricated error.

pub mod mock;

pub use mock::{decode_output, MockMatcher, MockOutcome, MockTransport};
