//! Message-exchange-typed transport abstraction (§3 "Transport
//! abstraction"): a [`Transport`] sends the wire requests a protocol
//! produces, tagged by the [`MessageExchangeKind`] the two must agree on,
//! discovered at client-build time through a [`TransportRegistry`] rather
//! than type probing. [`ReqwestTransport`] is the bundled HTTP transport.

pub mod kind;
pub mod registry;
pub mod reqwest_transport;
pub mod transport;

pub use kind::MessageExchangeKind;
pub use registry::{TransportRegistry, TransportRegistryBuilder};
pub use reqwest_transport::{ReqwestTransport, ReqwestTransportBuilder};
pub use transport::Transport;

pub mod prelude {
    //! Re-exports of the most commonly used transport types.
    pub use crate::{MessageExchangeKind, ReqwestTransport, Transport, TransportRegistry};
}
