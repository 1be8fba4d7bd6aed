use std::collections::HashMap;
use std::sync::Arc;

use forge_core::Error;

use crate::kind::MessageExchangeKind;
use crate::transport::Transport;

/// Process-wide, immutable-after-construction catalog of transports keyed
/// by [`MessageExchangeKind`] (§9 "Global state": "Define them as explicit
/// registries constructed once at client boot; avoid hidden singletons").
pub struct TransportRegistry {
    transports: HashMap<MessageExchangeKind, Arc<dyn Transport>>,
}

impl TransportRegistry {
    pub fn builder() -> TransportRegistryBuilder {
        TransportRegistryBuilder::default()
    }

    /// Look up the transport for `kind`, the runtime-side half of §9's
    /// "catalog lookup on the declared kind, not type probing".
    pub fn resolve(&self, kind: MessageExchangeKind) -> Result<Arc<dyn Transport>, Error> {
        self.transports
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::serialization(format!("no transport registered for message exchange kind `{kind}`")))
    }

    /// Every registered `(kind, transport)` pair, for a caller that needs
    /// to seed a new builder from an already-built registry (e.g. a
    /// per-call override snapshot).
    pub fn entries(&self) -> impl Iterator<Item = (&MessageExchangeKind, &Arc<dyn Transport>)> {
        self.transports.iter()
    }
}

#[derive(Default)]
pub struct TransportRegistryBuilder {
    transports: HashMap<MessageExchangeKind, Arc<dyn Transport>>,
}

impl TransportRegistryBuilder {
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.insert(transport.message_exchange_kind(), transport);
        self
    }

    pub fn build(self) -> TransportRegistry {
        TransportRegistry {
            transports: self.transports,
        }
    }
}
