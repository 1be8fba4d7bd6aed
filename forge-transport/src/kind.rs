/// The wire style a protocol and a transport must agree on (§9 "Pluggable
/// protocol/transport compatibility"). A protocol declares the kind it
/// produces requests for; a transport advertises the kinds it can send.
/// The client rejects a mismatched pair at construction time rather than
/// probing types at runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageExchangeKind {
    Http,
}

impl std::fmt::Display for MessageExchangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageExchangeKind::Http => write!(f, "http"),
        }
    }
}
