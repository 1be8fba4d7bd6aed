use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use forge_schema::ShapeId;
use tokio_util::sync::CancellationToken;

use crate::clock::{self, Clock};
use crate::endpoint::Endpoint;

/// Request-scoped store threaded through every phase of a call.
///
/// Well-known fields (operation, region, retry scope, clock, ...) have
/// dedicated accessors; anything else — an interceptor's private scratch
/// state, a protocol-specific hint — goes through the typed extension map,
/// addressed by Rust type the same way the workspace's plugin-data map
/// addresses installed plugins by `TypeId`.
///
/// Writes are allowed throughout the pipeline; reads are allowed anywhere
/// the context is in scope. A `Context` is single-owner per call: cloning
/// is structural (an `Arc`-backed extension map plus `Clone` scalar
/// fields), never a deep copy of attached values.
#[derive(Clone)]
pub struct Context {
    operation: Option<ShapeId>,
    region: Option<String>,
    retry_scope: Option<String>,
    idempotency_token: Option<String>,
    clock: Arc<dyn Clock>,
    features: HashSet<String>,
    endpoint_override: Option<Endpoint>,
    deadline_millis: Option<i64>,
    cancellation: Option<CancellationToken>,
    extensions: Arc<HashMap<TypeId, Box<dyn AnyClone>>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            operation: None,
            region: None,
            retry_scope: None,
            idempotency_token: None,
            clock: clock::system(),
            features: HashSet::new(),
            endpoint_override: None,
            deadline_millis: None,
            cancellation: None,
            extensions: Arc::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_operation(mut self, operation: ShapeId) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_retry_scope(mut self, scope: impl Into<String>) -> Self {
        self.retry_scope = Some(scope.into());
        self
    }

    pub fn with_idempotency_token(mut self, token: impl Into<String>) -> Self {
        self.idempotency_token = Some(token.into());
        self
    }

    pub fn with_endpoint_override(mut self, endpoint: Endpoint) -> Self {
        self.endpoint_override = Some(endpoint);
        self
    }

    /// Set a call-scoped deadline `timeout` from now, per the clock
    /// already attached to this context (§5 "Timeouts"). Call after
    /// [`Context::with_clock`] if a test needs the deadline computed
    /// against a [`crate::clock::FixedClock`] rather than the system clock.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.deadline_millis = Some(self.clock.now_millis().saturating_add(timeout.as_millis() as i64));
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn add_feature(&mut self, id: impl Into<String>) {
        self.features.insert(id.into());
    }

    pub fn operation(&self) -> Option<&ShapeId> {
        self.operation.as_ref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn retry_scope(&self) -> Option<&str> {
        self.retry_scope.as_deref()
    }

    pub fn idempotency_token(&self) -> Option<&str> {
        self.idempotency_token.as_deref()
    }

    pub fn set_idempotency_token(&mut self, token: impl Into<String>) {
        self.idempotency_token = Some(token.into());
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn features(&self) -> &HashSet<String> {
        &self.features
    }

    pub fn endpoint_override(&self) -> Option<&Endpoint> {
        self.endpoint_override.as_ref()
    }

    /// Time left before the call-scoped deadline set by
    /// [`Context::with_call_timeout`], or `None` if no deadline was set.
    /// A deadline already in the past yields `Duration::ZERO`, not `None`
    /// — the caller is expected to treat that as an immediate timeout.
    pub fn remaining_call_time(&self) -> Option<Duration> {
        let deadline = self.deadline_millis?;
        let remaining = deadline.saturating_sub(self.clock.now_millis());
        Some(Duration::from_millis(remaining.max(0) as u64))
    }

    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Insert a value into the typed extension map, keyed by `T`'s type.
    /// A later insert of the same type replaces the earlier value.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        let mut map = (*self.extensions).clone_map();
        map.insert(TypeId::of::<T>(), Box::new(value));
        self.extensions = Arc::new(map);
    }

    /// Read a value from the typed extension map.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
            .cloned()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe clone bound for boxed extension values.
trait AnyClone: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn AnyClone>;
}

impl<T: Clone + Send + Sync + 'static> AnyClone for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnyClone> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn AnyClone> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

trait CloneMap {
    fn clone_map(&self) -> HashMap<TypeId, Box<dyn AnyClone>>;
}

impl CloneMap for HashMap<TypeId, Box<dyn AnyClone>> {
    fn clone_map(&self) -> HashMap<TypeId, Box<dyn AnyClone>> {
        self.iter().map(|(k, v)| (*k, v.clone())).collect()
    }
}
