use std::sync::Arc;

use crate::id::ShapeId;
use crate::traits::TraitMap;

/// The structural kind of a shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    Structure,
    Union,
    List,
    Map,
    Enum,
    Scalar,
    Blob,
    Operation,
    Service,
    Member,
}

/// A member of a structure/union shape: a name, the shape it targets, and
/// its own traits (e.g. `httpLabel`, `required`).
#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub target: ShapeId,
    pub traits: TraitMap,
}

impl Member {
    pub fn new(name: impl Into<String>, target: ShapeId) -> Self {
        Self {
            name: name.into(),
            target,
            traits: TraitMap::new(),
        }
    }

    pub fn with_trait(mut self, id: impl Into<String>, value: serde_json::Value) -> Self {
        self.traits = self.traits.with(id, value);
        self
    }

    pub fn is_required(&self) -> bool {
        self.traits.has(crate::traits::well_known::REQUIRED)
    }
}

/// A structural description of one shape in the model: its kind, traits,
/// and (for aggregate kinds) an ordered member list.
///
/// Shapes referencing each other form a graph that may be cyclic (e.g. a
/// recursive tree structure). The registry stores shapes by id and member
/// targets are resolved lazily by lookup rather than by embedding, so a
/// cycle never requires unbounded recursion to construct.
#[derive(Clone)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub traits: TraitMap,
    members: Vec<Member>,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            traits: TraitMap::new(),
            members: Vec::new(),
        }
    }

    pub fn with_trait(mut self, id: impl Into<String>, value: serde_json::Value) -> Self {
        self.traits = self.traits.with(id, value);
        self
    }

    /// Append a member. Panics in debug builds if the member name is
    /// already present, matching the schema invariant that member names
    /// are unique within a structure.
    pub fn with_member(mut self, member: Member) -> Self {
        debug_assert!(
            !self.members.iter().any(|m| m.name == member.name),
            "duplicate member name `{}` on shape {}",
            member.name,
            self.id
        );
        self.members.push(member);
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// An operation shape: input/output shapes, the set of error shapes it can
/// raise, and the auth schemes it accepts, in priority order.
#[derive(Clone)]
pub struct OperationSchema {
    pub id: ShapeId,
    pub input: ShapeId,
    pub output: ShapeId,
    pub errors: Vec<ShapeId>,
    pub auth_schemes: Vec<String>,
    pub traits: TraitMap,
}

impl OperationSchema {
    pub fn new(id: ShapeId, input: ShapeId, output: ShapeId) -> Self {
        Self {
            id,
            input,
            output,
            errors: Vec::new(),
            auth_schemes: Vec::new(),
            traits: TraitMap::new(),
        }
    }

    pub fn with_error(mut self, error: ShapeId) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_auth_scheme(mut self, scheme_id: impl Into<String>) -> Self {
        self.auth_schemes.push(scheme_id.into());
        self
    }

    pub fn with_trait(mut self, id: impl Into<String>, value: serde_json::Value) -> Self {
        self.traits = self.traits.with(id, value);
        self
    }

    /// Whether this operation is safe to retry without an idempotency
    /// token, per the `readonly`/`idempotent` model traits.
    pub fn is_inherently_retryable(&self) -> bool {
        use crate::traits::well_known::{IDEMPOTENT, READONLY};
        self.traits.has(READONLY) || self.traits.has(IDEMPOTENT)
    }
}

/// In-memory registry of shapes and operations, looked up by [`ShapeId`].
///
/// The registry is immutable after construction (built once via
/// [`SchemaRegistryBuilder`] at client boot) and is shared (`Arc`) across
/// every call the client makes.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    shapes: std::collections::HashMap<ShapeId, Shape>,
    operations: std::collections::HashMap<ShapeId, OperationSchema>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.inner.shapes.get(id)
    }

    pub fn operation(&self, id: &ShapeId) -> Option<&OperationSchema> {
        self.inner.operations.get(id)
    }

    /// Resolve an error shape, promoting a relative name to `default_namespace`
    /// if the absolute form is not registered.
    pub fn resolve_error(&self, reference: &str, default_namespace: &str) -> Option<&Shape> {
        let id = ShapeId::resolve(reference, default_namespace);
        self.shape(&id).filter(|s| matches!(s.kind, ShapeKind::Structure))
    }
}

#[derive(Default)]
pub struct SchemaRegistryBuilder {
    shapes: std::collections::HashMap<ShapeId, Shape>,
    operations: std::collections::HashMap<ShapeId, OperationSchema>,
}

impl SchemaRegistryBuilder {
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shapes.insert(shape.id.clone(), shape);
        self
    }

    pub fn operation(mut self, op: OperationSchema) -> Self {
        self.operations.insert(op.id.clone(), op);
        self
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            inner: Arc::new(Inner {
                shapes: self.shapes,
                operations: self.operations,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> ShapeId {
        ShapeId::new("com.example", name)
    }

    #[test]
    fn builder_registers_and_looks_up_shapes() {
        let registry = SchemaRegistry::builder()
            .shape(
                Shape::new(ns("Widget"), ShapeKind::Structure)
                    .with_member(Member::new("id", ns("String")).with_trait("required", true.into())),
            )
            .build();

        let shape = registry.shape(&ns("Widget")).unwrap();
        assert_eq!(shape.members().len(), 1);
        assert!(shape.member("id").unwrap().is_required());
    }

    #[test]
    fn resolve_error_promotes_relative_name() {
        let registry = SchemaRegistry::builder()
            .shape(Shape::new(ns("NotFound"), ShapeKind::Structure).with_trait("error", "client".into()))
            .build();

        let shape = registry.resolve_error("NotFound", "com.example").unwrap();
        assert_eq!(shape.id, ns("NotFound"));
    }

    #[test]
    fn operation_idempotency_via_traits() {
        let op = OperationSchema::new(ns("GetWidget"), ns("GetWidgetInput"), ns("GetWidgetOutput"))
            .with_trait("readonly", serde_json::Value::Null);
        assert!(op.is_inherently_retryable());

        let op2 = OperationSchema::new(ns("DeleteWidget"), ns("In"), ns("Out"));
        assert!(!op2.is_inherently_retryable());
    }
}
