use std::any::{Any, TypeId};
use std::collections::HashSet;

/// A composable unit of client configuration, installed into a builder via
/// `.plugin(...)`.
///
/// Plugins are applied to a builder through [`PluginIdempotence`], which
/// tracks installed plugin types by [`TypeId`] so that re-applying the same
/// plugin to the same builder is a no-op — mirroring the teacher's
/// `plugin_data` map keyed by type rather than by a runtime name.
pub trait Plugin<B>: Send + 'static {
    /// Configure `builder`, returning the modified builder.
    fn apply(self: Box<Self>, builder: B) -> B;
}

/// Tracks which plugin types have already been installed on a builder, so
/// that applying the same plugin class twice is a no-op rather than
/// double-registering whatever state it configures.
#[derive(Default)]
pub struct PluginIdempotence {
    installed: HashSet<TypeId>,
}

impl PluginIdempotence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `P` is seen, `false` on every
    /// subsequent call — the caller uses this to skip re-applying.
    pub fn mark<P: Any>(&mut self) -> bool {
        self.installed.insert(TypeId::of::<P>())
    }

    pub fn contains<P: Any>(&self) -> bool {
        self.installed.contains(&TypeId::of::<P>())
    }
}

impl Clone for PluginIdempotence {
    /// A `toBuilder` snapshot starts from the same installed-set so that a
    /// plugin applied before the snapshot cannot be silently reinstalled by
    /// a later `.plugin(...)` call on the copy, while the copy remains free
    /// to install additional plugins the original never saw.
    fn clone(&self) -> Self {
        Self {
            installed: self.installed.clone(),
        }
    }
}
