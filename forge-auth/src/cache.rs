use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_cache::TtlCache;
use forge_core::Error;

use crate::identity::{Identity, IdentityResolver};
use crate::properties::IdentityProperties;

/// Wraps an [`IdentityResolver`] with a TTL cache keyed by a caller-supplied
/// function of its properties, so a resolver that performs network I/O
/// (JWKS-backed bearer validation, profile-file reads) isn't re-invoked on
/// every call (the ambient "Identity caching" behavior: cache hit returns
/// the cached identity, a miss or expired entry re-invokes the inner
/// resolver, and resolver errors are never cached).
pub struct CachingIdentityResolver<F> {
    inner: Arc<dyn IdentityResolver>,
    cache: TtlCache<String, Identity>,
    cache_key: F,
}

impl<F> CachingIdentityResolver<F>
where
    F: Fn(&IdentityProperties) -> String + Send + Sync,
{
    pub fn new(inner: Arc<dyn IdentityResolver>, ttl: Duration, cache_key: F) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
            cache_key,
        }
    }
}

#[async_trait]
impl<F> IdentityResolver for CachingIdentityResolver<F>
where
    F: Fn(&IdentityProperties) -> String + Send + Sync,
{
    async fn resolve(&self, properties: &IdentityProperties) -> Result<Identity, Error> {
        let key = (self.cache_key)(properties);
        if let Some(identity) = self.cache.get(&key) {
            return Ok(identity);
        }
        let identity = self.inner.resolve(properties).await?;
        self.cache.insert(key, identity.clone());
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityResolver for CountingResolver {
        async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Identity::BearerToken("token".into()))
        }
    }

    #[tokio::test]
    async fn a_cache_hit_does_not_re_invoke_the_inner_resolver() {
        let inner = Arc::new(CountingResolver { calls: AtomicUsize::new(0) });
        let resolver = CachingIdentityResolver::new(inner.clone(), Duration::from_secs(60), |_| "fixed".to_string());

        resolver.resolve(&IdentityProperties::empty()).await.unwrap();
        resolver.resolve(&IdentityProperties::empty()).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_cache_keys_are_resolved_independently() {
        let inner = Arc::new(CountingResolver { calls: AtomicUsize::new(0) });
        let resolver = CachingIdentityResolver::new(inner.clone(), Duration::from_secs(60), |p: &IdentityProperties| {
            p.get_str("region").unwrap_or("none").to_string()
        });

        resolver.resolve(&IdentityProperties::empty().insert("region", "us-east-1")).await.unwrap();
        resolver.resolve(&IdentityProperties::empty().insert("region", "us-west-2")).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
