use std::sync::Arc;

use forge_core::Error;

use crate::interceptor::Interceptor;

/// Holds interceptors in registration order and dispatches the two hook
/// shapes the pipeline uses (§4.5):
///
/// - `dispatch_read`: every interceptor is invoked regardless of earlier
///   failures; if k interceptors return `Err`, the chain surfaces the
///   **last** one (§8.2).
/// - `dispatch_modify`: the value is threaded left-to-right through each
///   interceptor's transform; the first `Err` aborts the phase (§8.3).
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptors in registration order, so a caller can rebuild a fresh
    /// mutable chain (e.g. a per-call override snapshot) seeded with the
    /// same set plus whatever it adds on top.
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub fn dispatch_read<F>(&self, mut call: F) -> Result<(), Error>
    where
        F: FnMut(&dyn Interceptor) -> Result<(), Error>,
    {
        let mut last_err = None;
        for interceptor in &self.interceptors {
            if let Err(e) = call(interceptor.as_ref()) {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn dispatch_modify<T, F>(&self, mut value: T, mut call: F) -> Result<T, Error>
    where
        F: FnMut(&dyn Interceptor, T) -> Result<T, Error>,
    {
        for interceptor in &self.interceptors {
            value = call(interceptor.as_ref(), value)?;
        }
        Ok(value)
    }
}

impl FromIterator<Arc<dyn Interceptor>> for InterceptorChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Interceptor>>>(iter: I) -> Self {
        Self {
            interceptors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use forge_core::Context;
    use forge_schema::Document;

    use super::*;

    struct CountsCalls(Arc<AtomicUsize>);
    impl Interceptor for CountsCalls {
        fn read_before_execution(&self, _context: &mut Context) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysErrors(&'static str);
    impl Interceptor for AlwaysErrors {
        fn read_before_execution(&self, _context: &mut Context) -> Result<(), Error> {
            Err(Error::serialization(self.0))
        }
    }

    #[test]
    fn read_dispatch_runs_every_interceptor_and_surfaces_the_last_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(AlwaysErrors("first")));
        chain.push(Arc::new(CountsCalls(counter.clone())));
        chain.push(Arc::new(AlwaysErrors("last")));

        let mut context = Context::new();
        let result = chain.dispatch_read(|i| i.read_before_execution(&mut context));

        assert_eq!(counter.load(Ordering::SeqCst), 1, "every interceptor must still run");
        match result {
            Err(Error::Serialization(msg)) => assert_eq!(msg, "last"),
            other => panic!("expected the last error to win, got {other:?}"),
        }
    }

    #[test]
    fn modify_dispatch_threads_the_value_and_aborts_on_first_error() {
        struct Uppercase;
        impl Interceptor for Uppercase {
            fn modify_before_serialization(&self, _context: &mut Context, input: Document) -> Result<Document, Error> {
                match input {
                    Document::String(s) => Ok(Document::String(s.to_uppercase())),
                    other => Ok(other),
                }
            }
        }

        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(Uppercase));
        let mut context = Context::new();
        let result = chain
            .dispatch_modify(Document::String("hi".into()), |i, v| i.modify_before_serialization(&mut context, v))
            .unwrap();
        assert_eq!(result, Document::String("HI".into()));
    }

    #[test]
    fn interceptors_accessor_round_trips_through_from_iter() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(CountsCalls(counter.clone())));
        chain.push(Arc::new(CountsCalls(counter.clone())));

        let rebuilt: InterceptorChain = chain.interceptors().to_vec().into_iter().collect();
        let mut context = Context::new();
        rebuilt.dispatch_read(|i| i.read_before_execution(&mut context)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
