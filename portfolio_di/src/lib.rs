//! Minimal compile time dependency injection.
//!
//! Services declare their dependencies as struct fields and derive [`Build`].
//! A provider created with [`provider!`] owns the leaf dependencies (database
//! handles, configuration structs) and caches every value it builds, so each
//! service type is constructed at most once per provider.

extern crate self as portfolio_di;

pub use portfolio_di_derive::Build;
pub use typemap::TypeMap;

mod macros;
mod typemap;

pub trait Provider: Sized {
    /// Cache of all values built by this provider, indexed by type.
    fn cache(&mut self) -> &mut TypeMap;
}

#[diagnostic::on_unimplemented(
    message = "The type `{Self}` cannot be built using the provider `{P}`",
    note = "Add `{Self}` to the provider `{P}` or implement `Build` for `{Self}` and make sure \
            all dependencies are satisfied"
)]
pub trait Build<P: Provider>: Clone + 'static {
    fn build(provider: &mut P) -> Self;
}

pub trait Provide: Provider {
    fn provide<T: Build<Self>>(&mut self) -> T {
        T::build(self)
    }
}

impl<P: Provider> Provide for P {}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[derive(Debug, Clone)]
    struct Greeting(&'static str);

    #[derive(Debug, Clone, Build)]
    struct Greeter<G> {
        greeting: G,
        #[state]
        calls: Arc<AtomicUsize>,
    }

    #[derive(Debug, Clone, Build)]
    struct App<G> {
        first: Greeter<G>,
        second: Greeter<G>,
    }

    provider! {
        TestProvider {
            greeting: Greeting,
        }
    }

    #[test]
    fn build_reuses_cached_dependencies() {
        // Arrange
        let mut provider = TestProvider {
            _cache: Default::default(),
            greeting: Greeting("hello"),
        };

        // Act
        let app: App<Greeting> = provider.provide();
        app.first.calls.fetch_add(1, Ordering::Relaxed);

        // Assert
        assert_eq!(app.first.greeting.0, "hello");
        assert_eq!(app.second.calls.load(Ordering::Relaxed), 1);
    }
}
