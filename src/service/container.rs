//! Service container.
//!
//! # Responsibilities
//! - Bind literal values and lazy factories to service keys
//! - Build registered `Injectable` services from their declared dependencies
//! - Invoke callables with arguments resolved from provided values or the
//!   container
//!
//! # Design Decisions
//! - Resolution order: literal → factory → autowired constructor
//! - A factory runs at most once; concurrent first resolutions block on the
//!   same cell and all observe the single produced instance
//! - A produced instance is bound like a literal, so registering another
//!   factory for the same type afterwards does not replace it
//! - Autowired services are built fresh on every resolution
//! - Registration takes `&self` so the container can be shared behind `Arc`
//! - No cycle detection: a self-referential graph overflows the stack

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::ContainerError;
use crate::service::key::{Service, ServiceKey};
use crate::service::resolve::{Arguments, Injectable, Provided, Resolve};

type Constructor = fn(&Container, &ServiceKey) -> Result<Service, ContainerError>;

struct Factory {
    make: Box<dyn Fn() -> Service + Send + Sync>,
    produced: OnceLock<Service>,
}

impl Factory {
    fn get(&self) -> Service {
        Arc::clone(self.produced.get_or_init(|| (self.make)()))
    }
}

/// Registry resolving service keys to shared instances.
#[derive(Default)]
pub struct Container {
    literals: DashMap<ServiceKey, Service>,
    factories: DashMap<ServiceKey, Arc<Factory>>,
    constructors: DashMap<ServiceKey, Constructor>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value to its type. Later resolutions return this value and
    /// never consult a factory.
    pub fn literal<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        self.literal_arc(Arc::new(value))
    }

    /// Binds an already shared value to its type.
    pub fn literal_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) -> &Self {
        let key = ServiceKey::of::<T>();
        tracing::trace!(service = %key, "Registered literal");
        self.literals.insert(key, value);
        self
    }

    /// Registers a producer for `T`. It is not invoked until the first
    /// resolution, and its result is cached for every later one. Replacing a
    /// factory only takes effect while `T` has not been resolved yet.
    pub fn factory<T, F>(&self, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        tracing::trace!(service = %key, "Registered factory");
        self.factories.insert(
            key,
            Arc::new(Factory {
                make: Box::new(move || Arc::new(factory()) as Service),
                produced: OnceLock::new(),
            }),
        );
        self
    }

    /// Lets the container build `T` from its declared dependencies when no
    /// literal or factory is bound.
    pub fn autowire<T: Injectable>(&self) -> &Self {
        self.constructors.insert(ServiceKey::of::<T>(), construct::<T>);
        self
    }

    /// Returns true if `key` can be resolved without failing lookup.
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.literals.contains_key(key)
            || self.factories.contains_key(key)
            || self.constructors.contains_key(key)
    }

    /// Resolves the service bound to `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let key = ServiceKey::of::<T>();
        self.resolve_key(&key, None)?
            .downcast::<T>()
            .map_err(|_| not_defined(&key, None))
    }

    /// Resolves `key`. `resolving` names the service whose construction
    /// requested it and only annotates errors.
    pub fn resolve_key(
        &self,
        key: &ServiceKey,
        resolving: Option<&ServiceKey>,
    ) -> Result<Service, ContainerError> {
        if let Some(value) = self.literals.get(key) {
            return Ok(Arc::clone(value.value()));
        }

        // Clone out of the map so no shard lock is held while user code runs.
        let factory = self.factories.get(key).map(|f| Arc::clone(f.value()));
        if let Some(factory) = factory {
            let produced = factory.get();
            let bound = self.literals.entry(*key).or_insert(produced);
            return Ok(Arc::clone(bound.value()));
        }

        let constructor = self.constructors.get(key).map(|c| *c.value());
        match constructor {
            Some(constructor) => {
                tracing::trace!(service = %key, "Autowiring service");
                constructor(self, key)
            }
            None => Err(not_defined(key, resolving)),
        }
    }

    /// Calls `callable` with its parameters resolved, preferring values in
    /// `provided` over the container.
    pub fn invoke_with_resolved_args<D, F, R>(
        &self,
        callable: F,
        provided: &Provided,
    ) -> Result<R, ContainerError>
    where
        D: Resolve,
        F: FnOnce(D) -> R,
    {
        let args = D::resolve(self, provided)?;
        Ok(callable(args))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("literals", &self.literals.len())
            .field("factories", &self.factories.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

fn not_defined(key: &ServiceKey, resolving: Option<&ServiceKey>) -> ContainerError {
    ContainerError::ServiceNotFound {
        service: key.name().to_string(),
        resolving: resolving.map(|k| k.name().to_string()),
    }
}

fn construct<T: Injectable>(
    container: &Container,
    key: &ServiceKey,
) -> Result<Service, ContainerError> {
    let mut args = Arguments::new(*key);
    for dependency in T::dependencies() {
        let value = container.resolve_key(&dependency.key, Some(key))?;
        args.push(dependency, value);
    }
    Ok(Arc::new(T::construct(&args)?))
}
