//! Dependency resolution for constructors and callables.
//!
//! Types never inspect their callers at runtime. A constructible service
//! declares its dependencies through [`Injectable`]; a callable declares them
//! as a tuple of [`Resolve`] values.

use std::sync::Arc;

use crate::error::ContainerError;
use crate::service::container::Container;
use crate::service::key::{Service, ServiceKey};

/// One declared constructor parameter.
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub parameter: &'static str,
    pub key: ServiceKey,
}

impl Dependency {
    pub fn of<T: ?Sized + 'static>(parameter: &'static str) -> Self {
        Self {
            parameter,
            key: ServiceKey::of::<T>(),
        }
    }
}

/// A service the container can build on its own.
///
/// ```
/// use std::sync::Arc;
/// use kick::service::{Arguments, Container, ContainerError, Dependency, Injectable};
///
/// struct Config(String);
/// struct Greeter { config: Arc<Config> }
///
/// impl Injectable for Greeter {
///     fn dependencies() -> Vec<Dependency> {
///         vec![Dependency::of::<Config>("config")]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self, ContainerError> {
///         Ok(Self { config: args.get("config")? })
///     }
/// }
///
/// let container = Container::new();
/// container.literal(Config("hello".into())).autowire::<Greeter>();
/// assert_eq!(container.resolve::<Greeter>().unwrap().config.0, "hello");
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Constructor parameters in declaration order.
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn construct(args: &Arguments) -> Result<Self, ContainerError>;
}

/// Resolved constructor arguments, looked up by parameter name and type.
#[derive(Debug)]
pub struct Arguments {
    resolving: ServiceKey,
    values: Vec<(&'static str, ServiceKey, Service)>,
}

impl Arguments {
    pub(crate) fn new(resolving: ServiceKey) -> Self {
        Self {
            resolving,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, dependency: Dependency, value: Service) {
        self.values.push((dependency.parameter, dependency.key, value));
    }

    /// Returns the argument for `parameter`. Fails with `ParameterTypeUnknown`
    /// when the parameter was not declared as a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, parameter: &str) -> Result<Arc<T>, ContainerError> {
        let unknown = || ContainerError::ParameterTypeUnknown {
            parameter: parameter.to_string(),
            resolving: self.resolving.name().to_string(),
        };
        let key = ServiceKey::of::<T>();
        let (_, _, value) = self
            .values
            .iter()
            .find(|(name, k, _)| *name == parameter && *k == key)
            .ok_or_else(unknown)?;
        Arc::clone(value).downcast::<T>().map_err(|_| unknown())
    }
}

/// Values available to a callable before the container is consulted.
#[derive(Clone, Default)]
pub struct Provided {
    values: Vec<Service>,
}

impl Provided {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_arc(Arc::new(value))
    }

    pub fn with_arc<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values.push(value);
        self
    }

    /// First provided value whose type is exactly `T`.
    pub fn find<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.values
            .iter()
            .find(|v| v.is::<T>())
            .and_then(|v| Arc::clone(v).downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A callable parameter list that can be resolved.
///
/// `Arc<T>` resolves from the provided values by exact type, then from the
/// container. `Option<Arc<T>>` does the same but yields `None` when `T` is
/// neither provided nor registered; a registered `T` that fails to build
/// still fails. Tuples resolve element by element.
pub trait Resolve: Sized {
    fn resolve(container: &Container, provided: &Provided) -> Result<Self, ContainerError>;
}

impl Resolve for () {
    fn resolve(_: &Container, _: &Provided) -> Result<Self, ContainerError> {
        Ok(())
    }
}

impl<T: Send + Sync + 'static> Resolve for Arc<T> {
    fn resolve(container: &Container, provided: &Provided) -> Result<Self, ContainerError> {
        match provided.find::<T>() {
            Some(value) => Ok(value),
            None => container.resolve::<T>(),
        }
    }
}

impl<T: Send + Sync + 'static> Resolve for Option<Arc<T>> {
    fn resolve(container: &Container, provided: &Provided) -> Result<Self, ContainerError> {
        if let Some(value) = provided.find::<T>() {
            return Ok(Some(value));
        }
        if !container.contains(&ServiceKey::of::<T>()) {
            return Ok(None);
        }
        container.resolve::<T>().map(Some)
    }
}

macro_rules! resolve_tuple {
    ($($name:ident),+) => {
        impl<$($name: Resolve),+> Resolve for ($($name,)+) {
            fn resolve(container: &Container, provided: &Provided) -> Result<Self, ContainerError> {
                Ok(($($name::resolve(container, provided)?,)+))
            }
        }
    };
}

resolve_tuple!(A);
resolve_tuple!(A, B);
resolve_tuple!(A, B, C);
resolve_tuple!(A, B, C, D);
resolve_tuple!(A, B, C, D, E);
resolve_tuple!(A, B, C, D, E, F);
resolve_tuple!(A, B, C, D, E, F, G);
resolve_tuple!(A, B, C, D, E, F, G, H);
