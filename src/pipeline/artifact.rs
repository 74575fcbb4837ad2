//! Artifacts referenced by routes and the loader that supplies them.
//!
//! A route names its handler and middleware by artifact reference, the
//! root-relative path of the file that declared them
//! (`/posts/_pid/index.GET.route`, `/__middleware.route`). The loader turns a
//! reference into something the pipeline can invoke.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};
use crate::pipeline::middleware::{Handler, Middleware};
use crate::service::{Container, Service, ServiceKey};

/// A middleware registered in the container, named by its type.
#[derive(Clone, Copy)]
pub struct MiddlewareService {
    key: ServiceKey,
    cast: fn(Service) -> Option<Arc<dyn Middleware>>,
}

impl MiddlewareService {
    pub fn of<T: Middleware + 'static>() -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            cast: cast_middleware::<T>,
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Resolves the service and views it as a middleware.
    pub fn resolve(&self, container: &Container) -> DispatchResult<Arc<dyn Middleware>> {
        let service = container.resolve_key(&self.key, None)?;
        (self.cast)(service)
            .ok_or_else(|| DispatchError::InvalidMiddlewareDefinition(self.key.name().to_string()))
    }
}

fn cast_middleware<T: Middleware + 'static>(service: Service) -> Option<Arc<dyn Middleware>> {
    service
        .downcast::<T>()
        .ok()
        .map(|m| m as Arc<dyn Middleware>)
}

impl fmt::Debug for MiddlewareService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MiddlewareService({})", self.key)
    }
}

/// What an artifact reference loads to.
#[derive(Clone)]
pub enum Artifact {
    Handler(Arc<dyn Handler>),
    Middleware(Arc<dyn Middleware>),
    /// Several container-registered middleware declared by one artifact,
    /// outermost first.
    Services(Vec<MiddlewareService>),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Handler(_) => "handler",
            Artifact::Middleware(_) => "middleware",
            Artifact::Services(_) => "services",
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Services(list) => f.debug_tuple("Services").field(list).finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Turns artifact references into artifacts.
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, reference: &str) -> DispatchResult<Artifact>;
}

/// An in-memory loader keyed by artifact reference.
#[derive(Clone, Default, Debug)]
pub struct ArtifactRegistry {
    artifacts: HashMap<String, Artifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, artifact: Artifact) {
        let reference = reference.into();
        tracing::trace!(reference = %reference, kind = artifact.kind(), "Registered artifact");
        self.artifacts.insert(reference, artifact);
    }

    pub fn handler(mut self, reference: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.insert(reference, Artifact::Handler(Arc::new(handler)));
        self
    }

    pub fn middleware(
        mut self,
        reference: impl Into<String>,
        middleware: impl Middleware + 'static,
    ) -> Self {
        self.insert(reference, Artifact::Middleware(Arc::new(middleware)));
        self
    }

    pub fn services(mut self, reference: impl Into<String>, services: Vec<MiddlewareService>) -> Self {
        self.insert(reference, Artifact::Services(services));
        self
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactLoader for ArtifactRegistry {
    fn load(&self, reference: &str) -> DispatchResult<Artifact> {
        self.artifacts
            .get(reference)
            .cloned()
            .ok_or_else(|| DispatchError::ArtifactNotFound(reference.to_string()))
    }
}
