//! Handler and middleware shapes.
//!
//! Every handler is `(Request, deps) -> Result<impl Into<Reply>>` and every
//! middleware is `(Request, Next, deps) -> Result<impl Into<Reply>>`, where
//! `deps` is a [`Resolve`] tuple filled from the provided values and the
//! container.

use std::fmt;
use std::marker::PhantomData;

use crate::error::DispatchResult;
use crate::http::{Reply, Request, Response};
use crate::service::{Container, Provided, Resolve};

/// The remainder of the chain, ending in the route handler.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a (dyn Fn(Request) -> DispatchResult<Response> + Send + Sync + 'a),
}

impl<'a> Next<'a> {
    pub fn new(inner: &'a (dyn Fn(Request) -> DispatchResult<Response> + Send + Sync + 'a)) -> Self {
        Self { inner }
    }

    /// Runs the rest of the chain.
    pub fn run(self, request: Request) -> DispatchResult<Response> {
        (self.inner)(request)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// The terminal step of a route.
pub trait Handler: Send + Sync {
    fn call(
        &self,
        request: Request,
        container: &Container,
        provided: &Provided,
    ) -> DispatchResult<Reply>;
}

/// A link wrapping the rest of the chain. It may change the request, skip
/// `next` entirely, or rework the response it returns.
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        request: Request,
        next: Next<'_>,
        container: &Container,
        provided: &Provided,
    ) -> DispatchResult<Reply>;
}

/// A handler built from a closure; see [`handler_fn`].
pub struct HandlerFn<D, F> {
    f: F,
    _deps: PhantomData<fn() -> D>,
}

/// Wraps a closure taking the request and a dependency tuple.
///
/// ```
/// use std::sync::Arc;
/// use kick::pipeline::handler_fn;
/// use kick::{DispatchError, Request};
///
/// struct Greeting(String);
///
/// let handler = handler_fn(|_req: Request, (greeting,): (Arc<Greeting>,)| {
///     Ok::<_, DispatchError>(greeting.0.clone())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<D, F, R>(f: F) -> HandlerFn<D, F>
where
    D: Resolve,
    F: Fn(Request, D) -> DispatchResult<R> + Send + Sync,
    R: Into<Reply>,
{
    HandlerFn {
        f,
        _deps: PhantomData,
    }
}

impl<D, F, R> Handler for HandlerFn<D, F>
where
    D: Resolve,
    F: Fn(Request, D) -> DispatchResult<R> + Send + Sync,
    R: Into<Reply>,
{
    fn call(
        &self,
        request: Request,
        container: &Container,
        provided: &Provided,
    ) -> DispatchResult<Reply> {
        let reply = container.invoke_with_resolved_args(|deps| (self.f)(request, deps), provided)??;
        Ok(reply.into())
    }
}

/// A middleware built from a closure; see [`middleware_fn`].
pub struct MiddlewareFn<D, F> {
    f: F,
    _deps: PhantomData<fn() -> D>,
}

/// Wraps a closure taking the request, the rest of the chain and a
/// dependency tuple.
pub fn middleware_fn<D, F, R>(f: F) -> MiddlewareFn<D, F>
where
    D: Resolve,
    F: for<'a> Fn(Request, Next<'a>, D) -> DispatchResult<R> + Send + Sync,
    R: Into<Reply>,
{
    MiddlewareFn {
        f,
        _deps: PhantomData,
    }
}

impl<D, F, R> Middleware for MiddlewareFn<D, F>
where
    D: Resolve,
    F: for<'a> Fn(Request, Next<'a>, D) -> DispatchResult<R> + Send + Sync,
    R: Into<Reply>,
{
    fn handle(
        &self,
        request: Request,
        next: Next<'_>,
        container: &Container,
        provided: &Provided,
    ) -> DispatchResult<Reply> {
        let reply =
            container.invoke_with_resolved_args(|deps| (self.f)(request, next, deps), provided)??;
        Ok(reply.into())
    }
}
