//! Tower middleware around [`EventInterceptor`].
//!
//! Wraps any `tower::Service` whose request type implements
//! [`ChangeMessage`], so the interceptor can sit in a tonic or axum stack
//! like any other layer.

use std::fmt;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::codec::{Codec, JsonCodec};
use crate::descriptor::ChangeMessage;
use crate::interceptor::EventInterceptor;

pub struct CrudEventsLayer<C = JsonCodec> {
    interceptor: EventInterceptor<C>,
}

impl<C> Clone for CrudEventsLayer<C> {
    fn clone(&self) -> Self {
        Self {
            interceptor: self.interceptor.clone(),
        }
    }
}

impl<C> CrudEventsLayer<C> {
    pub fn new(interceptor: EventInterceptor<C>) -> Self {
        Self { interceptor }
    }
}

impl<S, C> Layer<S> for CrudEventsLayer<C> {
    type Service = CrudEventsService<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        CrudEventsService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

pub struct CrudEventsService<S, C = JsonCodec> {
    inner: S,
    interceptor: EventInterceptor<C>,
}

impl<S: Clone, C> Clone for CrudEventsService<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            interceptor: self.interceptor.clone(),
        }
    }
}

impl<S, C, Req> Service<Req> for CrudEventsService<S, C>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    Req: ChangeMessage + Clone + Send + Sync + 'static,
    C: Codec,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Req) -> Self::Future {
        // Drive the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move {
            interceptor
                .intercept(request, move |request| inner.call(request))
                .await
        })
    }
}

impl<S, C> fmt::Debug for CrudEventsService<S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudEventsService")
            .field("inner", &self.inner)
            .field("interceptor", &self.interceptor)
            .finish()
    }
}
