//! Rate limiting middleware
//!
//! Every request is charged against the token bucket of its client key
//! before anything else runs. Rejected requests get `429 Too Many Requests`
//! and never reach the wrapped service.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures_util::future::LocalBoxFuture;

use shelf_core::{
    errors::DomainError,
    services::rate_limit::{Admission, VisitorRegistry},
};

use super::client_key::ClientKeyResolver;
use crate::handlers::ApiError;

/// Rate limiter middleware factory
#[derive(Clone)]
pub struct RateLimiter {
    registry: Arc<VisitorRegistry>,
    resolver: Arc<ClientKeyResolver>,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(registry: Arc<VisitorRegistry>, resolver: Arc<ClientKeyResolver>) -> Self {
        Self {
            registry,
            resolver,
            enabled: true,
        }
    }

    /// When disabled every request is forwarded untouched
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimiterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service: Rc::new(service),
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
            enabled: self.enabled,
        }))
    }
}

/// Rate limiter middleware service
pub struct RateLimiterMiddleware<S> {
    service: Rc<S>,
    registry: Arc<VisitorRegistry>,
    resolver: Arc<ClientKeyResolver>,
    enabled: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if !self.enabled {
            return Box::pin(async move {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }

        let client_key = self.resolver.resolve(&req);
        match self.registry.check(client_key.clone(), Instant::now()) {
            Admission::Admitted { remaining } => {
                tracing::trace!(client_key = %client_key, remaining, "request admitted");
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Admission::Rejected { retry_after } => {
                let retry_after_seconds = retry_after.map(retry_after_seconds);
                tracing::debug!(
                    client_key = %client_key,
                    retry_after_seconds,
                    "rate limit exceeded"
                );

                let response = ApiError::from(DomainError::RateLimited {
                    retry_after_seconds,
                })
                .error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

/// Whole seconds for the `Retry-After` header, rounded up and at least one
fn retry_after_seconds(wait: Duration) -> u64 {
    let seconds = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    seconds.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_seconds(Duration::ZERO), 1);
        assert_eq!(retry_after_seconds(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_seconds(Duration::from_secs(1)), 1);
        assert_eq!(retry_after_seconds(Duration::from_millis(1001)), 2);
        assert_eq!(retry_after_seconds(Duration::from_secs(60)), 60);
    }
}
