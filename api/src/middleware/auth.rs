//! Session authentication middleware for pages and API endpoints.
//!
//! Reads the session cookie, verifies it with the [`SessionCodec`] and puts
//! an [`Identity`] into the request extensions on success.
//!
//! The middleware works in two modes:
//! 1. Required: missing or invalid credentials are rejected, either with a
//!    `401` JSON body (API routes) or a `303` redirect to the login page
//! 2. Optional: failures are ignored and the request continues anonymously

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::LOCATION,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;

use shelf_core::{
    domain::{SessionClaims, SubjectId},
    errors::DomainError,
    services::SessionCodec,
};

use crate::handlers::ApiError;
use crate::session::SessionCookies;

/// Authenticated caller attached to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: SubjectId,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject_id: claims.subject_id,
            expires_at: claims.expires_at,
        }
    }
}

/// How a required route answers an unauthenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionStyle {
    /// `401 Unauthorized` with a JSON error body
    Unauthorized,
    /// `303 See Other` to the login page
    RedirectToLogin { location: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthMode {
    Required(RejectionStyle),
    Optional,
}

/// Session authentication middleware factory
#[derive(Clone)]
pub struct SessionAuth {
    codec: Arc<SessionCodec>,
    cookies: SessionCookies,
    mode: AuthMode,
}

impl SessionAuth {
    pub fn required(codec: Arc<SessionCodec>, cookies: SessionCookies, style: RejectionStyle) -> Self {
        Self {
            codec,
            cookies,
            mode: AuthMode::Required(style),
        }
    }

    pub fn optional(codec: Arc<SessionCodec>, cookies: SessionCookies) -> Self {
        Self {
            codec,
            cookies,
            mode: AuthMode::Optional,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            codec: Arc::clone(&self.codec),
            cookies: self.cookies.clone(),
            mode: self.mode.clone(),
        }))
    }
}

/// Session authentication middleware service
pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    codec: Arc<SessionCodec>,
    cookies: SessionCookies,
    mode: AuthMode,
}

impl<S> SessionAuthMiddleware<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<Identity, DomainError> {
        let credential = self
            .cookies
            .credential(req)
            .ok_or(DomainError::Unauthenticated)?;

        self.codec
            .verify(&credential)
            .map(Identity::from)
            .map_err(|reason| {
                match self.mode {
                    AuthMode::Required(_) => tracing::warn!(
                        reason = reason.reason(),
                        path = req.path(),
                        "rejected session credential"
                    ),
                    AuthMode::Optional => tracing::debug!(
                        reason = reason.reason(),
                        path = req.path(),
                        "ignoring invalid session credential"
                    ),
                }
                DomainError::from(reason)
            })
    }

    fn rejection(&self, error: &ApiError, style: &RejectionStyle) -> HttpResponse {
        let mut response = match style {
            RejectionStyle::Unauthorized => error.error_response(),
            RejectionStyle::RedirectToLogin { location } => HttpResponse::SeeOther()
                .insert_header((LOCATION, location.as_str()))
                .finish(),
        };

        // A bad credential would be presented again on every request
        if matches!(error.domain(), DomainError::InvalidCredential(_)) {
            if let Err(e) = response.add_cookie(&self.cookies.clear()) {
                tracing::error!(error = %e, "failed to clear session cookie");
            }
        }
        response
    }
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
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
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        match (self.authenticate(&req), &self.mode) {
            (Ok(identity), _) => {
                req.extensions_mut().insert(identity);
            }
            (Err(_), AuthMode::Optional) => {}
            (Err(error), AuthMode::Required(style)) => {
                let response = self.rejection(&ApiError::from(error), style);
                return Box::pin(
                    async move { Ok(req.into_response(response).map_into_right_body()) },
                );
            }
        }

        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Extractor for required authentication
impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Identity>()
            .copied()
            .ok_or_else(|| ApiError::from(DomainError::Unauthenticated).into());

        ready(result)
    }
}

/// Extractor for optional authentication
#[derive(Debug, Clone, Copy)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequest for MaybeIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().copied();
        ready(Ok(MaybeIdentity(identity)))
    }
}
