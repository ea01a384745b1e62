//! Gatekeeping state and application factory
//!
//! [`Gatekeeper`] is built once at startup from [`AppConfig`] and cloned
//! into every worker. The visitor registry and session codec inside it are
//! shared through `Arc`, so all workers see the same buckets.

use std::{sync::Arc, time::Duration};

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    web, App, Error,
};
use tracing_actix_web::TracingLogger;

use shelf_core::{
    errors::{DomainError, DomainResult},
    services::{LimiterConfig, SessionCodec, SessionCodecConfig, SweeperHandle, VisitorRegistry},
};
use shelf_shared::{error_codes, AppConfig};

use crate::dto::{ErrorResponse, ErrorResponseExt};
use crate::middleware::{ClientKeyResolver, RateLimiter, RejectionStyle, SessionAuth};
use crate::routes::{account, catalog, health};
use crate::session::SessionCookies;

#[derive(Clone)]
pub struct Gatekeeper {
    registry: Arc<VisitorRegistry>,
    codec: Arc<SessionCodec>,
    resolver: Arc<ClientKeyResolver>,
    cookies: SessionCookies,
    login_path: String,
    rate_limit_enabled: bool,
    sweep_interval: Duration,
}

impl Gatekeeper {
    /// Fails when the signing secret is empty or a trusted proxy entry does not parse
    pub fn from_config(config: &AppConfig) -> DomainResult<Self> {
        let codec = SessionCodec::new(SessionCodecConfig::from(&config.auth.session))?;
        let resolver = ClientKeyResolver::from_config(&config.rate_limit).map_err(|e| {
            DomainError::Configuration {
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            registry: Arc::new(VisitorRegistry::new(LimiterConfig::from(&config.rate_limit))),
            codec: Arc::new(codec),
            resolver: Arc::new(resolver),
            cookies: SessionCookies::from_config(&config.auth.session),
            login_path: config.auth.session.login_path.clone(),
            rate_limit_enabled: config.rate_limit.enabled,
            sweep_interval: Duration::from_secs(config.rate_limit.sweep_interval_seconds),
        })
    }

    pub fn registry(&self) -> &Arc<VisitorRegistry> {
        &self.registry
    }

    pub fn codec(&self) -> &Arc<SessionCodec> {
        &self.codec
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(Arc::clone(&self.registry), Arc::clone(&self.resolver))
            .enabled(self.rate_limit_enabled)
    }

    /// Required auth for JSON endpoints: `401` on failure
    pub fn require_api(&self) -> SessionAuth {
        SessionAuth::required(
            Arc::clone(&self.codec),
            self.cookies.clone(),
            RejectionStyle::Unauthorized,
        )
    }

    /// Required auth for pages: redirect to the login page on failure
    pub fn require_page(&self) -> SessionAuth {
        SessionAuth::required(
            Arc::clone(&self.codec),
            self.cookies.clone(),
            RejectionStyle::RedirectToLogin {
                location: self.login_path.clone(),
            },
        )
    }

    pub fn optional_auth(&self) -> SessionAuth {
        SessionAuth::optional(Arc::clone(&self.codec), self.cookies.clone())
    }

    /// Start the periodic idle-visitor sweep; stop it with [`SweeperHandle::shutdown`]
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        self.registry.spawn_sweeper(self.sweep_interval)
    }
}

/// Mount every route with its auth class
pub fn configure_routes(cfg: &mut web::ServiceConfig, gatekeeper: &Gatekeeper) {
    cfg.app_data(web::Data::new(gatekeeper.cookies().clone()))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1")
                .wrap(gatekeeper.require_api())
                .route("/me", web::get().to(account::me)),
        )
        .service(
            web::resource("/profile")
                .wrap(gatekeeper.require_page())
                .route(web::get().to(account::profile)),
        )
        .service(
            web::resource(gatekeeper.login_path.as_str())
                .wrap(gatekeeper.optional_auth())
                .route(web::get().to(account::login_page)),
        )
        .service(
            web::resource("/books")
                .wrap(gatekeeper.optional_auth())
                .route(web::get().to(catalog::books)),
        )
        .route("/logout", web::post().to(account::logout));
}

/// Create the application with tracing and rate limiting around every route
pub fn create_app(
    gatekeeper: Gatekeeper,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let rate_limiter = gatekeeper.rate_limiter();

    App::new()
        .configure(|cfg| configure_routes(cfg, &gatekeeper))
        .default_service(web::route().to(not_found))
        // Registration order is inside-out: the rate limiter runs before any route
        .wrap(rate_limiter)
        .wrap(TracingLogger::default())
}

async fn not_found() -> actix_web::HttpResponse {
    ErrorResponse::new(error_codes::NOT_FOUND, "The requested resource was not found")
        .to_response(StatusCode::NOT_FOUND)
}
