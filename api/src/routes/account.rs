use actix_web::{http::header::LOCATION, web, HttpResponse};
use serde::Serialize;

use crate::middleware::{Identity, MaybeIdentity};
use crate::session::SessionCookies;

#[derive(Debug, Serialize)]
pub struct CurrentSubject {
    pub subject_id: i64,
    pub expires_at: String,
}

/// Handler for GET /api/v1/me
///
/// ## Errors
/// - 401 Unauthorized: missing, invalid or expired session cookie
pub async fn me(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(CurrentSubject {
        subject_id: identity.subject_id,
        expires_at: identity.expires_at.to_rfc3339(),
    })
}

/// Handler for GET /profile
///
/// Unauthenticated visitors are redirected to the login page before this runs.
pub async fn profile(identity: Identity) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Profile of subject {}", identity.subject_id))
}

/// Handler for GET on the configured login path
///
/// Entry point for the page-class redirect. Checking credentials and calling
/// `SessionCookies::issue` belongs to the account forms served elsewhere.
pub async fn login_page(identity: MaybeIdentity) -> HttpResponse {
    match identity.0 {
        Some(identity) => HttpResponse::SeeOther()
            .insert_header((LOCATION, "/profile"))
            .finish(),
        None => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("Sign in to continue"),
    }
}

/// Handler for POST /logout
///
/// Sessions are stateless, so logging out only drops the cookie.
pub async fn logout(cookies: web::Data<SessionCookies>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/books"))
        .cookie(cookies.clear())
        .finish()
}
