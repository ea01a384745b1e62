use actix_web::HttpResponse;
use serde::Serialize;

use crate::middleware::MaybeIdentity;

#[derive(Debug, Serialize)]
pub struct Viewer {
    pub authenticated: bool,
    pub subject_id: Option<i64>,
    pub display: String,
}

/// Handler for GET /books
pub async fn books(MaybeIdentity(identity): MaybeIdentity) -> HttpResponse {
    let viewer = match identity {
        Some(identity) => Viewer {
            authenticated: true,
            subject_id: Some(identity.subject_id),
            display: format!("subject {}", identity.subject_id),
        },
        None => Viewer {
            authenticated: false,
            subject_id: None,
            display: "anonymous".to_string(),
        },
    };

    HttpResponse::Ok().json(serde_json::json!({
        "viewer": viewer,
        "books": [],
    }))
}
