//! Session cookie issue and removal

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::ServiceRequest,
};

use shelf_core::{domain::SubjectId, errors::SessionError, services::SessionCodec};
use shelf_shared::SessionConfig;

/// Settings for the cookie that carries the session credential
#[derive(Debug, Clone)]
pub struct SessionCookies {
    name: String,
    secure: bool,
}

impl SessionCookies {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.clone(), config.secure)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sign a credential for `subject_id` and wrap it in a cookie.
    ///
    /// The cookie lives as long as the credential: the default TTL, or the
    /// remembered TTL when `remember` is set.
    pub fn issue(
        &self,
        codec: &SessionCodec,
        subject_id: SubjectId,
        remember: bool,
    ) -> Result<Cookie<'static>, SessionError> {
        let ttl = codec.ttl_for(remember);
        let credential = codec.issue(subject_id, ttl)?;

        Ok(self
            .base(credential)
            .max_age(CookieDuration::seconds(ttl.num_seconds()))
            .finish())
    }

    /// An already-expired cookie that makes the browser drop the credential
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new()).finish();
        cookie.make_removal();
        cookie
    }

    /// Credential presented with the request; an empty value counts as absent
    pub fn credential(&self, req: &ServiceRequest) -> Option<String> {
        req.cookie(&self.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    fn base(&self, value: String) -> actix_web::cookie::CookieBuilder<'static> {
        Cookie::build(self.name.clone(), value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
    }
}
