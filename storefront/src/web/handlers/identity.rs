// storefront/src/web/handlers/identity.rs

//! The caller's identity, as asserted by the authentication layer in front of this service.

use actix_web::{FromRequest, HttpRequest};
use tracing::warn;

use storefront_core::model::{Role, UserId, UserIdentity};

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";
pub const USER_NAME_HEADER: &str = "X-User-Name";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserIdentity);

impl AuthenticatedUser {
  pub fn id(&self) -> &UserId {
    &self.0.id
  }

  pub fn into_identity(self) -> UserIdentity {
    self.0
  }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req
    .headers()
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(user_id) = header(req, USER_ID_HEADER) else {
      warn!("AuthenticatedUser extractor: missing {} header.", USER_ID_HEADER);
      return futures_util::future::ready(Err(AppError::Unauthenticated { redirect_url: None }));
    };

    let role = match header(req, USER_ROLE_HEADER).map(str::parse::<Role>) {
      None => Role::User,
      Some(Ok(role)) => role,
      Some(Err(e)) => {
        warn!(error = %e, "AuthenticatedUser extractor: unknown role.");
        return futures_util::future::ready(Err(AppError::Unauthenticated { redirect_url: None }));
      }
    };

    futures_util::future::ready(Ok(AuthenticatedUser(UserIdentity {
      id: UserId::new(user_id),
      email: header(req, USER_EMAIL_HEADER).map(str::to_string),
      name: header(req, USER_NAME_HEADER).map(str::to_string),
      role,
    })))
  }
}
