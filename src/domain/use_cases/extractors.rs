use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{entities::user::Principal, errors::AuthError};

/// Extractor for the authenticated principal placed into request extensions
/// by the auth middleware. Returns 401 when the request was not
/// authenticated (i.e. reached a handler through an internal route).
/// Usage: add `principal: AuthPrincipal` as a handler parameter.
#[derive(Debug)]
pub struct AuthPrincipal(pub Principal);

impl FromRequest for AuthPrincipal {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Principal>() {
            Some(principal) => ready(Ok(AuthPrincipal(principal.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}
