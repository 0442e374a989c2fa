use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{entities::user::Principal, errors::AuthError, AppState};

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let path = req.path();
            let method = req.method().as_str();

            if is_public_route(path, method) {
                return service.call(req).await.map(ServiceResponse::map_into_boxed_body);
            }

            let state = req.app_data::<web::Data<AppState>>()
                .ok_or_else(|| {
                    tracing::error!("AppState missing in middleware");
                    AuthError::MissingJwtService
                })?;

            let token = match extract_token(&req) {
                Some(token) => token,
                None => {
                    tracing::warn!("Missing or malformed Authorization header");
                    return Ok(custom_error_response(req, HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "Missing or invalid credentials"
                    }))));
                }
            };

            let principal = match state.jwt_service.decode_jwt(&token).and_then(|d| d.claims.principal()) {
                Ok(principal) => principal,
                Err(AuthError::TokenExpired) => {
                    return Ok(custom_error_response(req, HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "Token has expired"
                    }))));
                }
                Err(_) => {
                    tracing::warn!("Failed to decode JWT");
                    return Ok(custom_error_response(req, HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "Missing or invalid credentials"
                    }))));
                }
            };

            req.extensions_mut().insert::<Principal>(principal);
            service.call(req).await.map(ServiceResponse::map_into_boxed_body)
        })
    }
}

/// The internal inter-service surface is unauthenticated on purpose: the
/// trust boundary is network topology (these paths are not exposed through
/// the public gateway), not caller identity.
fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }

    match (path, method) {
        ("/", "GET") | ("/health", "GET") => return true,
        ("/products/cleanup-orphaned-media", "POST") => return true,
        _ => {}
    }

    // HEAD /media/{id} — existence probe
    if method == "HEAD" && path.starts_with("/media/") {
        return true;
    }

    // PUT /media/{media_id}/product/{product_id} — back-reference stamp
    if method == "PUT" && path.starts_with("/media/") && path.contains("/product/") {
        return true;
    }

    // DELETE /products/{product_id}/remove-media/{media_id} — removal callback
    if method == "DELETE" && path.starts_with("/products/") && path.contains("/remove-media/") {
        return true;
    }

    false
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

fn custom_error_response(req: ServiceRequest, res: HttpResponse) -> ServiceResponse<BoxBody> {
    req.into_response(res)
}
