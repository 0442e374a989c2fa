use actix_web::{delete, get, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{errors::AppError, use_cases::extractors::AuthPrincipal, AppState};

#[get("/users/me")]
pub async fn me(state: web::Data<AppState>, principal: AuthPrincipal) -> Result<HttpResponse, AppError> {
    let profile = state.user_handler.get_user(&principal.0.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/users/{user_id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let profile = state.user_handler.get_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[delete("/users/{user_id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
    principal: AuthPrincipal,
) -> impl Responder {
    match state.user_handler.delete_user(user_id.into_inner(), &principal.0).await {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(AppError::Forbidden(msg)) => HttpResponse::Forbidden().json(serde_json::json!({
            "error": msg
        })),
        Err(AppError::NotFound(msg)) => HttpResponse::NotFound().json(serde_json::json!({
            "error": msg
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}
