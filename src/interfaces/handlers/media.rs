use actix_web::{delete, get, put, route, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{errors::AppError, use_cases::extractors::AuthPrincipal, AppState};

#[get("/media/{media_id}")]
pub async fn get_media(
    state: web::Data<AppState>,
    media_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let media = state.media_handler.get_media(&media_id).await?;
    Ok(HttpResponse::Ok().json(media))
}

/// Existence probe for the reconciler: 200/404 only, no body either way.
/// Anything else a caller sees (timeout, 5xx) must be read as indeterminate.
#[route("/media/{media_id}", method = "HEAD")]
pub async fn probe_media(
    state: web::Data<AppState>,
    media_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if state.media_handler.exists(&media_id).await? {
        Ok(HttpResponse::Ok().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}

/// Back-reference stamp from the product service. Internal surface; the
/// caller treats any failure as best-effort.
#[put("/media/{media_id}/product/{product_id}")]
pub async fn stamp_product(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (media_id, product_id) = path.into_inner();
    state.media_handler.stamp_product(media_id, product_id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[delete("/media/{media_id}")]
pub async fn delete_media(
    state: web::Data<AppState>,
    media_id: web::Path<Uuid>,
    principal: AuthPrincipal,
) -> impl Responder {
    match state
        .media_handler
        .delete(media_id.into_inner(), &principal.0)
        .await
    {
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
