use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
    entities::product::ProductRequest, errors::AppError, use_cases::extractors::AuthPrincipal,
    AppState,
};

#[post("/products")]
pub async fn create_product(
    state: web::Data<AppState>,
    request: web::Json<ProductRequest>,
    principal: AuthPrincipal,
) -> Result<HttpResponse, AppError> {
    let product = state
        .product_handler
        .create_product(&request, &principal.0)
        .await?;
    Ok(HttpResponse::Created().json(product))
}

#[get("/products/{product_id}")]
pub async fn get_product(
    state: web::Data<AppState>,
    product_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product = state.product_handler.get_product(&product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[delete("/products/{product_id}")]
pub async fn delete_product(
    state: web::Data<AppState>,
    product_id: web::Path<Uuid>,
    principal: AuthPrincipal,
) -> impl Responder {
    match state
        .product_handler
        .delete_product(product_id.into_inner(), &principal.0)
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

/// Association coordinator endpoint. Rejected only for local reasons
/// (missing product, ownership); a failed back-reference stamp still
/// returns the updated product.
#[put("/products/{product_id}/media/{media_id}")]
pub async fn associate_media(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    principal: AuthPrincipal,
) -> Result<HttpResponse, AppError> {
    let (product_id, media_id) = path.into_inner();
    let product = state
        .product_handler
        .associate_media(product_id, media_id, &principal.0)
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

/// Removal callback from the media service. Internal, unauthenticated, and
/// success-shaped in every case — the media service must never fail its own
/// deletion because this side call had nothing to do.
#[delete("/products/{product_id}/remove-media/{media_id}")]
pub async fn remove_media_callback(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> impl Responder {
    let (product_id, media_id) = path.into_inner();

    if let Err(e) = state
        .product_handler
        .remove_media_from_product(product_id, media_id)
        .await
    {
        tracing::error!(
            "Removal callback for product {} / media {} failed: {}",
            product_id, media_id, e
        );
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Media reference removed"
    }))
}

/// On-demand reconciler sweep. Internal surface.
#[post("/products/cleanup-orphaned-media")]
pub async fn cleanup_orphaned_media(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let summary = state.product_handler.cleanup_orphaned_media().await?;
    Ok(HttpResponse::Ok().body(summary.message()))
}
