//! Handlers for variant management endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::variant::{
    CreateVariantRequest, UpdateVariantRequest, VariantListResponse, VariantResponse,
};
use crate::domain::entities::VariantPatch;
use crate::error::AppError;
use crate::state::AppState;

/// Lists all variants of a short URL with its budget usage.
///
/// # Endpoint
///
/// `GET /admin/short-urls/{id}/variants`
///
/// Variants are listed in creation order, inactive ones included.
///
/// # Errors
///
/// Returns 404 if the short URL does not exist.
pub async fn list_variants_handler(
    State(state): State<AppState>,
    Path(short_url_id): Path<i64>,
) -> Result<Json<VariantListResponse>, AppError> {
    let variants = state.variant_service.list_all(short_url_id).await?;
    let allocation = state.variant_service.allocation(short_url_id).await?;

    Ok(Json(VariantListResponse {
        short_url_id,
        variants: variants.into_iter().map(VariantResponse::from).collect(),
        allocated: allocation.allocated,
        remaining: allocation.remaining,
    }))
}

/// Adds a variant to a short URL.
///
/// # Endpoint
///
/// `POST /admin/short-urls/{id}/variants`
///
/// # Request Body
///
/// ```json
/// { "target_url": "https://b.example.com/", "probability": 0.3, "is_active": true }
/// ```
///
/// # Errors
///
/// Returns 400 if the target is invalid or the active probabilities would sum
/// above 1.0.
/// Returns 404 if the short URL does not exist.
pub async fn create_variant_handler(
    State(state): State<AppState>,
    Path(short_url_id): Path<i64>,
    Json(payload): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<VariantResponse>), AppError> {
    payload.validate()?;

    let variant = state
        .variant_service
        .create(
            short_url_id,
            &payload.target_url,
            payload.probability()?,
            payload.is_active.unwrap_or(true),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(variant.into())))
}

/// Partially updates a variant.
///
/// # Endpoint
///
/// `PATCH /admin/variants/{id}`
///
/// All fields are optional but at least one must be present. Activating a
/// variant or raising its probability is checked against the budget.
///
/// # Errors
///
/// Returns 400 if the patch is empty, invalid or would exceed the budget.
/// Returns 404 if the variant does not exist.
pub async fn update_variant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateVariantRequest>,
) -> Result<Json<VariantResponse>, AppError> {
    payload.validate()?;

    let patch = VariantPatch::try_from(payload)?;
    let variant = state.variant_service.update(id, patch).await?;

    Ok(Json(variant.into()))
}

/// Deletes a variant.
///
/// # Endpoint
///
/// `DELETE /admin/variants/{id}`
///
/// # Errors
///
/// Returns 404 if the variant does not exist.
pub async fn delete_variant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.variant_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
