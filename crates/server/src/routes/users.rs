use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use service::errors::ServiceError;
use service::file::user_directory::{User, UserInput, UserStore, UserTable};

use crate::errors::JsonApiError;

/// List all users keyed by identifier.
pub async fn list_users(
    State(store): State<Arc<UserStore>>,
) -> Result<Json<UserTable>, JsonApiError> {
    store.get_all().await.map(Json).map_err(storage_error)
}

/// Create a user. Both fields are required at this boundary; the storage
/// core itself does not validate them.
pub async fn create_user(
    State(store): State<Arc<UserStore>>,
    Json(input): Json<UserInput>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    if input.display_name.is_empty() || input.email.is_empty() {
        return Err(JsonApiError::new(
            StatusCode::BAD_REQUEST,
            "Validation Error",
            Some("display_name and email are required".into()),
        ));
    }
    let id = store.create(input).await.map_err(storage_error)?;
    Ok(Json(json!({ "id": id })))
}

/// Fetch one user by identifier.
pub async fn get_user(
    State(store): State<Arc<UserStore>>,
    Path(id): Path<String>,
) -> Result<Json<User>, JsonApiError> {
    store.get(&id).await.map(Json).map_err(storage_error)
}

/// Partial update; a request with both fields empty is rejected here since
/// it could not change anything.
pub async fn update_user(
    State(store): State<Arc<UserStore>>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    if input.display_name.is_empty() && input.email.is_empty() {
        return Err(JsonApiError::new(
            StatusCode::BAD_REQUEST,
            "Validation Error",
            Some("at least one of display_name or email must be set".into()),
        ));
    }
    store.update(&id, input).await.map_err(storage_error)?;
    Ok(Json(json!({ "message": "user updated" })))
}

/// Delete a user by identifier.
pub async fn delete_user(
    State(store): State<Arc<UserStore>>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    store.delete(&id).await.map_err(storage_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Map storage errors to transport responses without leaking more than the
/// error category.
fn storage_error(e: ServiceError) -> JsonApiError {
    match e {
        ServiceError::NotFound(_) => {
            JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(e.to_string()))
        }
        ServiceError::Decode(_) | ServiceError::Io(_) => JsonApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            Some(e.to_string()),
        ),
    }
}
