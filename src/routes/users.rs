/// Account routes for the authenticated user: profile, account details,
/// avatar and cover image. All of them sit behind the auth gate.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthService;
use crate::configuration::MediaSettings;
use crate::error::{AppError, UploadError};
use crate::identity::{MediaSlot, PublicIdentity};
use crate::logger::request_id;
use crate::media::stage_upload;
use crate::routes::response::ApiResponse;

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
}

/// Query string of the media upload routes
#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

/// GET /api/v1/users/current-user
pub async fn current_user(user: web::ReqData<PublicIdentity>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        user.into_inner(),
        "User fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-account
///
/// # Errors
/// - 400: missing or malformed fullname or email
/// - 409: email already used by another account
pub async fn update_account(
    req: HttpRequest,
    form: web::Json<UpdateAccountRequest>,
    user: web::ReqData<PublicIdentity>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);

    let updated = auth
        .update_account(user.id, form.fullname.as_deref(), form.email.as_deref())
        .await?;

    tracing::info!(request_id = %request_id, user_id = %user.id, "Account updated");

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        updated,
        "Account details updated successfully",
    )))
}

/// PATCH /api/v1/users/avatar?filename=<name>
///
/// Raw request body is the image.
pub async fn update_avatar(
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    user: web::ReqData<PublicIdentity>,
    auth: web::Data<AuthService>,
    media: web::Data<MediaSettings>,
) -> Result<HttpResponse, AppError> {
    let updated = replace_media(&req, MediaSlot::Avatar, &query, &body, &user, &auth, &media).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        updated,
        "Avatar updated successfully",
    )))
}

/// PATCH /api/v1/users/cover-image?filename=<name>
///
/// Raw request body is the image.
pub async fn update_cover_image(
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    user: web::ReqData<PublicIdentity>,
    auth: web::Data<AuthService>,
    media: web::Data<MediaSettings>,
) -> Result<HttpResponse, AppError> {
    let updated =
        replace_media(&req, MediaSlot::CoverImage, &query, &body, &user, &auth, &media).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        updated,
        "Cover image updated successfully",
    )))
}

async fn replace_media(
    req: &HttpRequest,
    slot: MediaSlot,
    query: &UploadQuery,
    body: &[u8],
    user: &PublicIdentity,
    auth: &AuthService,
    media: &MediaSettings,
) -> Result<PublicIdentity, AppError> {
    if body.is_empty() {
        return Err(UploadError::MissingFile(slot.label().to_string()).into());
    }

    let staged = stage_upload(
        std::path::Path::new(&media.staging_dir),
        query.filename.as_deref(),
        body,
    )
    .await?;

    let result = auth.replace_media(user.id, slot, &staged).await;

    // staged copies never outlive the request
    if let Err(e) = tokio::fs::remove_file(&staged).await {
        tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged upload");
    }

    let updated = result?;
    tracing::info!(
        request_id = %request_id(req),
        user_id = %user.id,
        slot = slot.label(),
        "Media updated"
    );
    Ok(updated)
}
