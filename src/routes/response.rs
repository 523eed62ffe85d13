use actix_web::http::StatusCode;
use serde::Serialize;

/// Success envelope shared by every JSON route.
/// Errors use `error::ErrorResponse` instead.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.is_success(),
        }
    }
}

/// `{}` for flows that have nothing to return
#[derive(Serialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_camel_case() {
        let body = serde_json::to_value(ApiResponse::new(StatusCode::CREATED, Empty {}, "done"))
            .unwrap();
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
        assert_eq!(body["data"], serde_json::json!({}));
    }
}
