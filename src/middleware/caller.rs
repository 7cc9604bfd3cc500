//! Caller identity extraction
//!
//! Authentication happens upstream; the gateway forwards the verified caller
//! in `x-caller-*` headers. A request without a caller id is rejected before
//! any pipeline work starts.
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::CallerIdentity};

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_NAME_HEADER: &str = "x-caller-name";
pub const CALLER_AVATAR_HEADER: &str = "x-caller-avatar";

/// Trimmed header value; blank counts as absent
fn header(parts: &Parts, name: &str) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::InvalidArgument(format!("{} is not valid text", name)))?
        .trim();

    Ok((!value.is_empty()).then(|| value.to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, CALLER_ID_HEADER)?.ok_or_else(|| {
            AppError::Unauthenticated("caller identity is required".to_string())
        })?;

        let mut caller = CallerIdentity::new(id);
        caller.display_name = header(parts, CALLER_NAME_HEADER)?;
        caller.avatar_url = header(parts, CALLER_AVATAR_HEADER)?;
        Ok(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn extract(request: Request<()>) -> Result<CallerIdentity, AppError> {
        let (mut parts, _) = request.into_parts();
        tokio_test::block_on(CallerIdentity::from_request_parts(&mut parts, &()))
    }

    #[test]
    fn test_reads_all_caller_headers() {
        let request = Request::builder()
            .header(CALLER_ID_HEADER, "user-1")
            .header(CALLER_NAME_HEADER, "Ada")
            .header(CALLER_AVATAR_HEADER, "https://img.example/ada.png")
            .body(())
            .unwrap();

        let caller = extract(request).unwrap();
        assert_eq!(caller.id.as_str(), "user-1");
        assert_eq!(caller.display_name.as_deref(), Some("Ada"));
        assert_eq!(
            caller.avatar_url.as_deref(),
            Some("https://img.example/ada.png")
        );
    }

    #[test]
    fn test_missing_id_is_unauthenticated() {
        let request = Request::builder()
            .header(CALLER_NAME_HEADER, "Ada")
            .body(())
            .unwrap();

        let err = extract(request).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_blank_id_is_unauthenticated() {
        let request = Request::builder()
            .header(CALLER_ID_HEADER, "   ")
            .body(())
            .unwrap();

        assert!(extract(request).is_err());
    }

    #[test]
    fn test_opaque_header_is_invalid_argument() {
        let request = Request::builder()
            .header(CALLER_ID_HEADER, "user-1")
            .header(
                CALLER_NAME_HEADER,
                axum::http::HeaderValue::from_bytes(b"caf\xe9").unwrap(),
            )
            .body(())
            .unwrap();

        let err = extract(request).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
