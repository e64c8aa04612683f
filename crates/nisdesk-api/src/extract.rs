//! Acting-user extraction.
//!
//! Upstream authentication is out of scope for this service; the
//! deployment fronts it with a gateway that injects the authenticated
//! user's UUID as the `x-acting-user` header. The extractor rejects
//! requests where the header is missing or not a UUID.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use nisdesk_core::UserId;

use crate::error::AppError;

pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// The authenticated user on whose behalf the request acts.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub UserId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTING_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing {ACTING_USER_HEADER} header"))
            })?;

        let uuid = Uuid::parse_str(raw).map_err(|_| {
            AppError::Unauthorized(format!("{ACTING_USER_HEADER} is not a valid UUID"))
        })?;

        Ok(ActingUser(UserId::from_uuid(uuid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<ActingUser, AppError> {
        let (mut parts, _) = req.into_parts();
        ActingUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn valid_header_extracts() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header(ACTING_USER_HEADER, id.to_string())
            .body(())
            .unwrap();
        let acting = extract(req).await.unwrap();
        assert_eq!(*acting.0.as_uuid(), id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(req).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn malformed_header_is_unauthorized() {
        let req = Request::builder()
            .header(ACTING_USER_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(req).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
