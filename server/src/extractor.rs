use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use system::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// The HTTP auth gate: `Authorization: Bearer <sessionId>`, checked by the
/// same validator the push handshake uses.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub token: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let app = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let app = app.ok_or_else(|| AppError::Internal("Application state missing".into()))?;
            let token = token?;
            let user_id = app.sessions.validate(&token).await?;
            Ok(AuthenticatedUser { user_id, token })
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token.to_string()),
        ["Bearer", _] => Err(AppError::Unauthorized("Unauthorized".into())),
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn it_extracts_bearer_token() {
        let req = TestRequest::default()
            .header(AUTHORIZATION, "Bearer 0123abcd")
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "0123abcd");
    }

    #[test]
    fn it_rejects_missing_or_malformed_headers() {
        let missing = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&missing), Err(AppError::Unauthorized(_))));

        for value in &["Basic abc", "Bearer", "Bearer ", "Bearer a b"] {
            let req = TestRequest::default()
                .header(AUTHORIZATION, *value)
                .to_http_request();
            assert!(
                matches!(bearer_token(&req), Err(AppError::Unauthorized(_))),
                "{:?} must be rejected",
                value
            );
        }
    }
}
