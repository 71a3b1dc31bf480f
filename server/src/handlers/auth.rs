use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use system::serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extractor::AuthenticatedUser;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

pub fn configure_auth_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/signup").route(web::post().to(signup)))
        .service(web::resource("/login").route(web::post().to(login)))
        .service(web::resource("/logout").route(web::post().to(logout)));
}

#[derive(Deserialize)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn into_parts(self) -> AppResult<(String, String)> {
        match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok((username, password))
            }
            _ => Err(AppError::BadRequest(
                "Username and password are required".into(),
            )),
        }
    }
}

async fn signup(
    app: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> AppResult<impl Responder> {
    let (username, password) = body.into_inner().into_parts()?;

    if app.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username is already taken".into()));
    }
    let password_hash = hash_password(&password).await?;
    let user = app
        .users
        .create(&username, &password_hash)
        .await?
        .ok_or_else(|| AppError::Conflict("Username is already taken".into()))?;
    let session_id = app.sessions.issue(user.id).await?;

    log::info!("User {} signed up", user.id);
    Ok(HttpResponse::Created().json(json!({ "sessionId": session_id })))
}

async fn login(
    app: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> AppResult<impl Responder> {
    let (username, password) = body.into_inner().into_parts()?;
    let invalid = || AppError::Unauthorized("Invalid username or password".into());

    let user = app
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&password, &user.password_hash).await? {
        return Err(invalid());
    }
    let session_id = app.sessions.issue(user.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "sessionId": session_id })))
}

async fn logout(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AppResult<impl Responder> {
    app.sessions.revoke(&user.token).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}
