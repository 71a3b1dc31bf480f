use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use system::uuid::Uuid;
use system::TimerId;

use crate::error::{AppError, AppResult};
use crate::extractor::AuthenticatedUser;
use crate::state::AppState;

pub fn configure_timer_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/timers")
            .service(
                web::resource("")
                    .route(web::get().to(list_active))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/completed").route(web::get().to(list_completed)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(show))
                    .route(web::patch().to(stop)),
            ),
    );
}

#[derive(Deserialize)]
pub struct CreateTimer {
    description: Option<String>,
}

fn parse_timer_id(raw: &str, not_found: &str) -> AppResult<TimerId> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::NotFound(not_found.to_string()))
}

async fn list_active(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AppResult<impl Responder> {
    let timers = app.timers.find_active(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(timers))
}

async fn list_completed(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AppResult<impl Responder> {
    let timers = app.timers.find_completed(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(timers))
}

async fn show(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let timer_id = parse_timer_id(&path, "Timer not found")?;
    let timer = app
        .timers
        .find_by_id(&timer_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Timer not found".into()))?;
    Ok(HttpResponse::Ok().json(timer))
}

async fn create(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateTimer>,
) -> AppResult<impl Responder> {
    let description = match body.into_inner().description {
        Some(d) if !d.trim().is_empty() => d,
        _ => return Err(AppError::BadRequest("Description is required".into())),
    };

    let timer = app.timers.create(&user.user_id, &description).await?;
    app.notifier.notify(user.user_id);

    Ok(HttpResponse::Created().json(timer))
}

async fn stop(
    app: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    const NOT_FOUND: &str = "Timer not found or already stopped";
    let timer_id = parse_timer_id(&path, NOT_FOUND)?;

    let timer = app
        .timers
        .stop(&timer_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    app.notifier.notify(user.user_id);

    Ok(HttpResponse::Ok().json(timer))
}
