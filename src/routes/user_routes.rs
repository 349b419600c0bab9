use crate::auth::{AuthService, Authenticated, AUTH_HEADER};
use crate::error::ApiError;
use crate::models::{CreateUserRequest, LoginRequest, User};
use actix_web::{web, HttpResponse};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::post().to(create_user))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(get_current_user))
            .route("/me/token", web::delete().to(logout)),
    );
}

fn signed_in(user: &User, token: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((AUTH_HEADER, token))
        .json(user)
}

async fn create_user(
    auth_service: web::Data<AuthService>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let (user, token) = auth_service.register(body.into_inner()).await?;
    Ok(signed_in(&user, token))
}

async fn login(
    auth_service: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let (user, token) = auth_service.login(body.into_inner()).await?;
    Ok(signed_in(&user, token))
}

async fn get_current_user(auth: Authenticated) -> HttpResponse {
    HttpResponse::Ok().json(auth.user)
}

async fn logout(
    auth_service: web::Data<AuthService>,
    auth: Authenticated,
) -> Result<HttpResponse, ApiError> {
    let Authenticated { mut user, token } = auth;
    auth_service.logout(&mut user, &token).await?;
    Ok(HttpResponse::Ok().finish())
}
