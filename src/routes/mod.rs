use crate::error::ApiError;
use actix_web::web;

pub mod todo_routes;
pub mod user_routes;

/// Registers every route plus the JSON extractor settings. Expects
/// `web::Data<TodoRepository>` and `web::Data<AuthService>` on the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .configure(todo_routes::config)
        .configure(user_routes::config);
}

// Malformed bodies and wrongly typed fields are validation failures with a
// JSON body, not actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}
