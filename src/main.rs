use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;

use todo_api::auth::{AuthService, AUTH_HEADER};
use todo_api::config::Config;
use todo_api::todo_repository::TodoRepository;
use todo_api::{db, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let pool = db::connect(&config.database_url, config.database_max_connections).await?;

    let todos = web::Data::new(TodoRepository::new(pool.clone()));
    let auth_service = web::Data::new(AuthService::new(pool, config.auth.clone()));

    info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_headers([AUTH_HEADER])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(todos.clone())
            .app_data(auth_service.clone())
            .configure(routes::config)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("failed to bind {}", config.bind_addr))?
    .run()
    .await?;

    Ok(())
}
