use crate::error::ApiError;
use crate::models::{
    Completion, CreateTodoRequest, DocumentId, TodoListResponse, TodoResponse, UpdateTodoRequest,
};
use crate::todo_repository::TodoRepository;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use validator::Validate;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/todos")
            .route("", web::post().to(create_todo))
            .route("", web::get().to(list_todos))
            .route("/{id}", web::get().to(get_todo))
            .route("/{id}", web::delete().to(delete_todo))
            .route("/{id}", web::patch().to(update_todo)),
    );
}

fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).ok_or(ApiError::NotFound)
}

// Every field is optional, so an empty body is an empty update.
fn parse_update(body: &[u8]) -> Result<UpdateTodoRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateTodoRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))
}

async fn create_todo(
    todos: web::Data<TodoRepository>,
    body: web::Json<CreateTodoRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    request.validate()?;

    let todo = todos.create(&request.text).await?;
    Ok(HttpResponse::Ok().json(todo))
}

async fn list_todos(todos: web::Data<TodoRepository>) -> Result<HttpResponse, ApiError> {
    let todos = todos.list().await?;
    Ok(HttpResponse::Ok().json(TodoListResponse { todos }))
}

async fn get_todo(
    todos: web::Data<TodoRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let todo = todos.find_by_id(&id).await?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(TodoResponse { todo }))
}

async fn delete_todo(
    todos: web::Data<TodoRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let todo = todos.delete_by_id(&id).await?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(TodoResponse { todo }))
}

async fn update_todo(
    todos: web::Data<TodoRepository>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let request = parse_update(&body)?;
    request.validate()?;

    let completion = Completion::from_request(request.completed, Utc::now().timestamp_millis());
    let todo = todos
        .update_by_id(&id, request.text.as_deref(), completion)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Updated todo {} (completed: {})", todo.id, todo.completed);
    Ok(HttpResponse::Ok().json(TodoResponse { todo }))
}
