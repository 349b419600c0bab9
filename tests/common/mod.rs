#![allow(dead_code, unused_macros)]

use actix_web::web;
use todo_api::auth::AuthService;
use todo_api::config::AuthConfig;
use todo_api::db;
use todo_api::models::{DocumentId, Todo, User};
use todo_api::todo_repository::TodoRepository;

pub const SEED_PASSWORD: &str = "userOnePass";

/// Builds the service under test from a `TestContext`.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.todos.clone())
                .app_data($ctx.auth.clone())
                .configure(todo_api::routes::config),
        )
        .await
    };
}

pub struct SeedUser {
    pub user: User,
    pub token: Option<String>,
}

pub struct TestContext {
    pub todos: web::Data<TodoRepository>,
    pub auth: web::Data<AuthService>,
    pub seeded_todos: Vec<Todo>,
    pub seeded_users: Vec<SeedUser>,
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
    }
}

/// Fresh database holding two todos (the second completed) and two users,
/// the first of which is signed in.
pub async fn setup() -> TestContext {
    let pool = db::connect_in_memory()
        .await
        .expect("in-memory database should open");
    let todos = web::Data::new(TodoRepository::new(pool.clone()));
    let auth = web::Data::new(AuthService::new(pool, auth_config()));

    let seeded_todos = vec![
        Todo {
            id: DocumentId::new().to_string(),
            text: "First test todo".to_string(),
            completed: false,
            completed_at: None,
        },
        Todo {
            id: DocumentId::new().to_string(),
            text: "Second test todo".to_string(),
            completed: true,
            completed_at: Some(333),
        },
    ];
    for todo in &seeded_todos {
        todos.insert(todo).await.expect("seed todo");
    }

    let hashed = bcrypt::hash(SEED_PASSWORD, 4).expect("hash seed password");
    let mut user_one = auth
        .users()
        .create("andrew@example.com", &hashed)
        .await
        .expect("seed user one");
    let token = auth.issue_token(&mut user_one).await.expect("seed token");
    let user_two = auth
        .users()
        .create("jen@example.com", &hashed)
        .await
        .expect("seed user two");

    TestContext {
        todos,
        auth,
        seeded_todos,
        seeded_users: vec![
            SeedUser {
                user: user_one,
                token: Some(token),
            },
            SeedUser {
                user: user_two,
                token: None,
            },
        ],
    }
}
