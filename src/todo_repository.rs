use crate::error::RepositoryError;
use crate::models::{Completion, DocumentId, Todo};
use log::info;
use sqlx::SqlitePool;

type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Clone)]
pub struct TodoRepository {
    pool: SqlitePool,
}

impl TodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, text: &str) -> Result<Todo> {
        let id = DocumentId::new();
        let pending = Completion::pending();

        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, text, completed, completed_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, text, completed, completed_at
            "#,
        )
        .bind(id.as_str())
        .bind(text)
        .bind(pending.completed)
        .bind(pending.completed_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Created todo {}", todo.id);
        Ok(todo)
    }

    /// Inserts a fully specified todo; used for fixtures and imports.
    pub async fn insert(&self, todo: &Todo) -> Result<()> {
        sqlx::query("INSERT INTO todos (id, text, completed, completed_at) VALUES (?, ?, ?, ?)")
            .bind(&todo.id)
            .bind(&todo.text)
            .bind(todo.completed)
            .bind(todo.completed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "id"))?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(
            "SELECT id, text, completed, completed_at FROM todos ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            "SELECT id, text, completed, completed_at FROM todos WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    pub async fn delete_by_id(&self, id: &DocumentId) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            "DELETE FROM todos WHERE id = ? RETURNING id, text, completed, completed_at",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if todo.is_some() {
            info!("Deleted todo {}", id);
        }
        Ok(todo)
    }

    /// Replaces `text` when given and always overwrites the completion
    /// state. Returns `None` when no todo has this id.
    pub async fn update_by_id(
        &self,
        id: &DocumentId,
        text: Option<&str>,
        completion: Completion,
    ) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET text = COALESCE(?, text), completed = ?, completed_at = ?
            WHERE id = ?
            RETURNING id, text, completed, completed_at
            "#,
        )
        .bind(text)
        .bind(completion.completed)
        .bind(completion.completed_at)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn repository() -> TodoRepository {
        TodoRepository::new(db::connect_in_memory().await.unwrap())
    }

    #[actix_web::test]
    async fn create_starts_pending() {
        let repo = repository().await;
        let todo = repo.create("buy milk").await.unwrap();

        assert_eq!(todo.text, "buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.completed_at, None);
        assert!(DocumentId::parse(&todo.id).is_some());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn update_keeps_text_when_absent() {
        let repo = repository().await;
        let todo = repo.create("buy milk").await.unwrap();
        let id = DocumentId::parse(&todo.id).unwrap();

        let done = repo
            .update_by_id(&id, None, Completion::from_request(Some(true), 1234))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.text, "buy milk");
        assert!(done.completed);
        assert_eq!(done.completed_at, Some(1234));

        let renamed = repo
            .update_by_id(&id, Some("buy oat milk"), Completion::pending())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.text, "buy oat milk");
        assert_eq!(renamed.completed_at, None);
    }

    #[actix_web::test]
    async fn missing_ids_yield_none() {
        let repo = repository().await;
        let id = DocumentId::new();

        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo.delete_by_id(&id).await.unwrap().is_none());
        assert!(repo
            .update_by_id(&id, Some("x"), Completion::pending())
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn delete_removes_document() {
        let repo = repository().await;
        let todo = repo.create("one").await.unwrap();
        let id = DocumentId::parse(&todo.id).unwrap();

        assert_eq!(repo.delete_by_id(&id).await.unwrap(), Some(todo));
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
