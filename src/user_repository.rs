use crate::error::RepositoryError;
use crate::models::{AuthToken, DocumentId, TokenList, User};
use log::info;
use sqlx::SqlitePool;

type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a new user with an empty token list. `password_hash` must
    /// already be hashed.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let id = DocumentId::new();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password)
            VALUES (?, ?, ?)
            RETURNING id, email, password
            "#,
        )
        .bind(id.as_str())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Stores a new user together with its first token. Either both rows
    /// are written or neither is.
    pub async fn create_with_token(
        &self,
        id: &DocumentId,
        email: &str,
        password_hash: &str,
        token: AuthToken,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let mut user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password)
            VALUES (?, ?, ?)
            RETURNING id, email, password
            "#,
        )
        .bind(id.as_str())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&token.access)
            .bind(&token.token)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "token"))?;

        tx.commit().await?;

        user.tokens.push(token);
        info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tokens(user).await
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, password FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        self.with_tokens(user).await
    }

    /// Finds the user `id` only if it holds `token` with the given access.
    pub async fn find_by_token(
        &self,
        id: &DocumentId,
        token: &str,
        access: &str,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password
            FROM users u
            JOIN user_tokens t ON t.user_id = u.id
            WHERE u.id = ? AND t.token = ? AND t.access = ?
            "#,
        )
        .bind(id.as_str())
        .bind(token)
        .bind(access)
        .fetch_optional(&self.pool)
        .await?;
        self.with_tokens(user).await
    }

    /// Appends `token` to the end of the user's token list.
    pub async fn add_token(&self, user: &mut User, token: AuthToken) -> Result<()> {
        sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&token.access)
            .bind(&token.token)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "token"))?;

        user.tokens.push(token);
        Ok(())
    }

    /// Removes `token` from the user's token list. Returns whether it was
    /// present.
    pub async fn delete_token(&self, user: &mut User, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = ? AND token = ?")
            .bind(&user.id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        user.tokens.remove(token);
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn load_tokens(&self, user_id: &str) -> Result<TokenList> {
        let tokens = sqlx::query_as::<_, AuthToken>(
            "SELECT access, token FROM user_tokens WHERE user_id = ? ORDER BY position",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(TokenList::from(tokens))
    }

    async fn with_tokens(&self, user: Option<User>) -> Result<Option<User>> {
        match user {
            Some(mut user) => {
                user.tokens = self.load_tokens(&user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
