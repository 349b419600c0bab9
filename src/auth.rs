use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::models::{
    AuthToken, CreateUserRequest, DocumentId, LoginRequest, User, AUTH_ACCESS,
};
use crate::user_repository::UserRepository;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use anyhow::anyhow;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

pub const AUTH_HEADER: &str = "x-auth";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,    // user id
    access: String, // token purpose, always "auth" for session tokens
    jti: String,    // keeps tokens issued in the same second distinct
    iat: i64,
    exp: i64,
}

pub struct AuthService {
    users: UserRepository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            config,
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Creates the user and signs it in. Returns the stored user and its
    /// first token.
    pub async fn register(&self, request: CreateUserRequest) -> Result<(User, String), ApiError> {
        let request = request.normalized();
        request.validate()?;

        let hashed_password = self.hash_password(request.password).await?;

        info!("Creating new user with email: {}", request.email);
        let id = DocumentId::new();
        let token = self.create_token(id.as_str())?;
        let user = self
            .users
            .create_with_token(
                &id,
                &request.email,
                &hashed_password,
                AuthToken::auth(token.clone()),
            )
            .await?;

        info!("User registered successfully: {}", user.email);
        Ok((user, token))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(User, String), ApiError> {
        info!("Attempting login for user: {}", request.email);
        let invalid = || ApiError::BadRequest("Invalid email or password".to_string());

        let mut user = match self.users.find_by_email(request.email.trim()).await? {
            Some(user) => user,
            None => {
                warn!("Login for unknown email: {}", request.email);
                return Err(invalid());
            }
        };

        if !self.verify_password(request.password, user.password.clone()).await? {
            warn!("Invalid password for user: {}", user.email);
            return Err(invalid());
        }

        let token = self.issue_token(&mut user).await?;
        info!("User logged in successfully: {}", user.email);
        Ok((user, token))
    }

    pub async fn logout(&self, user: &mut User, token: &str) -> Result<(), ApiError> {
        if !self.users.delete_token(user, token).await? {
            warn!("Token of user {} was already revoked", user.id);
        }
        info!("User logged out: {}", user.email);
        Ok(())
    }

    /// Resolves a presented token to the user that owns it. Every failure
    /// is reported as `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        let claims = match self.decode_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Rejected token: {}", e);
                return Err(ApiError::Unauthorized);
            }
        };

        if claims.access != AUTH_ACCESS {
            debug!("Rejected token with access {}", claims.access);
            return Err(ApiError::Unauthorized);
        }

        let user_id = DocumentId::parse(&claims.sub).ok_or(ApiError::Unauthorized)?;
        match self.users.find_by_token(&user_id, token, AUTH_ACCESS).await? {
            Some(user) => Ok(user),
            None => {
                debug!("Token for user {} is not on record", user_id);
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Signs a fresh token for `user` and appends it to the user's tokens.
    pub async fn issue_token(&self, user: &mut User) -> Result<String, ApiError> {
        let token = self.create_token(&user.id)?;
        self.users
            .add_token(user, AuthToken::auth(token.clone()))
            .await?;
        Ok(token)
    }

    fn create_token(&self, user_id: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let expiration = Duration::try_hours(self.config.token_ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| anyhow!("token lifetime of {} hours is out of range", self.config.token_ttl_hours))?;

        let claims = Claims {
            sub: user_id.to_string(),
            access: AUTH_ACCESS.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn decode_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let cost = self.config.bcrypt_cost;
        let hashed = web::block(move || hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(hashed)
    }

    async fn verify_password(&self, password: String, hashed: String) -> Result<bool, ApiError> {
        web::block(move || verify(password, &hashed))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

/// A request whose `x-auth` header resolved to a user.
///
/// Taking this as a handler argument puts the route behind authentication:
/// when resolution fails the request is answered with 401 and `{}` before
/// the handler runs.
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

impl FromRequest for Authenticated {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_service = req.app_data::<web::Data<AuthService>>().cloned();
        let token = req
            .headers()
            .get(AUTH_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let auth_service = auth_service
                .ok_or_else(|| ApiError::Internal("AuthService is not registered".to_string()))?;
            let token = token.ok_or(ApiError::Unauthorized)?;
            let user = auth_service.authenticate(&token).await?;
            Ok(Authenticated { user, token })
        })
    }
}
