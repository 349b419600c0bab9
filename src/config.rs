use anyhow::{anyhow, Context, Result};
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite:todos.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub auth: AuthConfig,
}

/// Settings shared by password hashing and token issuing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let database_max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        Ok(Self {
            database_url,
            bind_addr,
            database_max_connections,
            auth: AuthConfig::from_env()?,
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => "dev_secret_change_me".to_string(),
            _ => return Err(anyhow!("JWT_SECRET must be set")),
        };

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(anyhow!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost));
        }

        Ok(Self {
            jwt_secret,
            token_ttl_hours: check_token_ttl(parse_var("TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?)?,
            bcrypt_cost,
        })
    }
}

fn check_token_ttl(hours: i64) -> Result<i64> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(anyhow!(
            "TOKEN_TTL_HOURS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_HOURS,
            hours
        ));
    }
    Ok(hours)
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        let value: u32 = parse_var("TODO_API_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn token_ttl_must_be_positive_and_bounded() {
        assert_eq!(check_token_ttl(DEFAULT_TOKEN_TTL_HOURS).unwrap(), 168);
        assert!(check_token_ttl(0).is_err());
        assert!(check_token_ttl(-2).is_err());
        assert!(check_token_ttl(i64::MAX).is_err());
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("TODO_API_TEST_GARBAGE_VARIABLE", "not-a-number");
        let result: Result<u32> = parse_var("TODO_API_TEST_GARBAGE_VARIABLE", 7);
        assert!(result.is_err());
    }
}
