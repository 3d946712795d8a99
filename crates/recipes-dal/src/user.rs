use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use futures::TryStreamExt as _;
use garde::Validate;
use recipes_types::{claim::Role, general::ValidEmail};
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

use crate::{Error, error::Result};

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

fn is_valid_role(role: &str, _ctx: &()) -> garde::Result {
    role.parse::<Role>().map_err(garde::Error::new).map(|_| ())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = 3, max = 255))]
    pub name: Option<String>,
    #[garde(length(min = 8, max = 255))]
    pub password: Option<String>,
    #[garde(inner(inner(custom(is_valid_role))))]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserInt {
    id: i64,
    name: String,
    email: String,
    roles: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Option<Vec<String>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles
            .as_ref()
            .map(|roles| roles.iter().any(|r| r == Role::ADMIN))
            .unwrap_or(false)
    }
}

impl From<UserInt> for User {
    fn from(value: UserInt) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            roles: value.roles.map(|s| {
                s.split(",")
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            }),
        }
    }
}

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let password = payload.password.map(|p| hash_password(&p)).transpose()?;
        let email = payload.email.as_ref();
        let name = payload.name.unwrap_or_else(|| email.to_string());
        let roles = payload.roles.map(|roles| roles.join(","));
        let result =
            sqlx::query("INSERT INTO users (name, email, password, roles) VALUES (?, ?, ?, ?)")
                .bind(&name)
                .bind(email)
                .bind(password)
                .bind(roles)
                .execute(&self.executor)
                .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, UserInt>("SELECT id, name, email, roles FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, UserInt>("SELECT id, name, email, roles FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.executor)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn list_admins(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, UserInt>(
            "SELECT id, name, email, roles FROM users WHERE roles IS NOT NULL",
        )
        .fetch(&self.executor)
        .map_ok(User::from)
        .try_filter(|u| futures::future::ready(u.is_admin()))
        .try_collect::<Vec<_>>()
        .await?;
        Ok(users)
    }

    pub async fn check_password(&self, email: &str, password: &str) -> Result<User> {
        let (id, hashed_password): (i64, Option<String>) =
            sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
                .bind(email)
                .fetch_one(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if let Some(hashed_password) = hashed_password {
            if verify_password(password, &hashed_password).unwrap_or(false) {
                return self.get(id).await;
            }
        }
        Err(Error::InvalidCredentials)
    }

    pub async fn change_password(&self, email: &str, password: &str) -> Result<()> {
        let password = hash_password(password)?;
        let result = sqlx::query("UPDATE users SET password = ? WHERE email = ?")
            .bind(password)
            .bind(email)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound("User".to_string()))
        } else {
            Ok(())
        }
    }
}
