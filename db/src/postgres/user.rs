use async_trait::async_trait;
use nanoid::nanoid;
use sqlx::{PgPool, Postgres, QueryBuilder};

use abi::errors::{Error, Result};
use abi::types::User;

use crate::search::{UserFilter, UserQuery, UserSearchRepo};
use crate::user::UserRepo;

use super::is_unique_violation;

#[derive(Debug)]
pub struct PostgresUser {
    pool: PgPool,
}

impl PostgresUser {
    pub fn new(pool: PgPool) -> Self {
        PostgresUser { pool }
    }
}

/// escape LIKE wildcards so user input only ever matches literally
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl UserRepo for PostgresUser {
    async fn create_user(&self, user: User) -> Result<User> {
        let id = if user.id.is_empty() { nanoid!() } else { user.id };
        let now = chrono::Utc::now().timestamp_millis();
        let result = sqlx::query_as(
            "INSERT INTO users (id, first_name, last_name, email, program, term, create_time)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.program)
        .bind(user.term)
        .bind(if user.create_time == 0 { now } else { user.create_time })
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::bad_request(format!("user {} or email {} already exists", id, user.email))
            } else {
                e.into()
            }
        })?;
        Ok(result)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let users = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1) ORDER BY create_time, id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

#[async_trait]
impl UserSearchRepo for PostgresUser {
    async fn fetch(&self, query: &UserQuery) -> Result<Vec<User>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        for filter in query.filters() {
            match filter {
                UserFilter::Text(text) => {
                    let pattern = format!("%{}%", escape_like(text));
                    builder
                        .push(" AND (first_name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR last_name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR email ILIKE ")
                        .push_bind(pattern)
                        .push(")");
                }
                UserFilter::Program(program) => {
                    builder.push(" AND program = ").push_bind(program.clone());
                }
                UserFilter::Term(term) => {
                    builder.push(" AND term = ").push_bind(*term);
                }
            }
        }
        builder.push(" ORDER BY create_time, id");
        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
