use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest};
use crate::db::store::UserStore;
use crate::types::{UserId, abbrev_uuid};

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, request), fields(role = ?request.role), err)]
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, name, email, phone_number, gender, date_of_birth, role, password_hash)
            VALUES ($1, $2, lower($3), $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone_number)
        .bind(&request.gender)
        .bind(request.date_of_birth)
        .bind(&request.role)
        .bind(&request.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                gender = COALESCE($4, gender),
                date_of_birth = COALESCE($5, date_of_birth),
                password_hash = COALESCE($6, password_hash),
                is_active = COALESCE($7, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.phone_number)
        .bind(&request.gender)
        .bind(request.date_of_birth)
        .bind(&request.password_hash)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, filter), err)]
    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<UserDBResponse>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(&filter.role)
            .bind(&filter.search)
            .fetch_one(&self.pool)
            .await?;
        let users = sqlx::query_as::<_, UserDBResponse>(&format!(
            "SELECT * FROM users {WHERE} ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
        ))
        .bind(&filter.role)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok((users, total))
    }
}
