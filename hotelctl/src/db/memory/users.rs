use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{InMemoryStore, contains_ci, paginate};
use crate::db::errors::{DbError, Result};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest};
use crate::db::store::UserStore;
use crate::types::UserId;

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let email = request.email.to_lowercase();
        if tables.users.values().any(|user| user.email == email) {
            return Err(DbError::unique("users", "users_email_key"));
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email,
            phone_number: request.phone_number.clone(),
            gender: request.gender.clone(),
            date_of_birth: request.date_of_birth,
            role: request.role.clone(),
            password_hash: request.password_hash.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let email = email.to_lowercase();
        Ok(self.tables.read().users.values().find(|user| user.email == email).cloned())
    }

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(phone_number) = &request.phone_number {
            user.phone_number = Some(phone_number.clone());
        }
        if let Some(gender) = &request.gender {
            user.gender = Some(gender.clone());
        }
        if let Some(date_of_birth) = request.date_of_birth {
            user.date_of_birth = Some(date_of_birth);
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(is_active) = request.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<UserDBResponse>, i64)> {
        let tables = self.tables.read();
        let mut users: Vec<_> = tables
            .users
            .values()
            .filter(|user| filter.role.as_ref().is_none_or(|role| &user.role == role))
            .filter(|user| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|search| contains_ci(&user.name, search) || contains_ci(&user.email, search))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(users, filter.skip, filter.limit))
    }
}
