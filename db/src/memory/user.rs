use async_trait::async_trait;
use tokio::sync::RwLock;

use abi::errors::{Error, Result};
use abi::types::User;

use crate::search::{UserQuery, UserSearchRepo};
use crate::user::UserRepo;

#[derive(Debug, Default)]
pub struct MemoryUser {
    users: RwLock<Vec<User>>,
}

impl MemoryUser {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUser {
    async fn create_user(&self, mut user: User) -> Result<User> {
        if user.id.is_empty() {
            user.id = nanoid::nanoid!();
        }
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(Error::bad_request(format!("user {} already exists", user.id)));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::bad_request(format!(
                "email {} is already registered",
                user.email
            )));
        }
        if user.create_time == 0 {
            user.create_time = chrono::Utc::now().timestamp_millis();
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }
}

#[async_trait]
impl UserSearchRepo for MemoryUser {
    async fn fetch(&self, query: &UserQuery) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| query.matches(u)).cloned().collect())
    }
}
