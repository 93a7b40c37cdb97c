use std::fmt::Debug;

use async_trait::async_trait;

use abi::errors::Result;
use abi::types::User;

#[async_trait]
pub trait UserRepo: Sync + Send + Debug {
    /// create user; the email must not be registered yet
    async fn create_user(&self, user: User) -> Result<User>;

    /// get user by id
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// get user by institutional email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// get the users whose id is in `ids`; unknown ids are skipped
    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>>;
}
