use crate::{db_types::User, traits::MarketplaceError};

/// User lookups. User management itself (registration, authentication, roles) lives outside the engine.
#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;

    async fn user_exists(&self, user_id: i64) -> Result<bool, MarketplaceError> {
        Ok(self.fetch_user(user_id).await?.is_some())
    }
}

#[allow(async_fn_in_trait)]
pub trait CategoryDirectory {
    async fn category_exists(&self, category_id: i64) -> Result<bool, MarketplaceError>;
}
