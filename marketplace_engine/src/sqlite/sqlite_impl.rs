//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::Migrator, SqlitePool};

use super::db::{categories, conversations, messages, new_pool, orders, product_items, products, users};
use crate::{
    config::MarketplaceConfig,
    db_types::{
        Category,
        Conversation,
        Message,
        NewConversation,
        NewMessage,
        NewOrder,
        NewProduct,
        NewUser,
        Order,
        OrderStatusType,
        Participant,
        Product,
        ProductItem,
        ProductUpdate,
        User,
    },
    mkt_api::{
        order_objects::{OrderQueryFilter, ProcessedOrder},
        product_objects::{Pagination, ProductQueryFilter},
    },
    traits::{
        CatalogManagement,
        CategoryDirectory,
        ConversationManagement,
        MarketplaceError,
        OrderManagement,
        ProductItemManagement,
        UserDirectory,
    },
};

static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(seller_id, product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }

    async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let new_cap = update.max_sales;
        match products::update_product(product_id, update, &mut conn).await? {
            Some(product) => {
                debug!("🗃️ Product #{product_id} updated");
                Ok(Some(product))
            },
            None => match (new_cap, products::fetch_product(product_id, &mut conn).await?) {
                (Some(max_sales), Some(current)) => {
                    warn!(
                        "🗃️ Product #{product_id} sold {} units before its cap could be lowered to {max_sales}",
                        current.sold_count
                    );
                    Err(MarketplaceError::invalid(format!(
                        "max_sales must be 0 (unlimited) or at least the {} units already sold",
                        current.sold_count
                    )))
                },
                _ => Ok(None),
            },
        }
    }

    async fn deactivate_product(&self, product_id: i64) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        match products::deactivate_if_idle(product_id, &mut conn).await? {
            Some(product) => {
                debug!("🗃️ Product #{product_id} deactivated");
                Ok(product)
            },
            None => match products::fetch_product(product_id, &mut conn).await? {
                Some(_) => Err(MarketplaceError::ActiveOrdersExist(product_id)),
                None => Err(MarketplaceError::ProductNotFound(product_id)),
            },
        }
    }

    async fn check_and_reserve(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError> {
        if delta <= 0 {
            return Err(MarketplaceError::InvalidQuantity(delta));
        }
        let mut conn = self.pool.acquire().await?;
        products::check_and_reserve(product_id, delta, &mut conn).await
    }

    async fn release_reservation(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError> {
        if delta <= 0 {
            return Err(MarketplaceError::InvalidQuantity(delta));
        }
        let mut conn = self.pool.acquire().await?;
        products::release_reservation(product_id, delta, &mut conn).await
    }

    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::search_products(query, &mut conn).await
    }

    async fn count_products(&self, query: ProductQueryFilter) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::count_products(query, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn process_order(&self, order: &Order, notice: &str) -> Result<ProcessedOrder, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = order.id;
        if let Some(product_id) = order.product_id {
            if !products::check_and_reserve(product_id, 1, &mut tx).await? {
                debug!("🗃️ Product #{product_id} is unavailable. Order #{order_id} stays {}", order.status);
                return Err(MarketplaceError::ProductUnavailable(product_id));
            }
        }
        let item = match order.product_item_id {
            Some(item_id) => match product_items::mark_used(item_id, &mut tx).await? {
                Some(item) => Some(item),
                None => {
                    debug!("🗃️ Item #{item_id} was delivered elsewhere. Order #{order_id} stays {}", order.status);
                    return Err(MarketplaceError::ProductItemUnavailable(item_id));
                },
            },
            None => None,
        };
        let completed =
            match orders::transition_status(order_id, order.status, OrderStatusType::Completed, &mut tx).await? {
                Some(o) => o,
                None => return Err(orders::status_conflict(order_id, "processed", &mut tx).await),
            };
        let (conversation, notice) = match (order.customer_id, order.product_id) {
            (Some(customer_id), Some(product_id)) => {
                let product = products::fetch_product(product_id, &mut tx)
                    .await?
                    .ok_or(MarketplaceError::ProductNotFound(product_id))?;
                let members = NewConversation::new([customer_id, product.seller_id]).for_product(product_id);
                if members.participants.len() < 2 {
                    return Err(MarketplaceError::SelfPurchase(customer_id, product_id));
                }
                let conversation = conversations::insert_conversation(members.product_id, &mut tx).await?;
                for user_id in members.participants {
                    conversations::insert_participant(conversation.id, user_id, &mut tx).await?;
                }
                let message = NewMessage::system(conversation.id, notice).with_order_id(order_id);
                let message = messages::insert_message(message, &mut tx).await?;
                (Some(conversation), Some(message))
            },
            _ => (None, None),
        };
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} processed");
        Ok(ProcessedOrder { order: completed, item, conversation, notice })
    }

    async fn confirm_order(&self, order: &Order) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = order.id;
        let confirmed =
            match orders::transition_status(order_id, order.status, OrderStatusType::Confirmed, &mut tx).await? {
                Some(o) => o,
                None => return Err(orders::status_conflict(order_id, "confirmed", &mut tx).await),
            };
        let reserved = match order.product_id {
            Some(product_id) => products::check_and_reserve(product_id, 1, &mut tx).await?,
            None => false,
        };
        if reserved {
            tx.commit().await?;
            debug!("🗃️ Order #{order_id} confirmed");
            return Ok(confirmed);
        }
        orders::transition_status(order_id, OrderStatusType::Confirmed, OrderStatusType::Cancelled, &mut tx).await?;
        tx.commit().await?;
        let product_id = order.product_id.unwrap_or_default();
        warn!("🗃️ Product #{product_id} sold out while order #{order_id} was being confirmed. The order is cancelled.");
        Err(MarketplaceError::ProductNoLongerAvailable { order_id, product_id })
    }

    async fn update_order_status(
        &self,
        order: &Order,
        new_status: OrderStatusType,
        release_reservation: bool,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = order.id;
        let updated = match orders::transition_status(order_id, order.status, new_status, &mut tx).await? {
            Some(o) => o,
            None => return Err(orders::status_conflict(order_id, new_status.as_str(), &mut tx).await),
        };
        if release_reservation && order.status.releases_reservation(new_status) {
            if let Some(product_id) = order.product_id {
                if !products::release_reservation(product_id, 1, &mut tx).await? {
                    warn!("🗃️ Product #{product_id} had nothing to release for order #{order_id}");
                }
            }
        }
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} moved from {} to {new_status}", order.status);
        Ok(updated)
    }
}

impl ProductItemManagement for SqliteDatabase {
    async fn insert_product_items(
        &self,
        product_id: i64,
        data: Vec<String>,
    ) -> Result<Vec<ProductItem>, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(data.len());
        for entry in &data {
            items.push(product_items::insert_product_item(product_id, entry, &mut tx).await?);
        }
        tx.commit().await?;
        debug!("🗃️ {} items added to product #{product_id}", items.len());
        Ok(items)
    }

    async fn fetch_product_item(&self, item_id: i64) -> Result<Option<ProductItem>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        product_items::fetch_product_item(item_id, &mut conn).await
    }

    async fn fetch_product_items(
        &self,
        product_id: i64,
        available_only: bool,
    ) -> Result<Vec<ProductItem>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        product_items::fetch_product_items(product_id, available_only, &mut conn).await
    }
}

impl ConversationManagement for SqliteDatabase {
    async fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation, MarketplaceError> {
        if conversation.participants.len() < 2 {
            return Err(MarketplaceError::TooFewParticipants(conversation.participants.len()));
        }
        let mut tx = self.pool.begin().await?;
        let created = conversations::insert_conversation(conversation.product_id, &mut tx).await?;
        for user_id in conversation.participants {
            conversations::insert_participant(created.id, user_id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn fetch_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        conversations::fetch_conversation(conversation_id, &mut conn).await
    }

    async fn conversations_for_user(&self, user_id: i64) -> Result<Vec<Conversation>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        conversations::conversations_for_user(user_id, &mut conn).await
    }

    async fn conversations_for_product(&self, product_id: i64) -> Result<Vec<Conversation>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        conversations::conversations_for_product(product_id, &mut conn).await
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<bool, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = conversations::soft_delete_conversation(conversation_id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Conversation #{conversation_id} deleted");
        }
        Ok(deleted)
    }

    async fn fetch_participants(&self, conversation_id: i64) -> Result<Vec<Participant>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        conversations::fetch_participants(conversation_id, &mut conn).await
    }

    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> Result<bool, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        conversations::is_participant(conversation_id, user_id, &mut conn).await
    }

    async fn add_participant(
        &self,
        conversation_id: i64,
        user_id: i64,
        notice: Option<&str>,
    ) -> Result<Participant, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        if !conversations::touch_conversation(conversation_id, &mut tx).await? {
            return Err(MarketplaceError::ConversationNotFound(conversation_id));
        }
        let participant = conversations::insert_participant(conversation_id, user_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::AlreadyParticipant { conversation_id, user_id })?;
        if let Some(text) = notice {
            messages::insert_message(NewMessage::system(conversation_id, text), &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ User #{user_id} joined conversation #{conversation_id}");
        Ok(participant)
    }

    async fn remove_participant(
        &self,
        conversation_id: i64,
        user_id: i64,
        notice: Option<&str>,
    ) -> Result<(), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        if !conversations::touch_conversation(conversation_id, &mut tx).await? {
            return Err(MarketplaceError::ConversationNotFound(conversation_id));
        }
        if !conversations::remove_participant_above_floor(conversation_id, user_id, &mut tx).await? {
            let err = if conversations::is_participant(conversation_id, user_id, &mut tx).await? {
                MarketplaceError::ParticipantFloor(conversation_id)
            } else {
                MarketplaceError::ParticipantNotFound { conversation_id, user_id }
            };
            return Err(err);
        }
        if let Some(text) = notice {
            messages::insert_message(NewMessage::system(conversation_id, text), &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ User #{user_id} left conversation #{conversation_id}");
        Ok(())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, MarketplaceError> {
        let conversation_id = message.conversation_id;
        let mut tx = self.pool.begin().await?;
        if !conversations::touch_conversation(conversation_id, &mut tx).await? {
            return Err(MarketplaceError::ConversationNotFound(conversation_id));
        }
        if let Some(user_id) = message.sender_id {
            if !conversations::is_participant(conversation_id, user_id, &mut tx).await? {
                return Err(MarketplaceError::NotAParticipant { conversation_id, user_id });
            }
        }
        if let Some(order_id) = message.order_id {
            if orders::fetch_order(order_id, &mut tx).await?.is_none() {
                return Err(MarketplaceError::OrderNotFound(order_id));
            }
        }
        let message = messages::insert_message(message, &mut tx).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn fetch_messages(&self, conversation_id: i64, page: Pagination) -> Result<Vec<Message>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        messages::fetch_messages(conversation_id, page, &mut conn).await
    }

    async fn fetch_last_message(&self, conversation_id: i64) -> Result<Option<Message>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        messages::fetch_last_message(conversation_id, &mut conn).await
    }

    async fn messages_for_order(&self, order_id: i64) -> Result<Vec<Message>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        messages::messages_for_order(order_id, &mut conn).await
    }
}

impl UserDirectory for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }
}

impl CategoryDirectory for SqliteDatabase {
    async fn category_exists(&self, category_id: i64) -> Result<bool, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        categories::category_exists(category_id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Opens a connection pool using the database URL and pool size in `config`.
    pub async fn from_config(config: &MarketplaceConfig) -> Result<Self, sqlx::Error> {
        info!("🗃️ Using database URL: {}", config.database_url);
        SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Wraps a pool that the caller has already configured.
    pub fn with_pool(url: &str, pool: SqlitePool) -> Self {
        Self { url: url.to_string(), pool }
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MarketplaceError> {
        MIGRATOR.run(&self.pool).await.map_err(|e| MarketplaceError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Stores a new user. User management proper lives outside the engine; this is the plain persistence primitive used
    /// for seeding.
    pub async fn register_user(&self, user: NewUser) -> Result<User, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        categories::insert_category(name, &mut conn).await
    }
}
