use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogApi,
    ConversationApi,
    MarketplaceConfig,
    MarketplaceError,
    OrderFlowApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    /// Users, products, items, orders and conversations, by the names the scenarios give them. Items are named by
    /// their data.
    pub users: HashMap<String, i64>,
    pub products: HashMap<String, i64>,
    pub items: HashMap<String, i64>,
    pub orders: HashMap<String, i64>,
    pub conversations: HashMap<String, i64>,
    pub last_error: Option<MarketplaceError>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub conversations: ConversationApi<SqliteDatabase>,
}

impl MarketWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn user(&self, name: &str) -> i64 {
        *self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, title: &str) -> i64 {
        *self.products.get(title).unwrap_or_else(|| panic!("No product called {title}"))
    }

    pub fn item(&self, data: &str) -> i64 {
        *self.items.get(data).unwrap_or_else(|| panic!("No item with data {data}"))
    }

    pub fn order(&self, label: &str) -> i64 {
        *self.orders.get(label).unwrap_or_else(|| panic!("No order labelled {label}"))
    }

    pub fn conversation(&self, label: &str) -> i64 {
        *self.conversations.get(label).unwrap_or_else(|| panic!("No conversation labelled {label}"))
    }

    /// Keeps the error, if any, for a later `Then` step to inspect.
    pub fn record<T>(&mut self, result: Result<T, MarketplaceError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step returned an error: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl MarketSystem {
    pub async fn new(config: &MarketplaceConfig) -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let catalog = CatalogApi::new(db.clone());
        let orders = OrderFlowApi::from_config(db.clone(), config);
        let conversations = ConversationApi::from_config(db.clone(), config);
        Self { db_path, db, catalog, orders, conversations }
    }
}
