use chrono::Utc;
use mockall::mock;

use crate::{
    db_types::{NewOrder, NewProduct, Order, OrderStatusType, Price, Product, ProductItem, ProductUpdate, User},
    mkt_api::{
        order_objects::{OrderQueryFilter, ProcessedOrder},
        product_objects::ProductQueryFilter,
    },
    traits::{
        CatalogManagement,
        CategoryDirectory,
        MarketplaceError,
        OrderManagement,
        ProductItemManagement,
        UserDirectory,
    },
};

mock! {
    pub Backend {}
    impl CatalogManagement for Backend {
        async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, MarketplaceError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError>;
        async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Option<Product>, MarketplaceError>;
        async fn deactivate_product(&self, product_id: i64) -> Result<Product, MarketplaceError>;
        async fn check_and_reserve(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError>;
        async fn release_reservation(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError>;
        async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError>;
        async fn count_products(&self, query: ProductQueryFilter) -> Result<i64, MarketplaceError>;
    }
    impl OrderManagement for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, MarketplaceError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;
        async fn process_order(&self, order: &Order, notice: &str) -> Result<ProcessedOrder, MarketplaceError>;
        async fn confirm_order(&self, order: &Order) -> Result<Order, MarketplaceError>;
        async fn update_order_status(&self, order: &Order, new_status: OrderStatusType, release_reservation: bool) -> Result<Order, MarketplaceError>;
    }
    impl ProductItemManagement for Backend {
        async fn insert_product_items(&self, product_id: i64, data: Vec<String>) -> Result<Vec<ProductItem>, MarketplaceError>;
        async fn fetch_product_item(&self, item_id: i64) -> Result<Option<ProductItem>, MarketplaceError>;
        async fn fetch_product_items(&self, product_id: i64, available_only: bool) -> Result<Vec<ProductItem>, MarketplaceError>;
    }
    impl UserDirectory for Backend {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;
    }
    impl CategoryDirectory for Backend {
        async fn category_exists(&self, category_id: i64) -> Result<bool, MarketplaceError>;
    }
}

pub fn user(id: i64) -> User {
    User { id, username: format!("user{id}"), email: format!("user{id}@example.com"), created_at: Utc::now() }
}

pub fn product(id: i64, seller_id: i64, max_sales: i64, sold_count: i64) -> Product {
    let now = Utc::now();
    Product {
        id,
        seller_id,
        title: format!("Product {id}"),
        description: String::new(),
        price: Price::from(1500),
        category_id: 1,
        is_active: true,
        disposable: max_sales > 0,
        max_sales,
        sold_count,
        created_at: now,
        updated_at: now,
    }
}

pub fn order(id: i64, customer_id: i64, product_id: i64, status: OrderStatusType) -> Order {
    let now = Utc::now();
    Order {
        id,
        customer_id: Some(customer_id),
        product_id: Some(product_id),
        product_item_id: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

pub fn item(id: i64, product_id: i64, is_used: bool) -> ProductItem {
    let now = Utc::now();
    ProductItem { id, product_id, data: format!("KEY-{id}"), is_used, created_at: now, updated_at: now }
}

impl MockBackend {
    /// Every user id in `ids` exists; every other id does not.
    pub fn with_users(mut self, ids: &'static [i64]) -> Self {
        self.expect_fetch_user().returning(move |id| Ok(ids.contains(&id).then(|| user(id))));
        self
    }
}
