use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    mkt_api::product_objects::ProductQueryFilter,
    traits::MarketplaceError,
};

/// The `CatalogManagement` trait defines behaviour for storing products and guarding their inventory.
///
/// Implementations must guarantee that `sold_count` never exceeds `max_sales` (when `max_sales` is non-zero), no matter
/// how many callers reserve stock at the same time.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Stores a new, active product for the given seller. Callers are expected to have validated the seller and the
    /// category beforehand.
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, MarketplaceError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError>;

    /// Applies the non-empty fields of `update` to the product. Returns `None` if the product does not exist.
    ///
    /// A new, non-zero `max_sales` is checked against `sold_count` in the same statement that writes it, and fails with
    /// a validation error if it is lower.
    async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, MarketplaceError>;

    /// Marks the product as inactive, as long as no order for it is `pending` or `confirmed`.
    ///
    /// The check and the update are a single statement. Fails with [`MarketplaceError::ActiveOrdersExist`] if the
    /// product still has open orders, or [`MarketplaceError::ProductNotFound`] if it does not exist.
    async fn deactivate_product(&self, product_id: i64) -> Result<Product, MarketplaceError>;

    /// Atomically adds `delta` to the product's `sold_count`, provided the product is active and the increment does not
    /// take it past `max_sales`. Returns `false`, leaving the product untouched, if the predicate does not hold.
    async fn check_and_reserve(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError>;

    /// The inverse of [`check_and_reserve`](Self::check_and_reserve). Returns `false` if `sold_count` is smaller than
    /// `delta`.
    async fn release_reservation(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError>;

    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError>;

    /// The number of products matching `query`, ignoring its pagination.
    async fn count_products(&self, query: ProductQueryFilter) -> Result<i64, MarketplaceError>;

    /// A snapshot of [`Product::is_available`]. Unknown products give [`MarketplaceError::ProductNotFound`].
    async fn is_available(&self, product_id: i64) -> Result<bool, MarketplaceError> {
        self.fetch_product(product_id)
            .await?
            .map(|p| p.is_available())
            .ok_or(MarketplaceError::ProductNotFound(product_id))
    }
}
