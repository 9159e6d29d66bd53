use crate::{db_types::ProductItem, traits::MarketplaceError};

/// Storage for the deliverable units (licence keys, download codes and the like) behind a product.
///
/// Items are only ever handed out by [`OrderManagement::process_order`], which flags them as used in the same
/// transaction that completes the order.
///
/// [`OrderManagement::process_order`]: crate::traits::OrderManagement::process_order
#[allow(async_fn_in_trait)]
pub trait ProductItemManagement {
    /// Stores every entry of `data` as a new, unused item of the product. Either all of them are stored or none are.
    async fn insert_product_items(
        &self,
        product_id: i64,
        data: Vec<String>,
    ) -> Result<Vec<ProductItem>, MarketplaceError>;

    async fn fetch_product_item(&self, item_id: i64) -> Result<Option<ProductItem>, MarketplaceError>;

    /// The product's items, oldest first. With `available_only`, used items are left out.
    async fn fetch_product_items(
        &self,
        product_id: i64,
        available_only: bool,
    ) -> Result<Vec<ProductItem>, MarketplaceError>;
}
