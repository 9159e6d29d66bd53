use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product, ProductItem, ProductUpdate},
    mkt_api::product_objects::{ProductPage, ProductQueryFilter},
    traits::{CatalogManagement, CategoryDirectory, MarketplaceError, ProductItemManagement, UserDirectory},
};

/// `CatalogApi` lets sellers manage their listings, and guards product inventory.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement + UserDirectory + CategoryDirectory
{
    /// Lists a new product for `seller_id`. The seller and the category must exist, the title must not be blank and
    /// neither the price nor `max_sales` may be negative.
    pub async fn create_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, MarketplaceError> {
        validate_new_product(&product)?;
        if !self.db.user_exists(seller_id).await? {
            return Err(MarketplaceError::SellerNotFound(seller_id));
        }
        if !self.db.category_exists(product.category_id).await? {
            return Err(MarketplaceError::CategoryNotFound(product.category_id));
        }
        let product = self.db.insert_product(seller_id, product).await?;
        debug!("🛒️ Seller #{seller_id} listed product #{} '{}'", product.id, product.title);
        Ok(product)
    }

    /// Changes a product's details. Only the seller who listed the product may do this.
    pub async fn update_product(
        &self,
        product_id: i64,
        acting_seller_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, MarketplaceError> {
        let product = fetch_owned_product(&self.db, product_id, acting_seller_id).await?;
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(MarketplaceError::invalid("Product title cannot be empty"));
        }
        if update.price.is_some_and(|p| p.is_negative()) {
            return Err(MarketplaceError::invalid("Product price cannot be negative"));
        }
        if let Some(max_sales) = update.max_sales {
            if max_sales < 0 || (max_sales > 0 && max_sales < product.sold_count) {
                return Err(MarketplaceError::invalid(format!(
                    "max_sales must be 0 (unlimited) or at least the {} units already sold",
                    product.sold_count
                )));
            }
        }
        if let Some(category_id) = update.category_id {
            if !self.db.category_exists(category_id).await? {
                return Err(MarketplaceError::CategoryNotFound(category_id));
            }
        }
        let updated =
            self.db.update_product(product_id, update).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
        debug!("🛒️ Product #{product_id} updated by its seller");
        Ok(updated)
    }

    /// Takes a product off the market. Only its seller may do this, and only once it has no pending or confirmed
    /// orders.
    pub async fn deactivate_product(
        &self,
        product_id: i64,
        acting_seller_id: i64,
    ) -> Result<Product, MarketplaceError> {
        fetch_owned_product(&self.db, product_id, acting_seller_id).await?;
        let product = self.db.deactivate_product(product_id).await?;
        info!("🛒️ Product #{product_id} has been deactivated");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Product, MarketplaceError> {
        self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))
    }

    pub async fn is_available(&self, product_id: i64) -> Result<bool, MarketplaceError> {
        self.db.is_available(product_id).await
    }

    /// Reserves `delta` units of the product. Returns `false` if the product is inactive or the reservation would
    /// exceed its sales cap.
    pub async fn check_and_reserve(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError> {
        if delta <= 0 {
            return Err(MarketplaceError::InvalidQuantity(delta));
        }
        let reserved = self.db.check_and_reserve(product_id, delta).await?;
        if !reserved {
            debug!("🛒️ Could not reserve {delta} unit(s) of product #{product_id}");
        }
        Ok(reserved)
    }

    pub async fn release_reservation(&self, product_id: i64, delta: i64) -> Result<bool, MarketplaceError> {
        if delta <= 0 {
            return Err(MarketplaceError::InvalidQuantity(delta));
        }
        self.db.release_reservation(product_id, delta).await
    }

    /// Checks that `customer_id` may buy the product, i.e. that the product exists and is not their own.
    pub async fn validate_product_for_order(
        &self,
        product_id: i64,
        customer_id: i64,
    ) -> Result<Product, MarketplaceError> {
        validate_product_for_order(&self.db, product_id, customer_id).await
    }

    pub async fn search_products(&self, query: ProductQueryFilter) -> Result<ProductPage, MarketplaceError> {
        let page = query.page();
        let total = self.db.count_products(query.clone()).await?;
        let products = self.db.search_products(query).await?;
        trace!("🛒️ Product search returned {} of {total} matches", products.len());
        Ok(ProductPage { products, total, limit: page.limit, offset: page.offset })
    }

    /// Every product the seller has listed, newest first.
    pub async fn products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, MarketplaceError> {
        if !self.db.user_exists(seller_id).await? {
            return Err(MarketplaceError::SellerNotFound(seller_id));
        }
        let query = ProductQueryFilter::default().with_seller_id(seller_id).with_page(i64::MAX, 0);
        self.db.search_products(query).await
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement + ProductItemManagement
{
    /// Stocks the product with deliverable items, one per entry of `data`. Only the product's seller may do this, and
    /// no entry may be blank.
    pub async fn add_product_items(
        &self,
        product_id: i64,
        acting_seller_id: i64,
        data: Vec<String>,
    ) -> Result<Vec<ProductItem>, MarketplaceError> {
        if data.is_empty() {
            return Err(MarketplaceError::invalid("At least one product item is required"));
        }
        if data.iter().any(|d| d.trim().is_empty()) {
            return Err(MarketplaceError::invalid("Product item data cannot be empty"));
        }
        fetch_owned_product(&self.db, product_id, acting_seller_id).await?;
        let items = self.db.insert_product_items(product_id, data).await?;
        info!("🛒️ {} items added to product #{product_id}", items.len());
        Ok(items)
    }

    /// The seller's view of the product's items, including their data. With `available_only`, delivered items are left
    /// out.
    pub async fn product_items(
        &self,
        product_id: i64,
        acting_seller_id: i64,
        available_only: bool,
    ) -> Result<Vec<ProductItem>, MarketplaceError> {
        fetch_owned_product(&self.db, product_id, acting_seller_id).await?;
        self.db.fetch_product_items(product_id, available_only).await
    }

    /// The number of the product's items that have not been delivered yet.
    pub async fn available_item_count(&self, product_id: i64) -> Result<usize, MarketplaceError> {
        if self.db.fetch_product(product_id).await?.is_none() {
            return Err(MarketplaceError::ProductNotFound(product_id));
        }
        Ok(self.db.fetch_product_items(product_id, true).await?.len())
    }
}

async fn fetch_owned_product<B: CatalogManagement>(
    db: &B,
    product_id: i64,
    seller_id: i64,
) -> Result<Product, MarketplaceError> {
    let product = db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
    if product.seller_id != seller_id {
        return Err(MarketplaceError::unauthorized(format!("User #{seller_id} does not own product #{product_id}")));
    }
    Ok(product)
}

fn validate_new_product(product: &NewProduct) -> Result<(), MarketplaceError> {
    if product.title.trim().is_empty() {
        return Err(MarketplaceError::invalid("Product title cannot be empty"));
    }
    if product.price.is_negative() {
        return Err(MarketplaceError::invalid("Product price cannot be negative"));
    }
    if product.max_sales < 0 {
        return Err(MarketplaceError::invalid("max_sales cannot be negative"));
    }
    Ok(())
}

/// Fetches the product and refuses the purchase if the customer is also the seller.
pub(crate) async fn validate_product_for_order<B: CatalogManagement>(
    db: &B,
    product_id: i64,
    customer_id: i64,
) -> Result<Product, MarketplaceError> {
    let product = db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
    if product.seller_id == customer_id {
        warn!("🛒️ Customer #{customer_id} tried to buy their own product #{product_id}");
        return Err(MarketplaceError::SelfPurchase(customer_id, product_id));
    }
    Ok(product)
}
