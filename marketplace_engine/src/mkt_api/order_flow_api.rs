use std::fmt::Debug;

use log::*;

use crate::{
    config::{MarketplaceConfig, DEFAULT_ORDER_PROCESSED_NOTICE},
    db_types::{NewOrder, Order, OrderStatusType},
    mkt_api::{
        catalog_api::validate_product_for_order,
        order_objects::{OrderChanged, OrderQueryFilter, ProcessedOrder},
    },
    traits::{CatalogManagement, MarketplaceError, OrderManagement, ProductItemManagement, UserDirectory},
};

/// `OrderFlowApi` is the primary API for moving orders through their lifecycle.
///
/// ```text
/// pending   -> confirmed | completed | cancelled
/// confirmed -> completed | cancelled | refunded
/// completed -> refunded
/// ```
///
/// Buyers create, confirm and cancel their own orders. Processing completes an order and opens a conversation between
/// the buyer and the seller. Administrators may additionally move orders along the edges that do not reserve stock,
/// via [`Self::modify_status_for_order`].
pub struct OrderFlowApi<B> {
    db: B,
    release_on_cancel: bool,
    order_processed_notice: String,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (release_on_cancel: {})", self.release_on_cancel)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, release_on_cancel: true, order_processed_notice: DEFAULT_ORDER_PROCESSED_NOTICE.to_string() }
    }

    pub fn from_config(db: B, config: &MarketplaceConfig) -> Self {
        Self {
            db,
            release_on_cancel: config.release_on_cancel,
            order_processed_notice: config.order_processed_notice.clone(),
        }
    }

    /// When enabled (the default), buyers may cancel confirmed orders, and leaving `confirmed` for `cancelled` or
    /// `refunded` gives the reserved unit back to the product.
    pub fn with_release_on_cancel(mut self, release_on_cancel: bool) -> Self {
        self.release_on_cancel = release_on_cancel;
        self
    }

    pub fn with_order_processed_notice<S: Into<String>>(mut self, notice: S) -> Self {
        self.order_processed_notice = notice.into();
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + CatalogManagement + UserDirectory
{
    /// Places a new `pending` order for the product. The customer must exist and may not buy their own product.
    pub async fn create_order(&self, customer_id: i64, product_id: i64) -> Result<Order, MarketplaceError> {
        if !self.db.user_exists(customer_id).await? {
            return Err(MarketplaceError::CustomerNotFound(customer_id));
        }
        validate_product_for_order(&self.db, product_id, customer_id).await?;
        let order = self.db.insert_order(NewOrder::new(customer_id, product_id)).await?;
        debug!("📦️ Order #{} created for customer #{customer_id} and product #{product_id}", order.id);
        Ok(order)
    }

    /// Completes a pending order, reserving one unit of the product and opening a buyer/seller conversation with a
    /// system notice. An order for a specific product item also delivers that item.
    ///
    /// If the product is sold out or inactive, the call fails with [`MarketplaceError::ProductUnavailable`] and the
    /// order stays `pending`. The same goes for [`MarketplaceError::ProductItemUnavailable`] when the item was
    /// delivered with another order first.
    pub async fn process_order(&self, order_id: i64) -> Result<ProcessedOrder, MarketplaceError> {
        let order = self.fetch_order(order_id).await?;
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderStatusConflict { order_id, status: order.status, action: "processed" });
        }
        let processed = self.db.process_order(&order, &self.order_processed_notice).await?;
        info!(
            "📦️ Order #{order_id} processed. Conversation: {:?}",
            processed.conversation.as_ref().map(|c| c.id)
        );
        Ok(processed)
    }

    /// Cancels the customer's order. Pending orders can always be cancelled; confirmed orders only when
    /// release-on-cancel is enabled, in which case the reserved unit is released.
    pub async fn cancel_order(&self, order_id: i64, acting_customer_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.fetch_owned_order(order_id, acting_customer_id).await?;
        match order.status {
            OrderStatusType::Pending => {},
            OrderStatusType::Confirmed if self.release_on_cancel => {},
            status => return Err(MarketplaceError::OrderStatusConflict { order_id, status, action: "cancelled" }),
        }
        let cancelled = self.db.update_order_status(&order, OrderStatusType::Cancelled, self.release_on_cancel).await?;
        debug!("📦️ Order #{order_id} cancelled by customer #{acting_customer_id}");
        Ok(cancelled)
    }

    /// Confirms the customer's pending order and reserves one unit of the product.
    ///
    /// If the product has sold out in the meantime, the order is cancelled and the call fails with
    /// [`MarketplaceError::ProductNoLongerAvailable`].
    pub async fn confirm_order(&self, order_id: i64, acting_customer_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.fetch_owned_order(order_id, acting_customer_id).await?;
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderStatusConflict { order_id, status: order.status, action: "confirmed" });
        }
        let confirmed = self.db.confirm_order(&order).await?;
        debug!("📦️ Order #{order_id} confirmed by customer #{acting_customer_id}");
        Ok(confirmed)
    }

    /// Administrative status change. Any legal transition that does not reserve stock is allowed here:
    /// `pending → cancelled`, `confirmed → completed | cancelled | refunded` and `completed → refunded`.
    /// Confirmation and processing must go through [`Self::confirm_order`] and [`Self::process_order`].
    pub async fn modify_status_for_order(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<OrderChanged, MarketplaceError> {
        let order = self.fetch_order(order_id).await?;
        if order.status == new_status {
            return Err(MarketplaceError::OrderModificationNoOp(order_id, new_status));
        }
        if !order.status.can_transition_to(new_status) || order.status.reserves_stock(new_status) {
            return Err(MarketplaceError::OrderStatusConflict {
                order_id,
                status: order.status,
                action: new_status.as_str(),
            });
        }
        let updated = self.db.update_order_status(&order, new_status, self.release_on_cancel).await?;
        info!("📦️ Order #{order_id} status changed from {} to {new_status}", order.status);
        Ok(OrderChanged::new(order, updated))
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, MarketplaceError> {
        self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))
    }

    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, MarketplaceError> {
        if !self.db.user_exists(customer_id).await? {
            return Err(MarketplaceError::CustomerNotFound(customer_id));
        }
        self.db.search_orders(OrderQueryFilter::default().with_customer_id(customer_id)).await
    }

    /// Orders placed for any of the seller's products.
    pub async fn orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, MarketplaceError> {
        if !self.db.user_exists(seller_id).await? {
            return Err(MarketplaceError::SellerNotFound(seller_id));
        }
        self.db.search_orders(OrderQueryFilter::default().with_seller_id(seller_id)).await
    }

    pub async fn orders_for_product(&self, product_id: i64) -> Result<Vec<Order>, MarketplaceError> {
        if self.db.fetch_product(product_id).await?.is_none() {
            return Err(MarketplaceError::ProductNotFound(product_id));
        }
        self.db.search_orders(OrderQueryFilter::default().with_product_id(product_id)).await
    }

    pub async fn orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, MarketplaceError> {
        self.db.search_orders(OrderQueryFilter::default().with_status(status)).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        self.db.search_orders(query).await
    }

    async fn fetch_owned_order(&self, order_id: i64, customer_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.fetch_order(order_id).await?;
        if !order.is_owned_by(customer_id) {
            warn!("📦️ User #{customer_id} tried to act on order #{order_id}, which belongs to someone else");
            return Err(MarketplaceError::unauthorized(format!(
                "Order #{order_id} does not belong to user #{customer_id}"
            )));
        }
        Ok(order)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + CatalogManagement + UserDirectory + ProductItemManagement
{
    /// Places a new `pending` order for one specific item of a product. The item must not have been delivered yet, and
    /// the customer may not be the product's seller. The order is for the product the item belongs to.
    pub async fn create_order_for_item(
        &self,
        customer_id: i64,
        product_item_id: i64,
    ) -> Result<Order, MarketplaceError> {
        if !self.db.user_exists(customer_id).await? {
            return Err(MarketplaceError::CustomerNotFound(customer_id));
        }
        let item = self
            .db
            .fetch_product_item(product_item_id)
            .await?
            .ok_or(MarketplaceError::ProductItemNotFound(product_item_id))?;
        if item.is_used {
            return Err(MarketplaceError::ProductItemUnavailable(product_item_id));
        }
        validate_product_for_order(&self.db, item.product_id, customer_id).await?;
        let order =
            self.db.insert_order(NewOrder::new(customer_id, item.product_id).with_product_item(product_item_id)).await?;
        debug!(
            "📦️ Order #{} created for customer #{customer_id} and item #{product_item_id} of product #{}",
            order.id, item.product_id
        );
        Ok(order)
    }
}
