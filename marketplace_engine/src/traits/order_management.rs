use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    mkt_api::order_objects::{OrderQueryFilter, ProcessedOrder},
    traits::MarketplaceError,
};

/// The `OrderManagement` trait defines behaviour for storing orders and moving them through their lifecycle.
///
/// The transactional methods take the order as the caller last saw it. Each one starts with a write that is
/// conditional on `order.status`, so if another writer has changed the order in the meantime, the call fails with
/// [`MarketplaceError::OrderStatusConflict`] and nothing is changed. The customer and product of an order never change
/// after creation, which is what makes the caller's copy safe to use for everything else.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `pending`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, MarketplaceError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;

    /// Completes a pending order in one transaction:
    /// * reserves one unit of the product, failing with [`MarketplaceError::ProductUnavailable`] if it is sold out or
    ///   inactive,
    /// * flags the order's product item as used, failing with [`MarketplaceError::ProductItemUnavailable`] if another
    ///   order got it first,
    /// * moves the order to `completed`,
    /// * when the order has both a customer and a product, opens a conversation between the customer and the seller
    ///   and posts `notice` into it as a system message that references the order.
    ///
    /// Any failure rolls back every step.
    async fn process_order(&self, order: &Order, notice: &str) -> Result<ProcessedOrder, MarketplaceError>;

    /// Confirms a pending order and reserves one unit of its product.
    ///
    /// If the reservation fails, the order is moved to `cancelled` instead, that change is committed, and the call
    /// fails with [`MarketplaceError::ProductNoLongerAvailable`].
    async fn confirm_order(&self, order: &Order) -> Result<Order, MarketplaceError>;

    /// Moves the order from `order.status` to `new_status`. When `release_reservation` is set and the transition leaves
    /// `confirmed` for `cancelled` or `refunded`, the unit reserved at confirmation is released in the same
    /// transaction.
    ///
    /// This method does not consult the state machine. Callers decide which transitions they allow.
    async fn update_order_status(
        &self,
        order: &Order,
        new_status: OrderStatusType,
        release_reservation: bool,
    ) -> Result<Order, MarketplaceError>;
}
