use serde::{Deserialize, Serialize};

use crate::db_types::{Conversation, Message, Order, OrderStatusType, ProductItem};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    /// Matches orders for any product listed by this seller.
    pub seller_id: Option<i64>,
    pub product_id: Option<i64>,
    pub statuses: Vec<OrderStatusType>,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.seller_id.is_none() && self.product_id.is_none() && self.statuses.is_empty()
    }
}

/// The outcome of processing an order: the completed order, plus the buyer/seller conversation and the notice posted
/// into it, when the order had both a customer and a product. `item` is the product item delivered with the order, if
/// it named one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedOrder {
    pub order: Order,
    pub item: Option<ProductItem>,
    pub conversation: Option<Conversation>,
    pub notice: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderChanged {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }
}
