use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use mkt_common::Price;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, email: S) -> Self {
        Self { username: username.into(), email: email.into() }
    }
}

//--------------------------------------       Category        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category_id: i64,
    pub is_active: bool,
    pub disposable: bool,
    /// The maximum number of units that can be sold. Zero means unlimited.
    pub max_sales: i64,
    pub sold_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product can be bought if it is active and has not reached its sales cap.
    ///
    /// This is a snapshot check only. Reservations must go through the atomic conditional update in the backend.
    pub fn is_available(&self) -> bool {
        self.is_active && (self.max_sales == 0 || self.sold_count < self.max_sales)
    }

    /// The number of units left to sell, or `None` if sales are unlimited.
    pub fn remaining_stock(&self) -> Option<i64> {
        (self.max_sales > 0).then(|| (self.max_sales - self.sold_count).max(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category_id: i64,
    pub disposable: bool,
    pub max_sales: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(title: S, price: Price, category_id: i64) -> Self {
        Self { title: title.into(), description: String::default(), price, category_id, disposable: false, max_sales: 0 }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Caps sales at `max_sales` units and marks the product as disposable.
    pub fn with_max_sales(mut self, max_sales: i64) -> Self {
        self.max_sales = max_sales;
        self.disposable = max_sales > 0;
        self
    }
}

/// The fields of a product that a seller may change. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category_id: Option<i64>,
    pub is_active: Option<bool>,
    pub disposable: Option<bool>,
    pub max_sales: Option<i64>,
}

impl ProductUpdate {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn with_disposable(mut self, disposable: bool) -> Self {
        self.disposable = Some(disposable);
        self
    }

    pub fn with_max_sales(mut self, max_sales: i64) -> Self {
        self.max_sales = Some(max_sales);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.category_id.is_none() &&
            self.is_active.is_none() &&
            self.disposable.is_none() &&
            self.max_sales.is_none()
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed, but no inventory has been reserved for it.
    Pending,
    /// The buyer has confirmed the order and a unit of inventory is reserved for it.
    Confirmed,
    /// The order has been processed and delivered.
    Completed,
    /// The order was cancelled by the buyer, or automatically when the product sold out.
    Cancelled,
    /// The order was refunded by an administrator.
    Refunded,
}

impl OrderStatusType {
    /// Every legal edge of the order state machine. No edge leads back to `Pending`.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Completed | Cancelled) |
                (Confirmed, Completed | Cancelled | Refunded) |
                (Completed, Refunded)
        )
    }

    /// True when moving from `self` to `next` takes a unit of stock. Those edges belong to confirmation and processing.
    pub fn reserves_stock(&self, next: OrderStatusType) -> bool {
        matches!(
            (self, next),
            (OrderStatusType::Pending, OrderStatusType::Confirmed | OrderStatusType::Completed)
        )
    }

    /// True when moving from `self` to `next` gives back a unit reserved at confirmation.
    pub fn releases_reservation(&self, next: OrderStatusType) -> bool {
        matches!(
            (self, next),
            (OrderStatusType::Confirmed, OrderStatusType::Cancelled | OrderStatusType::Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Confirmed => "confirmed",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Refunded => "refunded",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub product_id: Option<i64>,
    /// The unit of digital goods delivered with this order, if the buyer ordered a specific one.
    pub product_item_id: Option<i64>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, customer_id: i64) -> bool {
        self.customer_id == Some(customer_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: Option<i64>,
    pub product_id: Option<i64>,
    pub product_item_id: Option<i64>,
}

impl NewOrder {
    pub fn new(customer_id: i64, product_id: i64) -> Self {
        Self { customer_id: Some(customer_id), product_id: Some(product_id), product_item_id: None }
    }

    pub fn with_product_item(mut self, product_item_id: i64) -> Self {
        self.product_item_id = Some(product_item_id);
        self
    }
}

//--------------------------------------      ProductItem      ---------------------------------------------------------
/// A single deliverable unit of a product, such as a licence key or a download code. Each item is handed out at most
/// once.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: i64,
    pub product_id: i64,
    pub data: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Conversation      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub product_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub product_id: Option<i64>,
    /// Distinct user ids, in ascending order.
    pub participants: Vec<i64>,
}

impl NewConversation {
    /// Builds a new conversation request. Repeated user ids are collapsed into one participant.
    pub fn new<I: IntoIterator<Item = i64>>(participants: I) -> Self {
        let participants = participants.into_iter().collect::<BTreeSet<i64>>().into_iter().collect();
        Self { product_id: None, participants }
    }

    pub fn for_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

//--------------------------------------      Participant      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Message        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    /// `None` for system messages.
    pub sender_id: Option<i64>,
    pub order_id: Option<i64>,
    pub text: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: i64,
    pub sender_id: Option<i64>,
    pub order_id: Option<i64>,
    pub text: String,
}

impl NewMessage {
    pub fn from_user<S: Into<String>>(conversation_id: i64, sender_id: i64, text: S) -> Self {
        Self { conversation_id, sender_id: Some(sender_id), order_id: None, text: text.into() }
    }

    pub fn system<S: Into<String>>(conversation_id: i64, text: S) -> Self {
        Self { conversation_id, sender_id: None, order_id: None, text: text.into() }
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn is_system(&self) -> bool {
        self.sender_id.is_none()
    }
}
