//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the marketplace engine database *backends*.
//!
//! ## Catalog
//! Products are listed by sellers. Every product carries a `sold_count`, and disposable products carry a `max_sales`
//! cap as well. The [`CatalogManagement`] trait is the only way `sold_count` changes, and it does so through atomic
//! conditional updates (`check_and_reserve` and `release_reservation`), so that concurrent buyers can never oversell
//! a product.
//!
//! ## Orders
//! [`OrderManagement`] stores orders and applies status transitions. Every status write is conditional on the status
//! the caller last saw, which turns a lost race into an error rather than a silent overwrite. The multi-step flows
//! (processing and confirmation) run inside a single transaction.
//!
//! ## Product items
//! A product can carry a stock of deliverable items (licence keys, download codes). [`ProductItemManagement`] stores
//! them. An order may name one item, which is flagged as used in the transaction that processes the order, so an item
//! is never delivered twice.
//!
//! ## Conversations
//! [`ConversationManagement`] stores conversations, their participants and the message log.
//!
//! ## Traits
//! * [`CatalogManagement`] defines product storage and the inventory guard.
//! * [`OrderManagement`] defines order storage and the order lifecycle transactions.
//! * [`ProductItemManagement`] defines storage for the deliverable items of a product.
//! * [`ConversationManagement`] defines conversation, membership and message storage.
//! * [`UserDirectory`] and [`CategoryDirectory`] are the lookups the core needs from the user and category services.
mod catalog_management;
mod conversation_management;
mod directories;
mod errors;
mod order_management;
mod product_item_management;

pub use catalog_management::CatalogManagement;
pub use conversation_management::ConversationManagement;
pub use directories::{CategoryDirectory, UserDirectory};
pub use errors::{ErrorKind, MarketplaceError};
pub use order_management::OrderManagement;
pub use product_item_management::ProductItemManagement;
