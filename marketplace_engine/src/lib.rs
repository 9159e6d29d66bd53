//! Marketplace Engine
//!
//! The marketplace engine is the core of a marketplace for digital goods. Sellers list products, buyers order them,
//! orders move through a lifecycle, and each processed order opens a conversation between the buyer and the seller.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]) and their SQLite implementation ([`SqliteDatabase`]). You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@mkt_api`]): [`CatalogApi`], [`OrderFlowApi`] and [`ConversationApi`]. Each API is generic
//!    over its backend, so any storage that implements the traits it needs can be plugged in.
//! 3. Configuration ([`MarketplaceConfig`]), read from the environment.
//!
//! The engine never oversells a product: inventory is reserved with single conditional updates, and every order
//! status change is conditional on the status the caller last saw.
pub mod config;
pub mod db_types;
pub mod mkt_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(all(feature = "test_utils", feature = "sqlite"))]
pub mod test_utils;

#[cfg(test)]
mod api_tests;

pub use config::MarketplaceConfig;
pub use mkt_api::{
    catalog_api::CatalogApi,
    conversation_api::ConversationApi,
    conversation_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
    product_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogManagement,
    CategoryDirectory,
    ConversationManagement,
    ErrorKind,
    MarketplaceError,
    OrderManagement,
    ProductItemManagement,
    UserDirectory,
};
