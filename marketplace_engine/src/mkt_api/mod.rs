//! # Marketplace engine public API
//!
//! The `mkt_api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`catalog_api`] lets sellers list, edit and withdraw products, and guards product inventory.
//! * [`order_flow_api`] creates orders and moves them through their lifecycle, including the side effects of processing
//!   an order (stock reservation, and a buyer/seller conversation).
//! * [`conversation_api`] manages conversations, their membership and their messages.
//!
//! The other submodules in this module are the request and response types used by the APIs.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use marketplace_engine::{MarketplaceConfig, OrderFlowApi, SqliteDatabase};
//! let config = MarketplaceConfig::load();
//! let db = SqliteDatabase::from_config(&config).await?;
//! // SqliteDatabase implements OrderManagement, CatalogManagement and UserDirectory
//! let api = OrderFlowApi::from_config(db, &config);
//! let order = api.create_order(buyer_id, product_id).await?;
//! let processed = api.process_order(order.id).await?;
//! ```

pub mod catalog_api;
pub mod conversation_api;
pub mod order_flow_api;

pub mod conversation_objects;
pub mod order_objects;
pub mod product_objects;
