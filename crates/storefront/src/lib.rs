//! eShop storefront client library.
//!
//! Talks to the eShop REST API and holds everything a storefront front end
//! needs above the wire: configuration, the client session, credential
//! fallback for authenticated calls, role-gated routing, form validation and
//! the view models for each screen.
//!
//! # Example
//!
//! ```rust,ignore
//! use eshop_storefront::{Storefront, StorefrontConfig};
//! use eshop_storefront::views::catalog::CatalogView;
//!
//! let storefront = Storefront::from_config(StorefrontConfig::from_env()?)?;
//! let mut catalog = CatalogView::new(storefront.clone());
//! catalog.load().await;
//! for product in catalog.visible_products() {
//!     println!("{} {}", product.display_name(), product.price);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod forms;
pub mod guard;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod views;

pub use config::StorefrontConfig;
pub use state::Storefront;
