//! Core types for eShop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod contact;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod product;
pub mod role;
pub mod user;

pub use address::{Address, NewAddress};
pub use contact::{ContactNumber, ContactNumberError, Zipcode, ZipcodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Price, PriceError};
pub use order::{NewOrder, Order, OrderIntent, Quantity, QuantityError};
pub use product::{Product, ProductInput};
pub use role::{ADMIN_ROLE, Privilege, Role};
pub use user::{SignupRequest, UserProfile};
