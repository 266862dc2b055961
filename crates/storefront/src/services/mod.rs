//! Services that span views.
//!
//! - `auth` - sign-in, sign-up and logout

pub mod auth;
