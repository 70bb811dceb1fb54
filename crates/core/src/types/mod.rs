//! Core type definitions.

mod email;
mod id;
mod price;

pub use email::{Email, EmailError};
pub use id::{AddressId, CartId, CartLineId, OrderId, ProductId, UserId};
pub use price::Price;
