//! Storefront API client: authenticated HTTP access plus the client-side
//! synchronization stores for the cart and the wishlist.
//!
//! The crate splits into an HTTP layer ([`api`]) that talks the backend's
//! envelope dialect, a normalization layer ([`models`]) that turns loose
//! wire records into well-formed domain values, and the [`sync`] stores that
//! own the client-side view of each collection. [`session`] holds the auth
//! state all of them key off, and [`bus`] carries change signals between
//! concurrent instances of the same user's session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod bus;
pub mod config;
pub mod models;
pub mod notify;
pub mod session;
pub mod sync;

pub use api::{ApiClient, ApiError, CartApi, WishlistApi};
pub use bus::{BusHandle, Signal, SignalBus, SignalStream, Topic};
pub use config::{ClientConfig, ConfigError};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use session::{Session, SessionState, UserProfile, spawn_token_bridge};
pub use sync::{
    CartStore, CartView, InFlight, LineQuantityUpdater, SyncPhase, WishlistStore, WishlistView,
};
