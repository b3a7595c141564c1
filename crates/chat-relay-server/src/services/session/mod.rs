//! Process-local session storage
//!
//! Sessions are kept in a DashMap and live for the lifetime of the
//! process. There is no expiry and no persistence.

mod store;

pub use store::{SessionStore, WelcomeExchange};
