//! Session token storage and the authenticated session.

pub mod session;
pub mod token;

pub use session::{AuthSession, AuthState, LoginError};
pub use token::{token_store_for, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
