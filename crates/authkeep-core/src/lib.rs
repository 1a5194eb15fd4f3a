//! Core authkeep library (auth state store, token inspection, storage).

pub mod storage;
pub mod store;
pub mod token;

pub use storage::{FileStorage, MemoryStorage, StateStorage};
pub use store::{AuthState, AuthStore, STORAGE_KEY, UserId};
pub use token::TokenStatus;
