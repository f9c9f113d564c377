//! # handoff-session
//!
//! Server-side sessions for identities established through a handoff token.
//!
//! This crate provides:
//! - The [`SessionStore`] and [`IdentityStore`] contracts
//! - In-memory and SQLite implementations of both
//! - The [`SessionManager`], which issues, authenticates and revokes opaque
//!   session handles
//! - [`SessionCookie`] for carrying a handle in a cookie
//!
//! ## Session States
//!
//! | State | Meaning |
//! |-------|---------|
//! | Active | Created, `now < expires_at` |
//! | Expired | Past `expires_at`; refused on lookup even if the record remains |
//! | Revoked | Deleted by logout; terminal |
//!
//! Stores never need to delete expired records proactively; they only refuse
//! them on lookup. [`SessionManager::purge_expired`] is an explicit operator
//! action.

pub mod cookie;
pub mod error;
pub mod identity;
pub mod manager;
pub mod record;
pub mod sqlite;
pub mod store;

pub use cookie::SessionCookie;
pub use error::{AuthError, StoreError};
pub use identity::{Identity, IdentityProfile, IdentityStore};
pub use manager::SessionManager;
pub use record::{SessionHandle, SessionRecord, fingerprint};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, SessionStore, Stores, open_stores};
