//! FarmTwin - session and navigation core for the FarmTwin 360 mobile client
//!
//! The crate owns the authentication lifecycle (login, logout, restoring a
//! cached session, reacting to server-side token rejection) and the policy
//! that decides which screens each role can reach. The backend and the
//! device key-value store are collaborators reached through [`auth::AuthBackend`]
//! and [`auth::KeyValueStore`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod navigation;

pub use auth::{Role, Session, SessionManager, User};
pub use config::Config;
pub use error::Error;
pub use navigation::{profile_for, RoleNavigationProfile};
