//! Authentication and session management

pub mod models;
pub mod session;
pub mod store;
pub mod token;

pub use models::{LoginRequest, LoginResponse, Role, User};
pub use session::{
    AuthBackend, LogoutReason, RequestTag, Session, SessionEvent, SessionManager,
    SessionState,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
pub use token::{inspect_token, is_token_expired, Claims};
