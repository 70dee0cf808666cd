//! Backend API collaborators

pub mod client;

pub use client::{ApiClient, AuthorizedClient, DEFAULT_LOGIN_ERROR};
