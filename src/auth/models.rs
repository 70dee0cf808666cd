//! Authentication models

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles known to the mobile client
///
/// Deserialization never fails: any value the backend sends that is not one
/// of the known roles resolves to [`Role::Worker`], so every user maps onto
/// some navigation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    /// Administrator - user, farm and barn management
    Admin,
    /// Farm manager - approves checklists and incidents
    Manager,
    /// Field worker - submits checklists and incident reports
    Worker,
    /// Veterinarian
    Vet,
    /// Auditor - read-only analytics
    Auditor,
    /// Visitor
    Visitor,
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::Worker,
        Role::Vet,
        Role::Auditor,
        Role::Visitor,
    ];

    /// Normalize a raw role string, falling back to worker
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "worker" => Role::Worker,
            "vet" => Role::Vet,
            "auditor" => Role::Auditor,
            "visitor" => Role::Visitor,
            other => {
                tracing::debug!("Unknown role '{}', treating as worker", other);
                Role::Worker
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Worker => "worker",
            Role::Vet => "vet",
            Role::Auditor => "auditor",
            Role::Visitor => "visitor",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated identity, as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Create a new user
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject empty fields before anything goes over the network
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(Error::MissingCredentials);
        }
        Ok(())
    }
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}
