//! Customer profile.
//!
//! Authentication and credential storage live elsewhere; the pipeline only
//! needs the profile fields that feed order defaulting and notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use matchday_core::UserId;

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store administrator.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Default contact phone, used when an order supplies none.
    pub phone: Option<String>,
    /// Default shipping address, used when an order supplies none.
    pub address: Option<String>,
    /// Permission role.
    pub role: Role,
    /// Whether the account is active.
    pub active: bool,
    /// When the user registered.
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
