//! # Accounts
//!
//! Store accounts are either administrators (manage the catalog, list all
//! accounts) or regular users. Password hashes never leave the database
//! layer, so `Account` is safe to serialize as a profile.

use serde::{Deserialize, Serialize};

pub type AccountId = i64;

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Admin,
    User,
}

impl AccountType {
    /// Stored representation
    pub fn as_i16(&self) -> i16 {
        match self {
            AccountType::Admin => 1,
            AccountType::User => 2,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(AccountType::Admin),
            2 => Some(AccountType::User),
            _ => None,
        }
    }

    /// Signup form value; anything other than `admin` is a regular user
    pub fn from_signup(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            AccountType::Admin
        } else {
            AccountType::User
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AccountType::Admin)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Admin => write!(f, "admin"),
            AccountType::User => write!(f, "user"),
        }
    }
}

/// A registered account (profile view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Loyalty points accumulated from purchases
    pub points: i64,
}

/// Data needed to register an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub account_type: AccountType,
}
