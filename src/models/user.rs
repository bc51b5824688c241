use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user's role in the car-pooling domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" => Ok(Role::Rider),
            "driver" => Ok(Role::Driver),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A stored user, including the password hash.
///
/// Never serialized. Convert to [`Identity`] before it leaves the service.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: i64,
    /// The user's email address.
    pub email: String,
    /// The user's Argon2 password hash.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
    /// Whether the user is active.
    pub is_active: bool,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_active: self.is_active,
            role: self.role,
        }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            role: user.role,
        }
    }
}

/// The principal attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role: Option<Role>,
}

/// The data needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_serializes_without_credentials() {
        let user = User {
            id: 7,
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            phone: None,
            role: Some(Role::Driver),
            is_active: true,
        };

        let json = serde_json::to_value(Identity::from(user)).unwrap();
        assert_eq!(json["role"], "driver");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Driver".parse::<Role>(), Ok(Role::Driver));
        assert!("pilot".parse::<Role>().is_err());
    }
}
