//! Account registration, login and session models.

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::UserId;

/// Registration request body.
#[derive(Debug, Serialize)]
pub struct UserCreate {
    /// Login e-mail.
    pub email: String,
    /// Plain-text password, only exposed while serializing the request.
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A registered user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login e-mail.
    pub email: String,
    /// Display name.
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    /// Server-side creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Successful login response.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_token: SecretString,
    /// Token scheme, normally `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Identifier of the authenticated user.
    pub user_id: UserId,
}

/// Credentials for authenticated calls.
///
/// Passed explicitly to whatever needs them; nothing in this crate keeps a
/// global token.
#[derive(Debug)]
pub struct Session {
    /// Bearer token.
    pub token: SecretString,
    /// Authenticated user.
    pub user_id: UserId,
    /// E-mail used to log in, when known.
    pub email: Option<String>,
}

impl Session {
    /// Builds a session from a login response.
    #[inline]
    #[must_use]
    pub fn from_login(response: LoginResponse, email: Option<String>) -> Self {
        Self {
            token: response.access_token,
            user_id: response.user_id,
            email,
        }
    }
}

/// Writes a secret as a plain string.
fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Reads a plain string into a secret.
fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_serializes_password() {
        let req = UserCreate {
            email: "ana@example.com".to_owned(),
            password: SecretString::from("s3cret".to_owned()),
            name: Some("Ana".to_owned()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["email"], "ana@example.com");
        assert_eq!(json["password"], "s3cret");
        assert_eq!(json["name"], "Ana");
    }

    #[test]
    fn user_create_debug_hides_password() {
        let req = UserCreate {
            email: "ana@example.com".to_owned(),
            password: SecretString::from("s3cret".to_owned()),
            name: None,
        };
        assert!(!format!("{req:?}").contains("s3cret"));
    }

    #[test]
    fn deserialize_login_response() {
        let json = r#"{"access_token": "abc.def", "token_type": "bearer", "user_id": 12}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token.expose_secret(), "abc.def");
        assert_eq!(resp.user_id, UserId::new(12));
        let session = Session::from_login(resp, Some("ana@example.com".to_owned()));
        assert_eq!(session.user_id, UserId::new(12));
        assert!(!format!("{session:?}").contains("abc.def"));
    }

    #[test]
    fn deserialize_user_with_spanish_name() {
        let json = r#"{"id": 5, "email": "luis@example.com", "nombre": "Luis"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.name.as_deref(), Some("Luis"));
        assert!(user.created_at.is_none());
    }
}
