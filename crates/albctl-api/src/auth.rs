use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

/// Credentials for authenticating with a controller.
///
/// Each variant carries the secret material needed for its login flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Interactive user login.
    Password {
        username: String,
        password: SecretString,
    },
    /// API token login (`authtoken` objects, as handed to ControlScripts).
    Token { username: String, token: SecretString },
}

impl Credentials {
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::Token { username, .. } => username,
        }
    }

    /// The `POST /login` request body for this credential type.
    pub(crate) fn login_body(&self) -> Value {
        match self {
            Self::Password { username, password } => json!({
                "username": username,
                "password": password.expose_secret(),
            }),
            Self::Token { username, token } => json!({
                "username": username,
                "token": token.expose_secret(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_login_body_omits_password() {
        let creds = Credentials::Token {
            username: "svc".into(),
            token: SecretString::from("abc".to_string()),
        };
        let body = creds.login_body();
        assert_eq!(body["username"], "svc");
        assert_eq!(body["token"], "abc");
        assert!(body.get("password").is_none());
    }
}
