use serde::{Deserialize, Serialize};

use auditdesk_core::EmailAddress;

use crate::{AuthError, Role};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A validated account creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub credentials: Credentials,
    pub full_name: String,
    pub role: Role,
}

impl SignUpRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        role: Option<Role>,
    ) -> Result<Self, AuthError> {
        let credentials = Credentials::new(email, password);
        let email = EmailAddress::parse(&credentials.email)
            .map_err(|_| AuthError::registration("please enter a valid email address"))?;
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::registration(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let full_name = full_name.into().trim().to_string();
        if full_name.is_empty() {
            return Err(AuthError::registration("full name is required"));
        }
        Ok(Self {
            credentials: Credentials {
                email: email.to_string(),
                password: credentials.password,
            },
            full_name,
            role: role.unwrap_or_default(),
        })
    }

    pub fn email(&self) -> &str {
        &self.credentials.email
    }
}

/// Raw registration form, including the password confirmation field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Self-registration always requests the `team` role.
    pub fn validate(self) -> Result<SignUpRequest, AuthError> {
        if self.password != self.confirm_password {
            return Err(AuthError::registration("passwords do not match"));
        }
        SignUpRequest::new(self.email, self.password, self.full_name, Some(Role::Team))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Ayşe Yılmaz".into(),
            email: "Ayse@Example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[test]
    fn valid_form_yields_team_request() {
        let req = form().validate().unwrap();
        assert_eq!(req.role, Role::Team);
        assert_eq!(req.email(), "ayse@example.com");
    }

    #[test]
    fn short_password_is_rejected() {
        let f = RegistrationForm {
            password: "12345".into(),
            confirm_password: "12345".into(),
            ..form()
        };
        assert!(matches!(f.validate(), Err(AuthError::InvalidRegistration(m)) if m.contains('6')));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let f = RegistrationForm {
            confirm_password: "secret2".into(),
            ..form()
        };
        assert_eq!(f.validate(), Err(AuthError::registration("passwords do not match")));
    }

    #[test]
    fn name_and_email_are_required() {
        let f = RegistrationForm {
            full_name: " ".into(),
            ..form()
        };
        assert!(f.validate().is_err());
        let f = RegistrationForm {
            email: "nope".into(),
            ..form()
        };
        assert!(f.validate().is_err());
    }

    #[test]
    fn role_defaults_to_team() {
        let req = SignUpRequest::new("a@b.co", "123456", "A", None).unwrap();
        assert_eq!(req.role, Role::Team);
    }
}
