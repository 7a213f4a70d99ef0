use crate::db::models::NewUser;
use crate::users::UserStoreError;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 120;

/// Sign-up input that passed validation, with the email already case-folded.
#[derive(Debug, Clone)]
pub struct ValidNewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

impl NewUser {
    pub fn validate(self) -> Result<ValidNewUser, UserStoreError> {
        let name = self.name.trim().to_string();
        let email = normalize_email(&self.email);

        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(UserStoreError::Validation(
                "Name, email and password are required.".into(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(UserStoreError::Validation("Name is too long.".into()));
        }
        if !is_plausible_email(&email) {
            return Err(UserStoreError::Validation(
                "Please enter a valid email address.".into(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserStoreError::Validation(format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            )));
        }

        Ok(ValidNewUser {
            name,
            email,
            password: self.password,
        })
    }
}
