//! Local input checks, run before anything touches the network.

use thiserror::Error;

/// Input rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("phone number is required")]
    MissingPhone,

    #[error("phone number '{0}' is not valid")]
    InvalidPhone(String),

    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),

    #[error("challenge token is missing")]
    MissingChallenge,

    #[error("verification code must be exactly {expected} digits")]
    InvalidCode { expected: usize },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::MissingPhone => "Please enter the phone number we should call.".to_string(),
            ValidationError::InvalidPhone(_) => {
                "That phone number doesn't look right. Use a format like (321) 704-7403 or +44 20 7946 0958."
                    .to_string()
            }
            ValidationError::InvalidEmail(_) => "Please check the email address, or leave it empty.".to_string(),
            ValidationError::MissingChallenge => "Please complete the verification challenge first.".to_string(),
            ValidationError::InvalidCode { expected } => {
                format!("Enter the {expected}-digit code from your text message.")
            }
        }
    }
}

/// Contact fields as entered by the person requesting a callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Trimmed copy with the phone number in E.164 form.
    pub fn normalized(&self) -> Result<ContactDetails, ValidationError> {
        let email = self.email.trim();
        if !email.is_empty() && !is_plausible_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        Ok(ContactDetails {
            name: self.name.trim().to_string(),
            email: email.to_string(),
            phone: normalize_phone(&self.phone)?,
        })
    }
}

/// Normalize a phone number to E.164.
///
/// Ten bare digits are read as a North American number.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingPhone);
    }
    let invalid = || ValidationError::InvalidPhone(trimmed.to_string());

    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '-' | '.'))
        .collect();
    let (international, digits) = match compact.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    if international {
        if (8..=15).contains(&digits.len()) && !digits.starts_with('0') {
            return Ok(format!("+{digits}"));
        }
        return Err(invalid());
    }

    match digits.len() {
        10 => Ok(format!("+1{digits}")),
        11 if digits.starts_with('1') => Ok(format!("+{digits}")),
        _ => Err(invalid()),
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Check the shape of a verification code; returns it trimmed.
pub fn check_code(raw: &str, length: usize) -> Result<String, ValidationError> {
    let code = raw.trim();
    if code.len() == length && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code.to_string())
    } else {
        Err(ValidationError::InvalidCode { expected: length })
    }
}
