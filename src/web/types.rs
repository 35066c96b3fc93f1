//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use chrono::{DateTime, Utc};
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Waitlist Entry
/// A signup that can be Deserialized but can have missing or invalid fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeserWaitlistEntry {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Validated Waitlist Entry
/// A signup with all the fields validated and normalized
#[derive(Debug, Clone)]
pub struct ValidWaitlistEntry {
    pub full_name: ValidName,
    pub email: ValidEmail,
    pub phone: ValidPhone,
    pub interests: Vec<String>,
}

impl TryFrom<DeserWaitlistEntry> for ValidWaitlistEntry {
    type Error = DataParsingError;

    fn try_from(deser_entry: DeserWaitlistEntry) -> Result<Self, Self::Error> {
        let (Some(full_name), Some(email), Some(phone)) = (
            non_empty(deser_entry.full_name),
            non_empty(deser_entry.email),
            non_empty(deser_entry.phone),
        ) else {
            return Err(DataParsingError::MissingRequiredFields);
        };

        let email = ValidEmail::parse(email)?;
        let phone = ValidPhone::parse(phone)?;

        Ok(ValidWaitlistEntry {
            full_name: ValidName(full_name),
            email,
            phone,
            interests: deser_entry.interests.unwrap_or_default(),
        })
    }
}

/// Validated and normalized (trimmed, lowercase) email
#[derive(Debug, Clone)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value) {
            Ok(ValidEmail(normalize_email(value)))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// Validated and trimmed phone number
#[derive(Debug, Clone)]
pub struct ValidPhone(String);

impl AsRef<str> for ValidPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidPhone {
    /// Only digits, whitespace, `+`, `-` and parentheses are accepted.
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if regex_is_match!(r"^[0-9\s+()-]+$", value) {
            Ok(ValidPhone(value.trim().to_owned()))
        } else {
            Err(DataParsingError::PhoneInvalid)
        }
    }
}

/// Full name, stored exactly as submitted
#[derive(Debug, Clone)]
pub struct ValidName(String);

impl AsRef<str> for ValidName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The `email` query parameter of the existence check
#[derive(Debug)]
pub struct ExistsQuery {
    pub email: Option<String>,
}

impl ExistsQuery {
    /// Picks the first `email` pair of a decoded query string, repeats are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let email = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "email").then_some(value));

        ExistsQuery { email }
    }

    /// Returns the normalized email or an error if it is missing or empty.
    pub fn normalized_email(self) -> Result<String, DataParsingError> {
        non_empty(self.email)
            .map(|email| normalize_email(&email))
            .ok_or(DataParsingError::EmailParamMissing)
    }
}

/// The row handed back by the database after a successful insert
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WaitlistRecord {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: WaitlistRecord,
}

impl SignupResponse {
    pub fn new(data: WaitlistRecord) -> Self {
        Self {
            success: true,
            message: "Successfully joined the waitlist!",
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

// ###################################
// ->   HELPERS
// ###################################
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Only absent and empty values count as missing, whitespace is left to the pattern checks.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("missing required fields")]
    MissingRequiredFields,

    #[error("email invalid")]
    EmailInvalid,
    #[error("email query parameter missing")]
    EmailParamMissing,

    #[error("phone number invalid")]
    PhoneInvalid,
}

impl DataParsingError {
    /// The message shown to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            DataParsingError::MissingRequiredFields => "Missing required fields",
            DataParsingError::EmailInvalid => "Invalid email format",
            DataParsingError::EmailParamMissing => "Email parameter required",
            DataParsingError::PhoneInvalid => "Invalid phone number format",
        }
    }
}
