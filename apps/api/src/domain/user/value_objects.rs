use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Email value object used by email sign-in
///
/// # Invariants
/// - Must contain '@' character
/// - Must be at least 3 characters long
/// - Stored trimmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use teambuilder_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new(" admin@ptb.app ").expect("valid email");
    /// assert_eq!(email.as_str(), "admin@ptb.app");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_string();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        email.contains('@') && email.len() >= 3
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text trainer name used for local claim bookkeeping
///
/// Keeps the trimmed text as typed but compares case-insensitively, so
/// "Ash" and " ash " are the same trainer.
///
/// # Example
/// ```
/// use teambuilder_api::domain::user::value_objects::DisplayName;
///
/// let a = DisplayName::new("Ash").unwrap();
/// let b = DisplayName::new("  aSH ").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(b.as_str(), "aSH");
/// assert!(DisplayName::new("   ").is_none());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Returns None for blank input
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let clean = name.as_ref().trim();
        if clean.is_empty() {
            None
        } else {
            Some(DisplayName(clean.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Comparison key
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for DisplayName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for DisplayName {}

impl Hash for DisplayName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DisplayName::new(&raw).ok_or_else(|| serde::de::Error::custom("display name is blank"))
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role attribute on a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parses a stored role; anything other than "admin" is a plain user
    pub fn from_stored(raw: &str) -> Self {
        if raw == "admin" {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
