use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEmail(String);

impl RecipientEmail {
    /// Spreadsheet cells often carry stray whitespace, so the address is
    /// trimmed before it is checked.
    pub fn parse(s: String) -> Result<RecipientEmail, String> {
        let trimmed = s.trim();
        if trimmed.validate_email() {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(format!("{:?} is not a valid recipient email.", s))
        }
    }
}

impl AsRef<str> for RecipientEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
