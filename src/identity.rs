use serde::{Deserialize, Serialize};

/// The authenticated user as supplied by the identity collaborator. The
/// controller only reads this; sign-in/out is someone else's job, delivered
/// through [`crate::app::ForumApp::set_identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
}

impl UserIdentity {
    /// Display name, falling back to the email local part.
    pub fn display_name(&self) -> &str {
        match &self.username {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}
