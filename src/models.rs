use serde::{Deserialize, Serialize};

/// One row of the `threads` table, as returned by both the paginated listing
/// procedure and direct table reads. Counters are maintained server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub author_username: Option<String>,
    pub title: String,
    pub content: String,
    /// Category id; `None` renders as "Uncategorized".
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Durable public URLs, at most [`crate::uploads::MAX_ATTACHMENTS`].
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub view_count: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Only present on rows from the listing procedure.
    #[serde(default)]
    pub total_pages: Option<i64>,
    /// Joined display name, when the query included it.
    #[serde(default)]
    pub category_name: Option<String>,
}

/// A reply row from `get_replies_for_thread`. The procedure returns a flat,
/// chronologically ordered sequence; `depth` exists but is not used for tree
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "reply_id")]
    pub id: String,
    pub thread_id: String,
    #[serde(rename = "reply_user_id")]
    pub user_id: String,
    #[serde(rename = "reply_author_username", default)]
    pub author_username: Option<String>,
    #[serde(rename = "reply_content")]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(rename = "reply_created_at")]
    pub created_at: String,
    #[serde(default)]
    pub depth: i32,
}

/// Read-only reference data, cached once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateThreadInput {
    pub user_id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct UpdateThreadInput {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateReplyInput {
    pub thread_id: String,
    pub user_id: String,
    pub author_username: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// One page of the thread listing plus the server-computed page count.
#[derive(Debug, Clone, Default)]
pub struct ThreadPage {
    pub items: Vec<Thread>,
    pub total_pages: i64,
}

/// Community counters from the `get_forum_stats` procedure.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ForumStats {
    #[serde(default)]
    pub total_threads: i64,
    #[serde(default)]
    pub total_replies: i64,
    #[serde(default)]
    pub total_users: i64,
}

impl Thread {
    /// Parses tags from a comma-separated form field.
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
