use std::cmp::Ordering;

use crate::models::{Reply, Thread};
use crate::uploads::{AttachmentSet, EditDiff};

/// Listing sort modes, mapped onto the listing procedure's sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Newest,
    MostDiscussed,
    Alphabetical,
}

impl SortOption {
    pub fn rpc_key(self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::MostDiscussed => "most-discussed",
            SortOption::Alphabetical => "alphabetical",
        }
    }

    /// Parses the value of the page's sort select control.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "newest" => Some(SortOption::Newest),
            "most-discussed" => Some(SortOption::MostDiscussed),
            "alphabetical" => Some(SortOption::Alphabetical),
            _ => None,
        }
    }

    /// Client-side ordering matching the procedure's semantics: newest is
    /// creation descending, most-discussed is reply count descending with
    /// creation breaking ties, alphabetical is case-insensitive title
    /// ascending. Timestamps are RFC 3339 strings and compare lexically.
    pub fn compare(self, a: &Thread, b: &Thread) -> Ordering {
        match self {
            SortOption::Newest => b.created_at.cmp(&a.created_at),
            SortOption::MostDiscussed => b
                .comment_count
                .cmp(&a.comment_count)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            SortOption::Alphabetical => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }
}

/// Form fields the page chrome reads out of the new-thread form at submit.
#[derive(Debug, Clone, Default)]
pub struct ThreadForm {
    pub title: String,
    pub content: String,
    pub category_name: String,
    pub tags_input: String,
}

/// Session state of the new-thread form: staged attachments plus the
/// double-submission guard.
#[derive(Default)]
pub struct NewThreadState {
    pub attachments: AttachmentSet,
    pub submitting: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct ReplyFormState {
    pub submitting: bool,
    pub error: Option<String>,
}

/// One edit session. `session` stamps its workflows; results arriving after
/// the session ended are ignored.
pub struct EditThreadState {
    pub session: u64,
    pub prefill: ThreadForm,
    pub diff: EditDiff,
    pub submitting: bool,
    pub error: Option<String>,
}

/// State of the single-thread detail view.
pub struct DetailState {
    pub thread_id: String,
    /// Authoritative record; `None` until the fetch completes.
    pub thread: Option<Thread>,
    pub loading: bool,
    pub error: Option<String>,
    pub replies: Vec<Reply>,
    pub replies_loading: bool,
    pub reply_form: ReplyFormState,
    pub edit: Option<EditThreadState>,
}

impl DetailState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            thread: None,
            loading: true,
            error: None,
            replies: Vec::new(),
            replies_loading: true,
            reply_form: ReplyFormState::default(),
            edit: None,
        }
    }
}

/// The controller is either on the listing or inside one thread. Leaving
/// Detail drops the active thread and any edit diff with it.
pub enum ViewState {
    List,
    Detail(DetailState),
}
