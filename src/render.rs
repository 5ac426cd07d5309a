use crate::models::{Reply, Thread};

/// Pagination facts for the list footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Which form an inline notice belongs to. Anything else renders as a
/// transient toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormScope {
    NewThread,
    EditThread,
    Reply,
}

/// A user-visible notification. Form-scoped errors render inline next to the
/// relevant form; everything else is a transient, auto-dismissing toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub scope: Option<FormScope>,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            scope: None,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            scope: None,
            text: text.into(),
        }
    }

    pub fn form_error(scope: FormScope, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            scope: Some(scope),
            text: text.into(),
        }
    }
}

/// Hook the surrounding page implements. The controller invokes it after
/// every state change; implementations re-render the affected region and
/// must tolerate repeated calls with identical data.
pub trait RenderSink: Send {
    fn thread_list(&mut self, threads: &[Thread], pagination: Pagination);
    fn thread_detail(&mut self, thread: &Thread, replies: &[Reply]);
    fn notice(&mut self, notice: &Notice);
}
