use crate::models::{Category, ForumStats, Reply, Thread, ThreadPage};

/// Results posted back to the controller by background workflows. Every
/// variant carries enough identity (thread id, edit session) for the handler
/// to decide whether the originating view is still active.
pub enum AppMessage {
    CategoriesLoaded(Result<Vec<Category>, anyhow::Error>),
    ThreadsLoaded {
        seq: u64,
        result: Result<ThreadPage, anyhow::Error>,
    },
    ThreadLoaded {
        thread_id: String,
        result: Result<Thread, anyhow::Error>,
    },
    RepliesLoaded {
        thread_id: String,
        result: Result<Vec<Reply>, anyhow::Error>,
    },
    ThreadCreated(Result<Thread, anyhow::Error>),
    ThreadUpdated {
        thread_id: String,
        session: u64,
        result: Result<(), anyhow::Error>,
    },
    ThreadDeleted {
        thread_id: String,
        result: Result<(), anyhow::Error>,
    },
    ReplyCreated {
        thread_id: String,
        result: Result<Reply, anyhow::Error>,
    },
    StatsLoaded(Result<ForumStats, anyhow::Error>),
}
