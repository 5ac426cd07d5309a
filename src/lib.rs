pub mod api;
pub mod app;
pub mod categories;
pub mod error;
pub mod identity;
pub mod models;
pub mod render;
pub mod storage;
pub mod uploads;

pub use api::{DataClient, ThreadStore};
pub use app::{ForumApp, SortOption, ThreadForm, ViewState, PAGE_SIZE};
pub use error::ForumError;
pub use identity::UserIdentity;
pub use render::{Notice, NoticeLevel, Pagination, RenderSink};
pub use storage::{MediaStorage, StorageClient};

use std::sync::Arc;

/// Builds a controller wired to the hosted data and storage services, and
/// initialises logging. The embedding page supplies its render hook.
pub fn run_controller(
    base_url: &str,
    api_key: &str,
    renderer: Box<dyn RenderSink>,
) -> anyhow::Result<ForumApp> {
    let _ = env_logger::builder().is_test(false).try_init();
    let store = Arc::new(DataClient::new(base_url, api_key)?);
    let storage = Arc::new(StorageClient::new(base_url, api_key)?);
    Ok(ForumApp::new(store, storage, renderer))
}
