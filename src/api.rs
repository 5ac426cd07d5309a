use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde_json::json;

use crate::models::{
    Category, CreateReplyInput, CreateThreadInput, ForumStats, Reply, Thread, ThreadPage,
    UpdateThreadInput,
};

/// Row-level operations the forum controller needs from the remote data
/// service. `DataClient` is the production implementation; tests substitute
/// an in-memory store.
pub trait ThreadStore: Send + Sync {
    /// Paginated listing procedure. Pages beyond the last return an empty
    /// item set, not an error.
    fn thread_page(
        &self,
        page: u32,
        page_size: u32,
        sort_key: &str,
        category_id: Option<&str>,
    ) -> Result<ThreadPage>;

    /// Degraded listing: direct table read, creation descending, client
    /// limited. Used when the procedure fails.
    fn recent_threads(&self, limit: u32) -> Result<Vec<Thread>>;

    fn get_thread(&self, id: &str) -> Result<Thread>;
    fn create_thread(&self, input: &CreateThreadInput) -> Result<Thread>;
    fn update_thread(&self, id: &str, input: &UpdateThreadInput) -> Result<()>;
    fn delete_thread(&self, id: &str) -> Result<()>;

    fn list_replies(&self, thread_id: &str) -> Result<Vec<Reply>>;
    fn create_reply(&self, input: &CreateReplyInput) -> Result<Reply>;

    fn list_categories(&self) -> Result<Vec<Category>>;
    fn forum_stats(&self) -> Result<ForumStats>;
}

/// Blocking client for the hosted PostgREST-style data service.
pub struct DataClient {
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
    client: Client,
}

impl DataClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            api_key: api_key.into(),
            access_token: RwLock::new(None),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Installs or clears the signed-in user's token. Subsequent writes run
    /// under that identity's row-level policies.
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    fn rest_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("invalid base URL")?;
        url.set_path(&format!("rest/v1/{}", path.trim_start_matches('/')));
        Ok(url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| self.api_key.clone());
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }
}

impl ThreadStore for DataClient {
    fn thread_page(
        &self,
        page: u32,
        page_size: u32,
        sort_key: &str,
        category_id: Option<&str>,
    ) -> Result<ThreadPage> {
        let url = self.rest_url("rpc/get_thread_list")?;
        let params = json!({
            "page_number": page,
            "page_size": page_size,
            "p_sort_option": sort_key,
            "p_category_id_filter": category_id,
        });
        let response = self
            .authed(self.client.post(url).json(&params))
            .send()?
            .error_for_status()?;
        let items: Vec<Thread> = response.json()?;
        let total_pages = items.first().and_then(|t| t.total_pages).unwrap_or(1);
        Ok(ThreadPage { items, total_pages })
    }

    fn recent_threads(&self, limit: u32) -> Result<Vec<Thread>> {
        let mut url = self.rest_url("threads")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc")
            .append_pair("limit", &limit.to_string());
        let response = self.authed(self.client.get(url)).send()?.error_for_status()?;
        Ok(response.json()?)
    }

    fn get_thread(&self, id: &str) -> Result<Thread> {
        let mut url = self.rest_url("threads")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", "*");
        let response = self.authed(self.client.get(url)).send()?.error_for_status()?;
        let mut rows: Vec<Thread> = response.json()?;
        rows.pop()
            .with_context(|| format!("thread {id} not found"))
    }

    fn create_thread(&self, input: &CreateThreadInput) -> Result<Thread> {
        let url = self.rest_url("threads")?;
        let response = self
            .authed(self.client.post(url).json(input))
            .header("Prefer", "return=representation")
            .send()?
            .error_for_status()?;
        let mut rows: Vec<Thread> = response.json()?;
        rows.pop().context("insert returned no row")
    }

    fn update_thread(&self, id: &str, input: &UpdateThreadInput) -> Result<()> {
        let mut url = self.rest_url("threads")?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.authed(self.client.patch(url).json(input))
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn delete_thread(&self, id: &str) -> Result<()> {
        let mut url = self.rest_url("threads")?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.authed(self.client.delete(url)).send()?.error_for_status()?;
        Ok(())
    }

    fn list_replies(&self, thread_id: &str) -> Result<Vec<Reply>> {
        let url = self.rest_url("rpc/get_replies_for_thread")?;
        let response = self
            .authed(self.client.post(url).json(&json!({ "p_thread_id": thread_id })))
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    fn create_reply(&self, input: &CreateReplyInput) -> Result<Reply> {
        let url = self.rest_url("thread_replies")?;
        let response = self
            .authed(self.client.post(url).json(input))
            .header("Prefer", "return=representation")
            .send()?
            .error_for_status()?;
        let mut rows: Vec<Reply> = response.json()?;
        rows.pop().context("insert returned no row")
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut url = self.rest_url("forum_categories")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "order_index");
        let response = self.authed(self.client.get(url)).send()?.error_for_status()?;
        Ok(response.json()?)
    }

    fn forum_stats(&self) -> Result<ForumStats> {
        let url = self.rest_url("rpc/get_forum_stats")?;
        let response = self
            .authed(self.client.post(url).json(&json!({})))
            .send()?
            .error_for_status()?;
        let mut rows: Vec<ForumStats> = response.json()?;
        Ok(rows.pop().unwrap_or_default())
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("https://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    // Validate once
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}
