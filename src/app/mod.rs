use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::warn;

use crate::api::ThreadStore;
use crate::categories::CategoryResolver;
use crate::identity::UserIdentity;
use crate::models::{CreateReplyInput, ForumStats, Thread};
use crate::render::{FormScope, Notice, Pagination, RenderSink};
use crate::storage::MediaStorage;
use crate::uploads::{EditDiff, PendingAttachment, MAX_ATTACHMENTS};

mod handlers;
mod messages;
mod state;
mod tasks;

pub use state::{
    DetailState, EditThreadState, NewThreadState, ReplyFormState, SortOption, ThreadForm,
    ViewState,
};

use tasks::{EditThreadJob, NewThreadJob};

/// Fixed listing page size.
pub const PAGE_SIZE: u32 = 10;

/// The forum content controller: owns listing/filter state, the active
/// detail view with its edit session, all form guards, and the channel the
/// background workflows report back on.
///
/// Single-threaded by design: the embedding page pumps
/// [`ForumApp::process_messages`] from its event loop, and every state
/// mutation happens on that thread. Workflows run on background threads and
/// only communicate through messages.
pub struct ForumApp {
    store: Arc<dyn ThreadStore>,
    storage: Arc<dyn MediaStorage>,
    renderer: Box<dyn RenderSink>,
    tx: Sender<messages::AppMessage>,
    rx: Receiver<messages::AppMessage>,

    identity: Option<UserIdentity>,
    categories: CategoryResolver,
    stats: Option<ForumStats>,

    // Listing state.
    threads: Vec<Thread>,
    threads_loading: bool,
    threads_error: Option<String>,
    /// Stamp of the most recent reload; results carrying an older stamp are
    /// discarded by the handler.
    listing_seq: u64,
    current_page: u32,
    total_pages: i64,
    sort: SortOption,
    category_filter: Option<String>,
    search_term: String,

    view: ViewState,
    new_thread: NewThreadState,
    edit_session_seq: u64,
}

impl ForumApp {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        storage: Arc<dyn MediaStorage>,
        renderer: Box<dyn RenderSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            store,
            storage,
            renderer,
            tx,
            rx,
            identity: None,
            categories: CategoryResolver::default(),
            stats: None,
            threads: Vec::new(),
            threads_loading: false,
            threads_error: None,
            listing_seq: 0,
            current_page: 1,
            total_pages: 1,
            sort: SortOption::default(),
            category_filter: None,
            search_term: String::new(),
            view: ViewState::List,
            new_thread: NewThreadState::default(),
            edit_session_seq: 0,
        };
        tasks::load_categories(app.store.clone(), app.tx.clone());
        tasks::load_stats(app.store.clone(), app.tx.clone());
        app.apply_filters();
        app
    }

    /// Drains pending workflow results and applies them. Called from the
    /// embedding page's event loop.
    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Change notification from the identity collaborator. Owner-only
    /// controls are re-evaluated by re-rendering both views.
    pub fn set_identity(&mut self, identity: Option<UserIdentity>) {
        self.identity = identity;
        self.render_list();
        self.render_detail();
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Whether the signed-in user owns `thread`. Gates *showing* edit and
    /// delete controls; the data service's row-level policies are the real
    /// enforcement on writes.
    pub fn can_modify(&self, thread: &Thread) -> bool {
        self.identity
            .as_ref()
            .map(|user| user.id == thread.user_id)
            .unwrap_or(false)
    }

    // ── Listing, filters, pagination ────────────────────────────────────

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn category_filter(&self) -> Option<&str> {
        self.category_filter.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn categories(&self) -> &CategoryResolver {
        &self.categories
    }

    pub fn stats(&self) -> Option<ForumStats> {
        self.stats
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.current_page = 1;
        self.apply_filters();
    }

    /// Filter control passes category display names; an unknown name clears
    /// the filter rather than blocking the listing.
    pub fn set_category_filter(&mut self, name: Option<&str>) {
        self.category_filter = match name {
            None | Some("") => None,
            Some(name) => match self.categories.resolve_id(name) {
                Ok(id) => Some(id.to_string()),
                Err(err) => {
                    warn!("cannot filter by category: {err}");
                    None
                }
            },
        };
        self.current_page = 1;
        self.apply_filters();
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into().trim().to_string();
        self.current_page = 1;
        self.apply_filters();
    }

    /// Page-link navigation; the only state change that does not reset the
    /// page number.
    pub fn open_page(&mut self, page: u32) {
        if page < 1 || page == self.current_page {
            return;
        }
        self.current_page = page;
        self.apply_filters();
    }

    /// Single reload entry point; every filter, sort, and page mutation
    /// funnels through here. Each reload carries a fresh stamp and the
    /// handler drops superseded results, so a mutation landing while a load
    /// is in flight re-invokes the store instead of being lost.
    pub fn apply_filters(&mut self) {
        self.listing_seq += 1;
        self.threads_loading = true;
        self.threads_error = None;
        tasks::load_threads(
            self.store.clone(),
            self.tx.clone(),
            self.listing_seq,
            self.current_page,
            PAGE_SIZE,
            self.sort,
            self.category_filter.clone(),
        );
    }

    // ── New-thread form ─────────────────────────────────────────────────

    pub fn new_thread_form(&self) -> &NewThreadState {
        &self.new_thread
    }

    /// Stages files from the new-thread form's file input, validating each
    /// and enforcing the attachment cap.
    pub fn add_new_thread_files(&mut self, files: Vec<(String, Vec<u8>)>) {
        let space = MAX_ATTACHMENTS.saturating_sub(self.new_thread.attachments.len());
        if files.len() > space {
            let message =
                format!("You can only add {space} more image(s). Max total is {MAX_ATTACHMENTS}.");
            self.new_thread.error = Some(message.clone());
            self.notify(Notice::form_error(FormScope::NewThread, message));
            return;
        }
        for (name, bytes) in files {
            match PendingAttachment::validated(name, bytes) {
                Ok(attachment) => {
                    if let Err(err) = self.new_thread.attachments.enqueue(attachment, 0) {
                        let message = err.to_string();
                        self.new_thread.error = Some(message.clone());
                        self.notify(Notice::form_error(FormScope::NewThread, message));
                        break;
                    }
                }
                Err(err) => {
                    // A bad file does not block the rest of the selection.
                    let message = err.to_string();
                    self.new_thread.error = Some(message.clone());
                    self.notify(Notice::form_error(FormScope::NewThread, message));
                }
            }
        }
    }

    pub fn discard_new_thread_attachment(&mut self, id: uuid::Uuid) {
        self.new_thread.attachments.discard(id);
    }

    /// Submits the new-thread form. Category resolution happens here, before
    /// any upload or write; the in-flight guard rejects a repeat submit
    /// without touching the network.
    pub fn submit_new_thread(&mut self, form: ThreadForm) {
        if self.new_thread.submitting {
            self.notify(Notice::form_error(
                FormScope::NewThread,
                "Submission in progress, please wait...",
            ));
            return;
        }
        let Some(identity) = self.identity.clone() else {
            self.notify(Notice::error("Please sign in to create a thread."));
            return;
        };
        let title = form.title.trim().to_string();
        let content = form.content.trim().to_string();
        if title.is_empty() || content.is_empty() || form.category_name.is_empty() {
            let message = "Title, content, and category are required.".to_string();
            self.new_thread.error = Some(message.clone());
            self.notify(Notice::form_error(FormScope::NewThread, message));
            return;
        }
        let category_id = match self.categories.resolve_id(&form.category_name) {
            Ok(id) => id.to_string(),
            Err(err) => {
                let message = format!("Invalid category selected: {err}");
                self.new_thread.error = Some(message.clone());
                self.notify(Notice::form_error(FormScope::NewThread, message));
                return;
            }
        };

        self.new_thread.submitting = true;
        self.new_thread.error = None;
        let job = NewThreadJob {
            user_id: identity.id.clone(),
            author_username: identity.display_name().to_string(),
            title,
            content,
            category_id,
            tags: Thread::parse_tags(&form.tags_input),
            attachments: self.new_thread.attachments.items().to_vec(),
        };
        tasks::create_thread(self.store.clone(), self.storage.clone(), self.tx.clone(), job);
    }

    // ── Detail view ─────────────────────────────────────────────────────

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Enters the detail view, fetching the authoritative record and its
    /// replies; any cached listing copy is ignored.
    pub fn open_thread(&mut self, thread_id: &str) {
        self.view = ViewState::Detail(DetailState::new(thread_id));
        tasks::load_thread(self.store.clone(), self.tx.clone(), thread_id.to_string());
        tasks::load_replies(self.store.clone(), self.tx.clone(), thread_id.to_string());
    }

    /// Leaves the detail view, dropping the active thread and any edit diff.
    /// Results from the abandoned view arriving later are ignored by the
    /// handlers.
    pub fn back_to_list(&mut self) {
        self.view = ViewState::List;
        self.apply_filters();
        self.render_list();
    }

    pub fn submit_reply(&mut self, content: &str) {
        let thread_id = match &self.view {
            ViewState::Detail(state) => {
                if state.reply_form.submitting {
                    self.notify(Notice::form_error(
                        FormScope::Reply,
                        "Reply already in progress, please wait...",
                    ));
                    return;
                }
                state.thread_id.clone()
            }
            ViewState::List => return,
        };
        let Some(identity) = self.identity.clone() else {
            self.notify(Notice::error("You must be signed in to reply."));
            return;
        };
        let content = content.trim().to_string();
        if content.is_empty() {
            self.notify(Notice::form_error(
                FormScope::Reply,
                "Reply content cannot be empty.",
            ));
            return;
        }
        if let ViewState::Detail(state) = &mut self.view {
            state.reply_form.submitting = true;
            state.reply_form.error = None;
        }
        tasks::create_reply(
            self.store.clone(),
            self.tx.clone(),
            CreateReplyInput {
                thread_id,
                user_id: identity.id.clone(),
                author_username: identity.display_name().to_string(),
                content,
                parent_id: None,
            },
        );
    }

    /// Deletes the open thread. The page chrome is responsible for the
    /// irreversibility confirmation before calling this.
    pub fn delete_current_thread(&mut self) {
        let thread_id = match &self.view {
            ViewState::Detail(state) => state.thread_id.clone(),
            ViewState::List => {
                self.notify(Notice::error("No thread selected to delete."));
                return;
            }
        };
        tasks::delete_thread(self.store.clone(), self.tx.clone(), thread_id);
    }

    /// Deliberately absent capability: the controls exist but the operation
    /// is not implemented.
    pub fn edit_reply(&mut self, _reply_id: &str) {
        self.notify(Notice::error("Edit reply functionality not yet implemented."));
    }

    /// Deliberately absent capability, like [`ForumApp::edit_reply`].
    pub fn delete_reply(&mut self, _reply_id: &str) {
        self.notify(Notice::error("Delete reply functionality not yet implemented."));
    }

    // ── Edit session ────────────────────────────────────────────────────

    /// Opens an edit session for the open thread: pre-populates the form,
    /// resolves the category id back to its display name, and seeds the
    /// diff with every current attachment kept.
    pub fn open_edit(&mut self) {
        let thread = match &self.view {
            ViewState::Detail(state) => state.thread.clone(),
            ViewState::List => None,
        };
        let Some(thread) = thread else {
            self.notify(Notice::error("No thread selected for editing."));
            return;
        };
        if !self.can_modify(&thread) {
            self.notify(Notice::error("Only the thread owner can edit it."));
            return;
        }
        let category_name = match thread.category.as_deref() {
            Some(id) => match self.categories.resolve_name(id) {
                Ok(name) => name.to_string(),
                Err(err) => {
                    warn!("could not resolve category name for edit form: {err}");
                    String::new()
                }
            },
            None => String::new(),
        };
        self.edit_session_seq += 1;
        let edit = EditThreadState {
            session: self.edit_session_seq,
            prefill: ThreadForm {
                title: thread.title.clone(),
                content: thread.content.clone(),
                category_name,
                tags_input: thread.tags.join(", "),
            },
            diff: EditDiff::new(thread.images.clone()),
            submitting: false,
            error: None,
        };
        if let ViewState::Detail(state) = &mut self.view {
            state.edit = Some(edit);
        }
    }

    /// Ends the edit session without submitting. In-flight uploads from the
    /// session keep running but their results are ignored: the session id
    /// they carry no longer matches.
    pub fn cancel_edit(&mut self) {
        if let ViewState::Detail(state) = &mut self.view {
            state.edit = None;
        }
    }

    /// Reversible remove toggle for an existing image.
    pub fn toggle_edit_image_removed(&mut self, url: &str) {
        if let ViewState::Detail(state) = &mut self.view {
            if let Some(edit) = &mut state.edit {
                edit.diff.toggle_remove(url);
            }
        }
    }

    /// Stages new files against the combined capacity of kept and already
    /// staged images.
    pub fn add_edit_files(&mut self, files: Vec<(String, Vec<u8>)>) {
        let space = match &self.view {
            ViewState::Detail(state) => match &state.edit {
                Some(edit) => edit.diff.remaining_slots(),
                None => return,
            },
            ViewState::List => return,
        };
        if files.len() > space {
            let message =
                format!("You can only add {space} more image(s). Max total is {MAX_ATTACHMENTS}.");
            self.set_edit_error(Some(message.clone()));
            self.notify(Notice::form_error(FormScope::EditThread, message));
            return;
        }
        for (name, bytes) in files {
            let staged = PendingAttachment::validated(name, bytes).and_then(|attachment| {
                if let ViewState::Detail(state) = &mut self.view {
                    if let Some(edit) = &mut state.edit {
                        return edit.diff.enqueue(attachment);
                    }
                }
                Ok(())
            });
            if let Err(err) = staged {
                let message = err.to_string();
                self.set_edit_error(Some(message.clone()));
                self.notify(Notice::form_error(FormScope::EditThread, message));
            }
        }
    }

    pub fn discard_edit_attachment(&mut self, id: uuid::Uuid) {
        if let ViewState::Detail(state) = &mut self.view {
            if let Some(edit) = &mut state.edit {
                edit.diff.added.discard(id);
            }
        }
    }

    /// Submits the edit session: resolve the category (abort first), upload
    /// staged files, best-effort delete removed storage objects, then issue
    /// a single update. Guarded against double submission.
    pub fn submit_edit(&mut self, form: ThreadForm) {
        let snapshot = match &self.view {
            ViewState::Detail(state) => state.edit.as_ref().map(|edit| {
                (
                    state.thread_id.clone(),
                    edit.session,
                    edit.submitting,
                    edit.diff.kept(),
                    edit.diff.removed_pending(),
                    edit.diff.added.items().to_vec(),
                )
            }),
            ViewState::List => None,
        };
        let Some((thread_id, session, submitting, kept, removed, attachments)) = snapshot else {
            self.notify(Notice::error("No thread selected or no active edit."));
            return;
        };
        if submitting {
            self.notify(Notice::form_error(
                FormScope::EditThread,
                "Update in progress, please wait...",
            ));
            return;
        }
        let Some(identity) = self.identity.clone() else {
            self.notify(Notice::error("Please sign in to edit a thread."));
            return;
        };
        let title = form.title.trim().to_string();
        let content = form.content.trim().to_string();
        if title.is_empty() || content.is_empty() || form.category_name.is_empty() {
            let message = "Title, content, and category are required.".to_string();
            self.set_edit_error(Some(message.clone()));
            self.notify(Notice::form_error(FormScope::EditThread, message));
            return;
        }
        let category_id = match self.categories.resolve_id(&form.category_name) {
            Ok(id) => id.to_string(),
            Err(err) => {
                let message = format!("Invalid category selected: {err}");
                self.set_edit_error(Some(message.clone()));
                self.notify(Notice::form_error(FormScope::EditThread, message));
                return;
            }
        };
        // The capacity invariant must hold before submission; a violation is
        // rejected without any network call.
        if kept.len() + attachments.len() > MAX_ATTACHMENTS {
            let message =
                format!("A thread can have at most {MAX_ATTACHMENTS} images; remove some first.");
            self.set_edit_error(Some(message.clone()));
            self.notify(Notice::form_error(FormScope::EditThread, message));
            return;
        }

        if let ViewState::Detail(state) = &mut self.view {
            if let Some(edit) = &mut state.edit {
                edit.submitting = true;
                edit.error = None;
            }
        }
        let job = EditThreadJob {
            thread_id,
            session,
            owner_id: identity.id,
            title,
            content,
            category_id,
            tags: Thread::parse_tags(&form.tags_input),
            kept_urls: kept,
            removed_urls: removed,
            attachments,
        };
        tasks::update_thread(self.store.clone(), self.storage.clone(), self.tx.clone(), job);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn notify(&mut self, notice: Notice) {
        self.renderer.notice(&notice);
    }

    fn render_list(&mut self) {
        let pagination = Pagination {
            current_page: self.current_page,
            total_pages: self.total_pages,
        };
        if self.search_term.is_empty() {
            self.renderer.thread_list(&self.threads, pagination);
        } else {
            // The listing procedure has no search parameter; the term is a
            // client-side filter over the loaded page.
            let needle = self.search_term.to_lowercase();
            let filtered: Vec<Thread> = self
                .threads
                .iter()
                .filter(|t| {
                    t.title.to_lowercase().contains(&needle)
                        || t.content.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            self.renderer.thread_list(&filtered, pagination);
        }
    }

    fn render_detail(&mut self) {
        if let ViewState::Detail(state) = &self.view {
            if let Some(thread) = &state.thread {
                self.renderer.thread_detail(thread, &state.replies);
            }
        }
    }

    fn set_edit_error(&mut self, error: Option<String>) {
        if let ViewState::Detail(state) = &mut self.view {
            if let Some(edit) = &mut state.edit {
                edit.error = error;
            }
        }
    }
}
