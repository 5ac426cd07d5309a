use log::warn;

use crate::categories::CategoryResolver;
use crate::render::{FormScope, Notice};

use super::messages::AppMessage;
use super::state::ViewState;
use super::{tasks, ForumApp};

impl ForumApp {
    pub(super) fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::CategoriesLoaded(result) => match result {
                Ok(categories) => {
                    self.categories = CategoryResolver::from_categories(categories);
                }
                Err(err) => {
                    warn!("failed to load categories: {err:#}");
                    self.notify(Notice::error("Could not load forum categories."));
                }
            },

            AppMessage::ThreadsLoaded { seq, result } => {
                if seq != self.listing_seq {
                    // A newer reload with the current filters is already in
                    // flight; this result would overwrite it with stale rows.
                    return;
                }
                self.threads_loading = false;
                match result {
                    Ok(page) => {
                        self.threads = page.items;
                        self.total_pages = page.total_pages.max(1);
                        self.threads_error = None;
                    }
                    Err(err) => {
                        self.threads_error = Some(format!("{err:#}"));
                        self.notify(Notice::error("Could not load threads. Please try again."));
                    }
                }
                self.render_list();
            }

            AppMessage::ThreadLoaded { thread_id, result } => {
                // A result for a thread the user already left is dropped.
                let ViewState::Detail(state) = &mut self.view else {
                    return;
                };
                if state.thread_id != thread_id {
                    return;
                }
                state.loading = false;
                match result {
                    Ok(thread) => {
                        state.thread = Some(thread);
                        state.error = None;
                        self.render_detail();
                    }
                    Err(err) => {
                        state.error = Some(format!("{err:#}"));
                        self.notify(Notice::error("Could not load the thread."));
                    }
                }
            }

            AppMessage::RepliesLoaded { thread_id, result } => {
                let ViewState::Detail(state) = &mut self.view else {
                    return;
                };
                if state.thread_id != thread_id {
                    return;
                }
                state.replies_loading = false;
                match result {
                    Ok(replies) => {
                        state.replies = replies;
                        self.render_detail();
                    }
                    Err(err) => {
                        warn!("failed to load replies for {thread_id}: {err:#}");
                        self.notify(Notice::error("Could not load replies."));
                    }
                }
            }

            AppMessage::ThreadCreated(result) => {
                // Guard drops before inspecting the result, so a failed
                // submission can be retried immediately.
                self.new_thread.submitting = false;
                match result {
                    Ok(thread) => {
                        self.new_thread.attachments.clear();
                        self.new_thread.error = None;
                        // Optimistic: show the new thread at the top right
                        // away, then reload page one for the authoritative
                        // ordering and page count.
                        self.threads.insert(0, thread);
                        self.render_list();
                        self.notify(Notice::success("Thread created successfully!"));
                        self.current_page = 1;
                        self.apply_filters();
                    }
                    Err(err) => {
                        let message = format!("Error creating thread: {err:#}");
                        self.new_thread.error = Some(message.clone());
                        self.notify(Notice::form_error(FormScope::NewThread, message));
                    }
                }
            }

            AppMessage::ThreadUpdated {
                thread_id,
                session,
                result,
            } => {
                let active = match &self.view {
                    ViewState::Detail(state) => {
                        state.thread_id == thread_id
                            && state.edit.as_ref().map(|e| e.session) == Some(session)
                    }
                    ViewState::List => false,
                };
                if !active {
                    // The session was cancelled or replaced while the
                    // workflow ran; its outcome no longer applies.
                    warn!("dropping stale update result for thread {thread_id}");
                    return;
                }
                if let ViewState::Detail(state) = &mut self.view {
                    if let Some(edit) = &mut state.edit {
                        edit.submitting = false;
                    }
                }
                match result {
                    Ok(()) => {
                        if let ViewState::Detail(state) = &mut self.view {
                            state.edit = None;
                            state.loading = true;
                        }
                        self.notify(Notice::success("Thread updated successfully!"));
                        // Re-fetch the authoritative record and refresh the
                        // listing cache behind it.
                        tasks::load_thread(self.store.clone(), self.tx.clone(), thread_id.clone());
                        tasks::load_replies(self.store.clone(), self.tx.clone(), thread_id);
                        self.apply_filters();
                    }
                    Err(err) => {
                        let message = format!("Error updating thread: {err:#}");
                        self.set_edit_error(Some(message.clone()));
                        self.notify(Notice::form_error(FormScope::EditThread, message));
                    }
                }
            }

            AppMessage::ThreadDeleted { thread_id, result } => match result {
                Ok(()) => {
                    self.threads.retain(|t| t.id != thread_id);
                    self.notify(Notice::success("Thread deleted."));
                    let viewing_deleted = matches!(
                        &self.view,
                        ViewState::Detail(state) if state.thread_id == thread_id
                    );
                    if viewing_deleted {
                        self.back_to_list();
                    } else {
                        self.render_list();
                    }
                }
                Err(err) => {
                    self.notify(Notice::error(format!("Error deleting thread: {err:#}")));
                }
            },

            AppMessage::ReplyCreated { thread_id, result } => {
                let ViewState::Detail(state) = &mut self.view else {
                    return;
                };
                if state.thread_id != thread_id {
                    return;
                }
                state.reply_form.submitting = false;
                match result {
                    Ok(_) => {
                        state.reply_form.error = None;
                        state.replies_loading = true;
                        // The flat ordered list and the reply counter both
                        // come back from the server.
                        tasks::load_replies(self.store.clone(), self.tx.clone(), thread_id.clone());
                        tasks::load_thread(self.store.clone(), self.tx.clone(), thread_id);
                        self.notify(Notice::success("Reply posted."));
                    }
                    Err(err) => {
                        let message = format!("Error posting reply: {err:#}");
                        state.reply_form.error = Some(message.clone());
                        self.notify(Notice::form_error(FormScope::Reply, message));
                    }
                }
            }

            AppMessage::StatsLoaded(result) => match result {
                Ok(stats) => self.stats = Some(stats),
                Err(err) => warn!("failed to load forum stats: {err:#}"),
            },
        }
    }
}
