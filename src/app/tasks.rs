use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use log::{error, warn};

use crate::api::ThreadStore;
use crate::models::{CreateReplyInput, CreateThreadInput, ThreadPage, UpdateThreadInput};
use crate::storage::{storage_path_from_url, MediaStorage, THREAD_IMAGES_BUCKET};
use crate::uploads::{commit_attachment, PendingAttachment, MAX_ATTACHMENTS};

use super::messages::AppMessage;
use super::state::SortOption;

pub(super) type Store = Arc<dyn ThreadStore>;
pub(super) type Media = Arc<dyn MediaStorage>;

fn send(tx: &Sender<AppMessage>, message: AppMessage) {
    if tx.send(message).is_err() {
        error!("controller channel closed; dropping workflow result");
    }
}

pub(super) fn load_categories(store: Store, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = store.list_categories();
        send(&tx, AppMessage::CategoriesLoaded(result));
    });
}

/// Loads one listing page. When the paginated procedure fails the workflow
/// degrades to the direct limited table read (creation descending, a single
/// page) instead of surfacing an error; only a double failure is reported.
pub(super) fn load_threads(
    store: Store,
    tx: Sender<AppMessage>,
    seq: u64,
    page: u32,
    page_size: u32,
    sort: SortOption,
    category_id: Option<String>,
) {
    thread::spawn(move || {
        let result = store
            .thread_page(page, page_size, sort.rpc_key(), category_id.as_deref())
            .map(|mut page| {
                // The procedure already orders rows; re-applying the
                // comparator keeps the display stable if it ever drifts.
                page.items.sort_by(|a, b| sort.compare(a, b));
                page
            })
            .or_else(|err| {
                warn!("thread listing procedure failed ({err:#}); using fallback query");
                store.recent_threads(page_size).map(|items| ThreadPage {
                    items,
                    total_pages: 1,
                })
            });
        send(&tx, AppMessage::ThreadsLoaded { seq, result });
    });
}

pub(super) fn load_thread(store: Store, tx: Sender<AppMessage>, thread_id: String) {
    thread::spawn(move || {
        let result = store.get_thread(&thread_id);
        send(&tx, AppMessage::ThreadLoaded { thread_id, result });
    });
}

pub(super) fn load_replies(store: Store, tx: Sender<AppMessage>, thread_id: String) {
    thread::spawn(move || {
        let result = store.list_replies(&thread_id);
        send(&tx, AppMessage::RepliesLoaded { thread_id, result });
    });
}

pub(super) fn load_stats(store: Store, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = store.forum_stats();
        send(&tx, AppMessage::StatsLoaded(result));
    });
}

/// Everything a create submission needs, captured before the workflow
/// starts. The category id is already resolved; resolution failures abort
/// in the controller before any of this runs.
pub(super) struct NewThreadJob {
    pub user_id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub attachments: Vec<PendingAttachment>,
}

pub(super) fn create_thread(store: Store, media: Media, tx: Sender<AppMessage>, job: NewThreadJob) {
    thread::spawn(move || {
        let mut image_urls = Vec::with_capacity(job.attachments.len());
        let mut attachments = job.attachments;
        for attachment in &mut attachments {
            // First failure halts the submission; files committed before it
            // stay in storage (accepted cost, no rollback).
            match commit_attachment(media.as_ref(), &job.user_id, attachment) {
                Ok(url) => image_urls.push(url),
                Err(err) => {
                    send(&tx, AppMessage::ThreadCreated(Err(err.into())));
                    return;
                }
            }
        }
        let input = CreateThreadInput {
            user_id: job.user_id,
            author_username: job.author_username,
            title: job.title,
            content: job.content,
            category: job.category_id,
            tags: job.tags,
            images: image_urls,
        };
        send(&tx, AppMessage::ThreadCreated(store.create_thread(&input)));
    });
}

pub(super) struct EditThreadJob {
    pub thread_id: String,
    pub session: u64,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub kept_urls: Vec<String>,
    pub removed_urls: Vec<String>,
    pub attachments: Vec<PendingAttachment>,
}

pub(super) fn update_thread(store: Store, media: Media, tx: Sender<AppMessage>, job: EditThreadJob) {
    thread::spawn(move || {
        let thread_id = job.thread_id.clone();
        let session = job.session;
        let result = run_update(store, media, job);
        send(
            &tx,
            AppMessage::ThreadUpdated {
                thread_id,
                session,
                result,
            },
        );
    });
}

fn run_update(store: Store, media: Media, job: EditThreadJob) -> Result<(), anyhow::Error> {
    let mut new_urls = Vec::with_capacity(job.attachments.len());
    let mut attachments = job.attachments;
    for attachment in &mut attachments {
        new_urls.push(commit_attachment(media.as_ref(), &job.owner_id, attachment)?);
    }

    // Storage removal is best-effort: orphaned objects are preferable to a
    // lost database update.
    let removable: Vec<String> = job
        .removed_urls
        .iter()
        .filter_map(|url| match storage_path_from_url(url, THREAD_IMAGES_BUCKET) {
            Some(path) => Some(path),
            None => {
                warn!("could not derive storage path from {url}; skipping removal");
                None
            }
        })
        .collect();
    if !removable.is_empty() {
        if let Err(err) = media.remove(THREAD_IMAGES_BUCKET, &removable) {
            warn!("failed to remove {} storage object(s): {err:#}", removable.len());
        }
    }

    let mut images = job.kept_urls;
    images.extend(new_urls);
    images.truncate(MAX_ATTACHMENTS);

    let input = UpdateThreadInput {
        title: job.title,
        content: job.content,
        category: job.category_id,
        tags: job.tags,
        images,
        updated_at: Utc::now().to_rfc3339(),
    };
    store.update_thread(&job.thread_id, &input)
}

pub(super) fn delete_thread(store: Store, tx: Sender<AppMessage>, thread_id: String) {
    thread::spawn(move || {
        let result = store.delete_thread(&thread_id);
        send(&tx, AppMessage::ThreadDeleted { thread_id, result });
    });
}

pub(super) fn create_reply(store: Store, tx: Sender<AppMessage>, input: CreateReplyInput) {
    thread::spawn(move || {
        let thread_id = input.thread_id.clone();
        let result = store.create_reply(&input);
        send(&tx, AppMessage::ReplyCreated { thread_id, result });
    });
}
