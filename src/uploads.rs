use std::collections::HashSet;
use std::io::Cursor;

use chrono::Utc;
use image::ImageFormat;
use lazy_static::lazy_static;
use log::warn;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::error::ForumError;
use crate::storage::{MediaStorage, THREAD_IMAGES_BUCKET};

/// Per-thread attachment cap, shared by the create and edit forms.
pub const MAX_ATTACHMENTS: usize = 5;
/// Size ceiling for thread/reply images.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
/// Larger ceiling used by the game-catalog submission form collaborator.
pub const MAX_CATALOG_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Compression targets; best-effort only.
const MAX_DIMENSION: u32 = 1920;
const COMPRESS_THRESHOLD_BYTES: u64 = 1024 * 1024;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex");
}

/// Lifecycle of one staged attachment. `Committed`, `Rejected`, `Failed`,
/// and `Discarded` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentStatus {
    Selected,
    Validated,
    Compressed,
    CompressionSkipped,
    Uploading,
    Committed(String),
    Rejected(String),
    Failed(String),
    Discarded,
}

/// A file staged in a form session before it is durably uploaded. Owned by
/// the active create/edit session and discarded with it.
#[derive(Debug, Clone)]
pub struct PendingAttachment {
    pub id: Uuid,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub status: AttachmentStatus,
}

impl PendingAttachment {
    /// Validates type and size; a rejection leaves no state behind and the
    /// caller re-prompts.
    pub fn validated(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ForumError> {
        let file_name = file_name.into();
        let mime = mime_for_name(&file_name).ok_or_else(|| {
            ForumError::validation(format!(
                "Invalid file type: {file_name}. Only JPG, PNG, GIF allowed."
            ))
        })?;
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ForumError::validation(format!(
                "File too large: {file_name}. Max size is {} MB.",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            file_name,
            mime,
            bytes,
            status: AttachmentStatus::Validated,
        })
    }
}

fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Replaces everything outside `[A-Za-z0-9._-]` with underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name, "_");
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Collision-resistant object path: owner, monotonic timestamp, random
/// suffix, sanitized filename.
pub fn storage_object_path(owner_id: &str, file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!(
        "{owner_id}/{}-{suffix}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Bounds resolution and size before upload. Compression failure is
/// non-fatal: the caller falls back to the original bytes.
pub fn compress_image(file_name: &str, bytes: &[u8]) -> Option<Vec<u8>> {
    // Animated GIFs would be flattened by re-encoding; leave them alone.
    if mime_for_name(file_name) == Some("image/gif") {
        return None;
    }
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(err) => {
            warn!("could not decode {file_name} for compression: {err}");
            return None;
        }
    };
    let oversized_dims = img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION;
    if !oversized_dims && (bytes.len() as u64) <= COMPRESS_THRESHOLD_BYTES {
        return None;
    }
    let img = if oversized_dims {
        img.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        img
    };
    let format = match mime_for_name(file_name) {
        Some("image/png") => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };
    let mut out = Cursor::new(Vec::new());
    if let Err(err) = img.write_to(&mut out, format) {
        warn!("could not re-encode {file_name}: {err}");
        return None;
    }
    let out = out.into_inner();
    // Re-encoding can inflate small files; keep the smaller of the two.
    if out.len() < bytes.len() {
        Some(out)
    } else {
        None
    }
}

/// Compresses (best-effort), uploads, and resolves the durable URL for one
/// staged attachment, walking its status through the upload states. On
/// failure the submission halts; earlier commits from the same submission
/// are not rolled back.
pub fn commit_attachment(
    storage: &dyn MediaStorage,
    owner_id: &str,
    attachment: &mut PendingAttachment,
) -> Result<String, ForumError> {
    let payload = match compress_image(&attachment.file_name, &attachment.bytes) {
        Some(compressed) => {
            attachment.status = AttachmentStatus::Compressed;
            compressed
        }
        None => {
            attachment.status = AttachmentStatus::CompressionSkipped;
            attachment.bytes.clone()
        }
    };
    let path = storage_object_path(owner_id, &attachment.file_name);
    attachment.status = AttachmentStatus::Uploading;
    if let Err(err) = storage.upload(THREAD_IMAGES_BUCKET, &path, &payload, attachment.mime) {
        let message = format!("Failed to upload image {}: {err:#}", attachment.file_name);
        attachment.status = AttachmentStatus::Failed(message.clone());
        return Err(ForumError::Upload(message));
    }
    let url = storage.public_url(THREAD_IMAGES_BUCKET, &path);
    attachment.status = AttachmentStatus::Committed(url.clone());
    Ok(url)
}

/// The pending set owned by one form session.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    items: Vec<PendingAttachment>,
}

impl AttachmentSet {
    pub fn items(&self) -> &[PendingAttachment] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<PendingAttachment> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Adds a validated attachment iff `existing + pending < MAX_ATTACHMENTS`.
    /// The capacity error names exactly how many slots remain (possibly zero).
    pub fn enqueue(
        &mut self,
        attachment: PendingAttachment,
        existing: usize,
    ) -> Result<(), ForumError> {
        let occupied = existing + self.items.len();
        if occupied >= MAX_ATTACHMENTS {
            return Err(ForumError::Capacity {
                remaining: MAX_ATTACHMENTS.saturating_sub(occupied),
                max: MAX_ATTACHMENTS,
            });
        }
        self.items.push(attachment);
        Ok(())
    }

    /// Removes a staged attachment before commit. Discarding an id that is
    /// no longer present is a no-op.
    pub fn discard(&mut self, id: Uuid) {
        self.items.retain(|a| a.id != id);
    }
}

/// Diff state of an edit session: existing URLs kept or marked for removal
/// (reversible until submit) plus newly staged attachments.
///
/// `kept + removed_pending` always partitions the original image list, so
/// the combined count can never exceed what the thread started with plus
/// what capacity checks admitted.
#[derive(Debug, Clone, Default)]
pub struct EditDiff {
    original: Vec<String>,
    removed: HashSet<String>,
    pub added: AttachmentSet,
}

impl EditDiff {
    pub fn new(existing_urls: Vec<String>) -> Self {
        Self {
            original: existing_urls,
            removed: HashSet::new(),
            added: AttachmentSet::default(),
        }
    }

    /// Existing URLs not marked for removal, in their original order.
    pub fn kept(&self) -> Vec<String> {
        self.original
            .iter()
            .filter(|url| !self.removed.contains(*url))
            .cloned()
            .collect()
    }

    pub fn removed_pending(&self) -> Vec<String> {
        self.original
            .iter()
            .filter(|url| self.removed.contains(*url))
            .cloned()
            .collect()
    }

    pub fn is_marked_removed(&self, url: &str) -> bool {
        self.removed.contains(url)
    }

    /// Flips an existing image between kept and removed-pending. Reversible
    /// any number of times before submit. Unknown URLs are ignored.
    pub fn toggle_remove(&mut self, url: &str) {
        if !self.original.iter().any(|u| u == url) {
            return;
        }
        if !self.removed.remove(url) {
            self.removed.insert(url.to_string());
        }
    }

    pub fn kept_count(&self) -> usize {
        self.original.len() - self.removed.len()
    }

    /// Free slots given the combined capacity of kept and staged images.
    pub fn remaining_slots(&self) -> usize {
        MAX_ATTACHMENTS.saturating_sub(self.kept_count() + self.added.len())
    }

    /// Stages a new attachment against the combined capacity.
    pub fn enqueue(&mut self, attachment: PendingAttachment) -> Result<(), ForumError> {
        self.added.enqueue(attachment, self.kept_count())
    }

    /// The image list submitted to the database: kept originals followed by
    /// newly committed URLs, truncated to the cap.
    pub fn final_images(&self, committed_urls: &[String]) -> Vec<String> {
        let mut images = self.kept();
        images.extend(committed_urls.iter().cloned());
        images.truncate(MAX_ATTACHMENTS);
        images
    }
}
