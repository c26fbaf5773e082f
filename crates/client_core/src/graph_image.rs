//! Rendered knowledge-graph image and the slot that owns its display handle.
//!
//! A front end turns image bytes into something displayable (a GPU texture,
//! a temp file, ...). That handle has a lifetime: the slot keeps exactly one
//! alive and releases the previous one when a new image replaces it.

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl GraphImage {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the reported content type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        let content_type = self
            .content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        match content_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "png",
        }
    }
}

pub trait ImageHandleFactory {
    type Handle;
    type Error: std::fmt::Display;

    fn create(&mut self, image: &GraphImage) -> Result<Self::Handle, Self::Error>;
    fn release(&mut self, handle: Self::Handle);
}

pub struct GraphImageSlot<F: ImageHandleFactory> {
    factory: F,
    active: Option<F::Handle>,
    replacements: u64,
}

impl<F: ImageHandleFactory> GraphImageSlot<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            active: None,
            replacements: 0,
        }
    }

    /// Creates a handle for `image` and makes it the active one. The previous
    /// handle is released only once the new one exists, so a bad image never
    /// blanks the panel.
    pub fn show(&mut self, image: &GraphImage) -> Result<&F::Handle, F::Error> {
        let handle = self.factory.create(image).map_err(|err| {
            warn!(bytes = image.len(), error = %err, "graph image: failed to create display handle");
            err
        })?;
        if let Some(previous) = self.active.take() {
            self.factory.release(previous);
            self.replacements += 1;
            debug!(replacements = self.replacements, "graph image: released previous handle");
        }
        Ok(self.active.insert(handle))
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.active.take() {
            self.factory.release(previous);
        }
    }

    pub fn active(&self) -> Option<&F::Handle> {
        self.active.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }
}

impl<F: ImageHandleFactory> Drop for GraphImageSlot<F> {
    fn drop(&mut self) {
        self.clear();
    }
}
