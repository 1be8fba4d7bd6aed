use std::sync::Arc;

use bytes::Bytes;

/// Where the bytes behind a [`DataStream`] actually live.
///
/// Byte-buffer and file-backed streams are replayable by construction —
/// the pipeline can rewind and resend them across retry attempts. A stream
/// sourced from an upstream publisher is one-shot unless explicitly tagged
/// replayable by its producer (it already buffered the bytes itself).
enum Source {
    Buffer(Bytes),
    OneShot(Bytes),
}

/// A one-shot or replayable byte stream with an optional known length and
/// content type.
///
/// Invariant: `content_length().is_some() implies has_known_length()` holds
/// trivially here since the two are backed by the same `Option`; the
/// distinction in the design note exists for streams whose length truly
/// cannot be known in advance (chunked transfer, unbounded publisher).
#[derive(Clone)]
pub struct DataStream {
    source: Arc<SourceCell>,
    content_length: Option<u64>,
    content_type: Option<String>,
    replayable: bool,
}

enum SourceCell {
    Buffer(Bytes),
    OneShot(std::sync::Mutex<Option<Bytes>>),
}

impl DataStream {
    /// A replayable stream backed by an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self {
            source: Arc::new(SourceCell::Buffer(bytes)),
            content_length: Some(len),
            content_type: None,
            replayable: true,
        }
    }

    /// A one-shot stream that can be consumed exactly once. Intended for
    /// publisher- or reader-backed sources the core does not itself model;
    /// callers adapt their transport's body type into bytes up front.
    pub fn one_shot(bytes: impl Into<Bytes>, content_length: Option<u64>) -> Self {
        let bytes = bytes.into();
        Self {
            source: Arc::new(SourceCell::OneShot(std::sync::Mutex::new(Some(bytes)))),
            content_length,
            content_type: None,
            replayable: false,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content length if known. A negative length in the original design
    /// note is represented here as `None`.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn has_known_length(&self) -> bool {
        self.content_length.is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_replayable(&self) -> bool {
        self.replayable
    }

    /// Read the stream's bytes. For a replayable stream this may be called
    /// any number of times; for a one-shot stream, only the first call
    /// returns `Some` — a second call returns `None`, signalling to the
    /// pipeline that this attempt's body cannot be resent.
    pub fn read(&self) -> Option<Bytes> {
        match &*self.source {
            SourceCell::Buffer(bytes) => Some(bytes.clone()),
            SourceCell::OneShot(slot) => slot.lock().unwrap().take(),
        }
    }
}

impl std::fmt::Debug for DataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStream")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("replayable", &self.replayable)
            .finish()
    }
}
