//! Common type definitions for hushbox.
//!
//! Provides the enums that select what a form does and where its request goes.
//!
//! # Overview
//!
//! - [`Operation`]: Distinguishes between hiding (encode) and extracting (decode)
//! - [`Medium`]: The kind of carrier file, image or audio
//! - [`Route`]: The endpoint, multipart field and picker filter for an `(Operation, Medium)` pair

use std::fmt::{Display, Formatter, Result};

use strum::{EnumIter, IntoStaticStr};

/// Represents the direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum Operation {
    /// Hide a message inside a carrier, producing a new carrier file.
    Encode,

    /// Extract a previously hidden message from a carrier.
    Decode,
}

impl Operation {
    /// Array containing all operations for iteration.
    pub const ALL: &'static [Self] = &[Self::Encode, Self::Decode];

    /// Returns a human-readable label for the operation.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encode => "Hide a message",
            Self::Decode => "Reveal a message",
        }
    }

    /// Returns a progress label for the operation.
    #[inline]
    pub fn progress_label(self) -> &'static str {
        match self {
            Self::Encode => "Encrypting...",
            Self::Decode => "Decrypting...",
        }
    }

    /// Whether the operation carries a message to hide.
    #[inline]
    pub fn needs_message(self) -> bool {
        matches!(self, Self::Encode)
    }
}

impl Display for Operation {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// The kind of carrier a form works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum Medium {
    /// A raster image. Encoded output is always PNG.
    Image,

    /// A WAV recording.
    Audio,
}

impl Medium {
    /// Array containing all media for iteration.
    pub const ALL: &'static [Self] = &[Self::Image, Self::Audio];

    /// Returns a human-readable label for the medium.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Audio => "Audio",
        }
    }

    /// Whether a selected file of this medium gets a visual preview.
    #[inline]
    pub fn has_visual_preview(self) -> bool {
        matches!(self, Self::Image)
    }

    /// Formats the service is known to accept, for prompts.
    #[inline]
    pub fn supported_formats(self) -> &'static str {
        match self {
            Self::Image => "PNG, JPG",
            Self::Audio => "WAV",
        }
    }

    /// Infers the medium from a MIME type's top-level type.
    pub fn for_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next().map(str::trim) {
            Some("image") => Some(Self::Image),
            Some("audio") => Some(Self::Audio),
            _ => None,
        }
    }
}

impl Display for Medium {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// Where a request for an `(Operation, Medium)` pair goes and what it looks like.
///
/// The mapping is total: every pair has exactly one route, resolved at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Stable identifier, used in logs.
    pub name: &'static str,

    /// Endpoint path relative to the service base address.
    pub path: &'static str,

    /// Multipart field carrying the carrier file.
    pub file_field: &'static str,

    /// MIME filter offered by the file picker.
    pub accept: &'static str,
}

impl Route {
    /// Resolves the route for an operation on a medium.
    pub const fn of(operation: Operation, medium: Medium) -> Self {
        match (operation, medium) {
            (Operation::Encode, Medium::Image) => Self { name: "encode-image", path: "/api/encode", file_field: "image", accept: "image/*" },
            (Operation::Encode, Medium::Audio) => Self { name: "encode-audio", path: "/api/encode-audio", file_field: "audio", accept: "audio/*" },
            (Operation::Decode, Medium::Image) => Self { name: "decode-image", path: "/api/decode", file_field: "image", accept: "image/png" },
            (Operation::Decode, Medium::Audio) => Self { name: "decode-audio", path: "/api/decode-audio", file_field: "audio", accept: "audio/wav" },
        }
    }

    /// Checks a MIME type against the picker filter.
    ///
    /// `image/*` style filters match on the top-level type, anything else must match
    /// exactly. `audio/x-wav` is treated as an alias of `audio/wav`.
    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.trim().to_ascii_lowercase();
        match self.accept.strip_suffix("/*") {
            Some(top) => mime.split('/').next() == Some(top),
            None => mime == self.accept || (self.accept == "audio/wav" && mime == "audio/x-wav"),
        }
    }
}

/// Endpoint for sensitive text analysis.
pub const ANALYZE_PATH: &str = "/api/analyze";
