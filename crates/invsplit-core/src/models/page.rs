//! Page, identifier and bucket key types shared by the engine.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize, Serializer};

use crate::regions::{locate, Region, RegionKind};

/// A rasterized page. The engine only reads it.
#[derive(Debug, Clone)]
pub struct Page {
    image: DynamicImage,
}

impl Page {
    /// Wrap a rasterized page image.
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Cut out the region of the given kind.
    pub fn crop(&self, kind: RegionKind) -> Crop {
        let region = locate(self.width(), self.height(), kind);
        let image = self
            .image
            .crop_imm(region.x0, region.y0, region.width(), region.height());

        Crop {
            kind,
            region,
            image,
        }
    }
}

impl From<DynamicImage> for Page {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// A cropped sub-image handed to a decoder.
#[derive(Debug, Clone)]
pub struct Crop {
    /// Which page region this crop covers.
    pub kind: RegionKind,
    /// Pixel rectangle on the source page.
    pub region: Region,
    /// Cropped pixels.
    pub image: DynamicImage,
}

/// A normalized invoice identifier.
///
/// Whitespace and hyphens are stripped, so `206-581544` and `206581544`
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize a raw value, returning `None` when nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    /// The normalized value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false; normalization never yields an empty identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of an output bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Pages belonging to a detected invoice.
    Identifier(Identifier),
    /// Pages seen before any identifier was determined.
    Unassigned,
    /// Pages whose processing failed.
    Error,
}

impl BucketKey {
    /// Sentinel label for [`BucketKey::Unassigned`].
    pub const UNASSIGNED: &'static str = "UNASSIGNED";
    /// Sentinel label for [`BucketKey::Error`].
    pub const ERROR: &'static str = "ERROR";

    /// Check if this is a sentinel key.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, BucketKey::Identifier(_))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Identifier(id) => write!(f, "{}", id),
            BucketKey::Unassigned => f.write_str(Self::UNASSIGNED),
            BucketKey::Error => f.write_str(Self::ERROR),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
