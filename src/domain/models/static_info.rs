//! Static registry: binary images and instruction locations.
//!
//! Populated by the instrumentation engine and read-only for the duration
//! of a campaign. Everything else in the engine refers to code locations by
//! [`InstId`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Identifier of a loaded binary image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an instruction (code location).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstId(pub u32);

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A binary image (executable or shared library).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image id.
    pub id: ImageId,
    /// Full path as loaded.
    pub name: String,
}

impl Image {
    /// File name component of the image path.
    pub fn basename(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
    }

    /// Compact name used in tables: the basename cut at the first `.` or
    /// `-`, whichever yields the shorter name.
    pub fn short_name(&self) -> &str {
        let base = self.basename();
        let by_dot = base.split('.').next().unwrap_or(base);
        let by_dash = base.split('-').next().unwrap_or(base);
        if by_dot.len() < by_dash.len() {
            by_dot
        } else {
            by_dash
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<2} {}", self.id.0, self.name)
    }
}

/// Source-level debug information for an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Source file.
    pub file_name: String,
    /// Line within it.
    pub line: u32,
}

/// A code location: an offset within an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inst {
    /// Instruction id.
    pub id: InstId,
    /// Image containing it.
    pub image_id: ImageId,
    /// Offset from the image base.
    pub offset: u64,
    /// Source location, when the image has debug info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

/// Persisted shape of the static registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInfoSnapshot {
    /// Loaded images.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Registered instructions.
    #[serde(default)]
    pub insts: Vec<Inst>,
}

/// Id-indexed lookup table of images and instructions.
#[derive(Debug, Clone, Default)]
pub struct StaticInfo {
    images: BTreeMap<ImageId, Image>,
    insts: BTreeMap<InstId, Inst>,
}

impl StaticInfo {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from a snapshot, rejecting instructions that
    /// refer to unknown images.
    pub fn from_snapshot(snapshot: StaticInfoSnapshot) -> DomainResult<Self> {
        let images: BTreeMap<ImageId, Image> = snapshot
            .images
            .into_iter()
            .map(|image| (image.id, image))
            .collect();

        let mut insts = BTreeMap::new();
        for inst in snapshot.insts {
            if !images.contains_key(&inst.image_id) {
                return Err(DomainError::UnknownImage(inst.image_id));
            }
            insts.insert(inst.id, inst);
        }

        Ok(Self { images, insts })
    }

    /// Persisted form, in id order.
    pub fn to_snapshot(&self) -> StaticInfoSnapshot {
        StaticInfoSnapshot {
            images: self.images.values().cloned().collect(),
            insts: self.insts.values().cloned().collect(),
        }
    }

    /// Look up an image by id.
    pub fn find_image(&self, id: ImageId) -> DomainResult<&Image> {
        self.images.get(&id).ok_or(DomainError::UnknownImage(id))
    }

    /// Look up an instruction by id.
    pub fn find_inst(&self, id: InstId) -> DomainResult<&Inst> {
        self.insts.get(&id).ok_or(DomainError::UnknownInst(id))
    }

    /// Whether `id` is registered.
    pub fn contains_inst(&self, id: InstId) -> bool {
        self.insts.contains_key(&id)
    }

    /// Images in id order.
    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.images.values()
    }

    /// Instructions in id order.
    pub fn insts(&self) -> impl Iterator<Item = &Inst> {
        self.insts.values()
    }

    /// No image and no instruction.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.insts.is_empty()
    }

    /// Render an instruction as `id image 0xoffset file +line`.
    pub fn describe_inst(&self, id: InstId) -> DomainResult<String> {
        let inst = self.find_inst(id)?;
        let image = self.find_image(inst.image_id)?;
        let debug = inst
            .debug_info
            .as_ref()
            .map(|d| {
                let file = Path::new(&d.file_name)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(&d.file_name);
                format!("{file} +{}", d.line)
            })
            .unwrap_or_default();
        Ok(format!(
            "{:<5} {:<10} 0x{:<6x} {}",
            inst.id.0,
            image.short_name(),
            inst.offset,
            debug
        ))
    }
}
