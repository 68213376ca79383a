//! Upload categories and public URL prefixes.
//!
//! A category is a caller-supplied label used only to build the public URL
//! prefix for derivatives (`/uploads/{category}/...`). The pipeline neither
//! validates nor enforces it against any storage layout.
//!
//! [`Category::infer_from_path`] guesses the label from the file's parent
//! directory name. It exists as a compatibility shim for callers whose
//! upload trees are laid out as `.../uploads/<category>/<file>`; nothing in
//! the pipeline itself calls it, and new callers should pass the category
//! explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(String);

/// Public URL grouping for an upload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Projects,
    Blog,
    Banners,
    #[default]
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Projects => "projects",
            Category::Blog => "blog",
            Category::Banners => "banners",
            Category::General => "general",
        }
    }

    /// Public URL prefix for files in this category.
    pub fn url_prefix(self) -> String {
        format!("/uploads/{}", self.as_str())
    }

    /// Legacy shim: guess the category from the file's parent directory
    /// name. Returns `None` when the directory name is not a known label.
    pub fn infer_from_path(path: &Path) -> Option<Category> {
        path.parent()?
            .file_name()?
            .to_str()?
            .parse()
            .ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(Category::Projects),
            "blog" => Ok(Category::Blog),
            "banners" => Ok(Category::Banners),
            "general" => Ok(Category::General),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
