pub mod background;
pub mod font;
pub mod frame;

use std::path::{Path, PathBuf};

/// Outcome of a fault-tolerant render stage. The file at the carried
/// path always exists; `Fallback` marks a degraded placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Full(PathBuf),
    Fallback(PathBuf),
}

impl Rendered {
    pub fn path(&self) -> &Path {
        match self {
            Rendered::Full(path) | Rendered::Fallback(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Rendered::Full(path) | Rendered::Fallback(path) => path,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback(_))
    }
}
