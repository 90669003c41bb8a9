/// Errors produced while loading or processing mesh data
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of the mesh pipeline.
///
/// Every variant aborts the load that produced it; no partial mesh is
/// returned. Camera operations never fail and have no error type.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to open {}: {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed OFF data: {0}")]
    Format(String),

    #[error("face {face} references vertex {index}, but the mesh only has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("unknown normal weight mode `{0}` (expected uniform, area or angle)")]
    InvalidWeightMode(String),
}

pub type Result<T> = std::result::Result<T, MeshError>;
