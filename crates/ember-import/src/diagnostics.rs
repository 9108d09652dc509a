use std::fmt;
use std::path::PathBuf;

use tracing::warn;

/// Why a source mesh was left out of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotTriangles,
    NoNormals,
    NoTangents,
    /// More vertices than 16-bit indices can address.
    TooManyVertices(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTriangles => f.write_str("not a triangle primitive"),
            Self::NoNormals => f.write_str("no normals"),
            Self::NoTangents => f.write_str("no tangents"),
            Self::TooManyVertices(count) => write!(f, "{count} vertices exceed the 16-bit index range"),
        }
    }
}

/// A recoverable problem found during an import. The importer substitutes a
/// default and carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Anomaly {
    #[error("include not found: {}", .0.display())]
    MissingInclude(PathBuf),

    #[error("include nesting deeper than {limit} at {}", .path.display())]
    IncludeDepthExceeded { path: PathBuf, limit: usize },

    #[error("unterminated '{block}' block")]
    UnterminatedBlock { block: String },

    #[error("mesh '{mesh}' skipped: {reason}")]
    MeshSkipped { mesh: String, reason: SkipReason },

    #[error("vertex {vertex} has more than 4 bone weights, dropping '{bone}'")]
    ExcessBoneInfluence { vertex: usize, bone: String },

    #[error("mesh '{mesh}': bone '{bone}' has no vertex index slot")]
    BoneIndexOverflow { mesh: String, bone: String },

    #[error("bone '{bone}' has no node in the hierarchy")]
    MissingBoneNode { bone: String },

    #[error("{slot} texture '{path}' not found")]
    UnresolvedTexture { slot: &'static str, path: String },

    #[error("{slot} texture {} is not an imported asset", .path.display())]
    UnregisteredTexture { slot: &'static str, path: PathBuf },

    #[error("mesh '{mesh}' references missing material {index}")]
    MissingMaterial { mesh: String, index: usize },
}

/// Collects the anomalies of one import and logs each as it is reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, anomaly: Anomaly) {
        warn!("{anomaly}");
        self.anomalies.push(anomaly);
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn into_vec(self) -> Vec<Anomaly> {
        self.anomalies
    }
}
