use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by the conversion pipeline.
///
/// The tool is fail-fast: every variant aborts the run. Variants carry
/// enough context (file path, field name) for an operator to fix the input
/// and rerun.
#[derive(Debug, Error)]
pub enum Error {
    /// A required annotation field is absent.
    #[error("cannot find <{field}> in <{context}>")]
    MissingField { field: String, context: String },

    /// A required annotation field appears the wrong number of times.
    #[error("the number of <{field}> in <{context}> is supposed to be {expected}, but is {found}")]
    FieldCount {
        field: String,
        context: String,
        expected: usize,
        found: usize,
    },

    /// A coordinate value could not be parsed as a number.
    #[error("invalid numeric value {value:?} in <{context}>")]
    InvalidNumber { value: String, context: String },

    /// The label file does not start with the ignore sentinel.
    #[error("first line of the labels file must be `{expected}`, found {found:?}")]
    LabelFormat { expected: &'static str, found: String },

    /// A mask's dimensions disagree with the declared image size.
    #[error("mask has {len} pixels but the declared size is {height}x{width}")]
    ShapeMismatch { len: usize, height: u32, width: u32 },

    /// The output directory already exists; refusing to overwrite.
    #[error("output directory already exists: {0}")]
    OutputExists(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("failed to write annotations: {0}")]
    Json(#[from] serde_json::Error),

    /// Attaches the annotation file path to errors raised while processing
    /// its contents.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap an error with the annotation file it came from, unless it
    /// already carries a path of its own.
    pub(crate) fn in_file(self, path: &Path) -> Self {
        match self {
            e @ (Error::Io { .. }
            | Error::Image { .. }
            | Error::Xml { .. }
            | Error::InFile { .. }) => e,
            e => Error::InFile {
                path: path.to_path_buf(),
                source: Box::new(e),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
