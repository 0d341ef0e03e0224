//! Error taxonomy shared by every stage of the sheet pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::Dimensions;

/// Errors raised while configuring, arranging or rendering card sheets.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Bad unit suffix, unknown preset, malformed output path and similar.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The paper cannot hold even a single card container.
    #[error(
        "paper size too small: {:.2}x{:.2}pt cannot hold a {:.2}x{:.2}pt card",
        .paper.width,
        .paper.height,
        .container.width,
        .container.height
    )]
    LayoutInfeasible {
        paper: Dimensions,
        container: Dimensions,
    },

    /// A card unit reached the arrangement engine in a shape it cannot hold.
    #[error("arrangement invariant violated: {0}")]
    ArrangementInvariant(String),

    #[error("failed to process image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backend was asked to draw before any page was started.
    #[error("no page to draw on; add_page must come first")]
    NoPage,

    /// printpdf rejected an image or document.
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl ProxyError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
