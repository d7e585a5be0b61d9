//! Image generation task types.

use serde::{Deserialize, Serialize};

/// Rendering style requested from the image capability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageStyle {
    /// Line sketch
    Sketch,
    /// Anime illustration
    #[default]
    Anime,
    /// Photographic
    Reality,
}

/// State of a submitted image task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageTaskStatus {
    /// Still queued or running
    Pending,
    /// Finished with an image
    Succeeded {
        /// Location of the generated image
        url: String,
    },
    /// Finished without an image
    Failed {
        /// Provider-supplied reason
        message: String,
    },
}
