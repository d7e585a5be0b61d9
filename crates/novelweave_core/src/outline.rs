//! Intermediate outline produced before fragment generation.

use crate::{Character, Scene};
use serde::{Deserialize, Serialize};

/// A coarse plot point covering a few hundred characters of prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBeat {
    /// Beat id, as given by the model (numbers are stringified)
    pub id: String,
    /// One-sentence summary
    pub summary: String,
    /// Scene the beat happens in, if known
    #[serde(default)]
    pub location_id: Option<String>,
    /// Characters who appear
    #[serde(default)]
    pub required_characters: Vec<String>,
}

/// Macro structure of the whole story.
///
/// # Examples
///
/// ```
/// use novelweave_core::StoryOutline;
///
/// let outline = StoryOutline::default();
/// assert!(outline.beats.is_empty());
/// assert!(outline.scenes.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryOutline {
    /// Working title
    pub title: String,
    /// Story summary
    pub synopsis: String,
    /// Ordered beat sheet
    pub beats: Vec<StoryBeat>,
    /// Every character who speaks
    pub characters: Vec<Character>,
    /// Every location
    pub scenes: Vec<Scene>,
}
