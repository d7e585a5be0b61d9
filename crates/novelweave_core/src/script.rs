//! The playable script graph.

use serde::{Deserialize, Serialize};

/// A character who speaks somewhere in the script.
///
/// # Examples
///
/// ```
/// use novelweave_core::Character;
///
/// let mira = Character {
///     id: "mira".to_string(),
///     name: "米拉".to_string(),
///     description: "Informant".to_string(),
///     visual_traits: "short silver hair".to_string(),
///     theme_color: None,
/// };
/// assert_eq!(mira.id, "mira");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique id within the script
    pub id: String,
    /// Display name
    pub name: String,
    /// Personality and role
    #[serde(default)]
    pub description: String,
    /// Appearance, used to seed image prompts
    #[serde(default)]
    pub visual_traits: String,
    /// Optional name-tag color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
}

/// A location nodes take place in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique id within the script
    pub id: String,
    /// What the place is
    #[serde(default)]
    pub description: String,
    /// Atmosphere
    #[serde(default)]
    pub mood: String,
    /// English prompt for background generation
    #[serde(default)]
    pub visual_prompt: String,
    /// Background image, filled by asset back-fill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// An outgoing edge of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Button label
    pub text: String,
    /// Target node id
    pub next_node_id: String,
    /// Optional flavor tag for the choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_effect: Option<String>,
}

impl Choice {
    /// A plain forward edge with no mood effect.
    pub fn forward(text: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
            mood_effect: None,
        }
    }
}

/// Kind of special visual attached to a node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisualKind {
    /// A close-up of a key object
    Item,
    /// A full illustrated moment
    Cg,
}

/// Special visual requested for a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSpec {
    /// Item close-up or CG
    #[serde(rename = "type")]
    pub kind: VisualKind,
    /// What is shown
    #[serde(default)]
    pub description: String,
    /// English prompt for generation
    #[serde(default)]
    pub visual_prompt: String,
    /// Generated image, filled by asset back-fill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One unit of narration or dialogue.
///
/// `character_id` of `None` means narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    /// Unique id within the script
    pub id: String,
    /// Scene this node is shown in
    pub scene_id: String,
    /// Speaker, or `None` for narration
    #[serde(default)]
    pub character_id: Option<String>,
    /// Displayed text, never absent
    #[serde(default)]
    pub text: String,
    /// Outgoing edges
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Terminal node of the graph
    #[serde(default)]
    pub is_ending: bool,
    /// Optional item or CG visual
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_specs: Option<VisualSpec>,
}

impl StoryNode {
    /// True when the node is not an ending and offers no way forward.
    pub fn is_dead_end(&self) -> bool {
        !self.is_ending && self.choices.is_empty()
    }
}

/// The final playable artifact.
///
/// # Examples
///
/// ```
/// use novelweave_core::{Choice, GalgameScript, StoryNode};
///
/// let node = |id: &str| StoryNode {
///     id: id.to_string(),
///     scene_id: "alley".to_string(),
///     character_id: None,
///     text: "雨没有停。".to_string(),
///     choices: vec![],
///     is_ending: false,
///     visual_specs: None,
/// };
/// let mut first = node("n1");
/// first.choices.push(Choice::forward("继续", "n2"));
///
/// let script = GalgameScript {
///     title: "雨夜".to_string(),
///     synopsis: String::new(),
///     characters: vec![],
///     scenes: vec![],
///     nodes: vec![first, node("n2")],
///     start_node_id: "n1".to_string(),
/// };
/// assert!(script.node("n2").is_some());
/// assert_eq!(script.last_node().map(|n| n.id.as_str()), Some("n2"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalgameScript {
    /// Script title
    pub title: String,
    /// One-paragraph summary
    #[serde(default)]
    pub synopsis: String,
    /// Character roster
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Scene roster
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// All nodes in traversal order
    #[serde(default)]
    pub nodes: Vec<StoryNode>,
    /// Entry point
    #[serde(default)]
    pub start_node_id: String,
}

impl GalgameScript {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a scene by id.
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// The structurally last node.
    pub fn last_node(&self) -> Option<&StoryNode> {
        self.nodes.last()
    }

    /// Choices whose target is not a node of this script.
    pub fn dangling_choices(&self) -> Vec<(&str, &Choice)> {
        self.nodes
            .iter()
            .flat_map(|n| n.choices.iter().map(move |c| (n.id.as_str(), c)))
            .filter(|(_, c)| self.node(&c.next_node_id).is_none())
            .collect()
    }
}
