//! Draft nodes whose choice targets are not yet resolved.
//!
//! Fragment responses use reserved tokens for nodes the model cannot name:
//! `NEXT` (and its variants) for "whatever node follows me" and
//! `END_OF_FRAGMENT` for "the first node of the next fragment". These are
//! parsed once into [`NodeLink`] and resolved in a single linking pass.

use crate::VisualSpec;

/// Sentinel for the structurally next node.
pub const NEXT_SENTINELS: [&str; 3] = ["NEXT", "NEXT_PLACEHOLDER", "NEXT_NODE"];

/// Sentinel for the first node of the following fragment.
pub const END_OF_FRAGMENT: &str = "END_OF_FRAGMENT";

/// A choice target before linking.
///
/// # Examples
///
/// ```
/// use novelweave_core::NodeLink;
///
/// assert_eq!(NodeLink::from("NEXT"), NodeLink::NextSibling);
/// assert_eq!(NodeLink::from("END_OF_FRAGMENT"), NodeLink::EndOfFragment);
/// assert_eq!(NodeLink::from("local_2"), NodeLink::Resolved("local_2".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeLink {
    /// A concrete node id (fragment-local until linked)
    Resolved(String),
    /// The node that follows in merged order
    NextSibling,
    /// The first node of the next fragment
    EndOfFragment,
}

impl From<&str> for NodeLink {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || NEXT_SENTINELS.contains(&raw) {
            NodeLink::NextSibling
        } else if raw == END_OF_FRAGMENT {
            NodeLink::EndOfFragment
        } else {
            NodeLink::Resolved(raw.to_string())
        }
    }
}

/// A choice as emitted by a fragment, target unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftChoice {
    /// Button label
    pub text: String,
    /// Unresolved target
    pub target: NodeLink,
    /// Optional flavor tag
    pub mood_effect: Option<String>,
}

/// A node as emitted by a fragment.
///
/// Scene and character references have not been checked against the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftNode {
    /// Fragment-local id
    pub local_id: String,
    /// Proposed scene, possibly fabricated
    pub scene_id: Option<String>,
    /// Proposed speaker, possibly unknown
    pub character_id: Option<String>,
    /// Displayed text
    pub text: String,
    /// Outgoing edges
    pub choices: Vec<DraftChoice>,
    /// Marked terminal by the model
    pub is_ending: bool,
    /// Optional item or CG visual
    pub visual_specs: Option<VisualSpec>,
}
