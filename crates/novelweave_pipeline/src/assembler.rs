//! Merging fragments into one playable script.

use crate::{link_fragments, normalize_script};
use novelweave_core::{DraftNode, GalgameScript, StoryOutline};
use novelweave_error::{MalformedOutputError, MalformedOutputErrorKind, NovelweaveResult};
use std::collections::HashSet;

/// Stitches fragments together and repairs the result.
///
/// Assembly is the integrity backstop of the pipeline: the returned script
/// has no dangling choices, no silent dead ends and a valid start node, no
/// matter how loosely the fragments followed their instructions.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ScriptAssembler {
    /// Label of synthesized continuation choices
    continue_label: String,
}

impl ScriptAssembler {
    /// Create an assembler labelling synthesized choices with `continue_label`.
    pub fn new(continue_label: impl Into<String>) -> Self {
        Self {
            continue_label: continue_label.into(),
        }
    }

    /// Assemble `fragments`, in beat order, under the rosters of `outline`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedOutputErrorKind::NoNodes`] if every fragment is empty.
    #[tracing::instrument(
        skip_all,
        fields(
            fragments = fragments.len(),
            drafts = fragments.iter().map(Vec::len).sum::<usize>(),
        )
    )]
    pub fn assemble(
        &self,
        outline: &StoryOutline,
        fragments: Vec<Vec<DraftNode>>,
    ) -> NovelweaveResult<GalgameScript> {
        let nodes = link_fragments(fragments, &HashSet::new());
        if nodes.is_empty() {
            tracing::warn!("No fragment produced any node");
            return Err(MalformedOutputError::new(MalformedOutputErrorKind::NoNodes).into());
        }

        let mut script = GalgameScript {
            title: outline.title.clone(),
            synopsis: outline.synopsis.clone(),
            characters: outline.characters.clone(),
            scenes: outline.scenes.clone(),
            start_node_id: nodes[0].id.clone(),
            nodes,
        };
        let report = normalize_script(&mut script, &self.continue_label)?;

        tracing::info!(
            nodes = script.nodes.len(),
            characters = script.characters.len(),
            scenes = script.scenes.len(),
            repairs = %report,
            "Script assembled"
        );
        Ok(script)
    }
}
