//! Resolving draft links into a flat node sequence.

use novelweave_core::{Choice, DraftNode, NodeLink, StoryNode};
use std::collections::{HashMap, HashSet};

struct Placed {
    fragment: usize,
    id: String,
    draft: DraftNode,
}

/// Merge fragments in order and resolve every [`NodeLink`].
///
/// Local ids are kept when they are free; a collision with `reserved` or
/// with an earlier fragment is renamed `{local}_{fragment}` and references
/// inside the same fragment follow the rename. `NextSibling` resolves to the
/// structurally next node of the merged sequence and `EndOfFragment` to the
/// first node of the next non-empty fragment. Links with nowhere to go are
/// dropped. Scene ids are carried over unchecked.
pub fn link_fragments(fragments: Vec<Vec<DraftNode>>, reserved: &HashSet<String>) -> Vec<StoryNode> {
    let mut used = reserved.clone();
    let mut placed = Vec::new();
    let mut local_maps: Vec<HashMap<String, String>> = Vec::new();
    let mut fragment_starts = Vec::new();

    for (fragment, nodes) in fragments.into_iter().filter(|f| !f.is_empty()).enumerate() {
        let mut map = HashMap::new();
        fragment_starts.push(placed.len());
        for draft in nodes {
            let id = unique_id(&draft.local_id, fragment, &mut used);
            if id != draft.local_id {
                tracing::debug!(local_id = %draft.local_id, id = %id, fragment, "Renamed node id");
            }
            map.entry(draft.local_id.clone()).or_insert_with(|| id.clone());
            placed.push(Placed {
                fragment,
                id,
                draft,
            });
        }
        local_maps.push(map);
    }

    let ids: Vec<String> = placed.iter().map(|p| p.id.clone()).collect();

    placed
        .into_iter()
        .enumerate()
        .map(|(position, Placed { fragment, id, draft })| {
            let next_sibling = ids.get(position + 1);
            let next_fragment = fragment_starts.get(fragment + 1).map(|&start| &ids[start]);
            let renames = &local_maps[fragment];

            let DraftNode {
                scene_id,
                character_id,
                text,
                choices,
                is_ending,
                visual_specs,
                ..
            } = draft;

            let choices = choices
                .into_iter()
                .filter_map(|choice| {
                    let target = match choice.target {
                        NodeLink::Resolved(target) => Some(renames.get(&target).cloned().unwrap_or(target)),
                        NodeLink::NextSibling => next_sibling.cloned(),
                        NodeLink::EndOfFragment => next_fragment.cloned(),
                    };
                    if target.is_none() {
                        tracing::debug!(node = %id, "Dropped link with no following node");
                    }
                    target.map(|next_node_id| Choice {
                        text: choice.text,
                        next_node_id,
                        mood_effect: choice.mood_effect,
                    })
                })
                .collect();

            StoryNode {
                id,
                scene_id: scene_id.unwrap_or_default(),
                character_id,
                text,
                choices,
                is_ending,
                visual_specs,
            }
        })
        .collect()
}

fn unique_id(local_id: &str, fragment: usize, used: &mut HashSet<String>) -> String {
    let base = match local_id.trim() {
        "" => "node",
        trimmed => trimmed,
    };
    if used.insert(base.to_string()) {
        return base.to_string();
    }

    let namespaced = format!("{}_{}", base, fragment + 1);
    if used.insert(namespaced.clone()) {
        return namespaced;
    }

    (2..)
        .map(|k| format!("{}_{}", namespaced, k))
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelweave_core::DraftChoice;

    fn draft(id: &str, targets: &[NodeLink]) -> DraftNode {
        DraftNode {
            local_id: id.to_string(),
            scene_id: Some("s1".to_string()),
            character_id: None,
            text: format!("text of {}", id),
            choices: targets
                .iter()
                .map(|t| DraftChoice {
                    text: "继续".to_string(),
                    target: t.clone(),
                    mood_effect: None,
                })
                .collect(),
            is_ending: false,
            visual_specs: None,
        }
    }

    fn targets(node: &StoryNode) -> Vec<&str> {
        node.choices.iter().map(|c| c.next_node_id.as_str()).collect()
    }

    #[test]
    fn test_next_sibling_crosses_fragments() {
        let nodes = link_fragments(
            vec![
                vec![draft("a", &[NodeLink::NextSibling])],
                vec![draft("b", &[NodeLink::NextSibling])],
            ],
            &HashSet::new(),
        );
        assert_eq!(targets(&nodes[0]), vec!["b"]);
        assert!(nodes[1].choices.is_empty());
    }

    #[test]
    fn test_end_of_fragment_skips_empty_fragments() {
        let nodes = link_fragments(
            vec![
                vec![
                    draft("a", &[NodeLink::NextSibling]),
                    draft("b", &[NodeLink::EndOfFragment]),
                ],
                vec![],
                vec![draft("c", &[NodeLink::EndOfFragment])],
            ],
            &HashSet::new(),
        );
        assert_eq!(targets(&nodes[0]), vec!["b"]);
        assert_eq!(targets(&nodes[1]), vec!["c"]);
        assert!(nodes[2].choices.is_empty());
    }

    #[test]
    fn test_colliding_ids_are_namespaced_and_remapped() {
        let nodes = link_fragments(
            vec![
                vec![
                    draft("local_1", &[NodeLink::Resolved("local_2".into())]),
                    draft("local_2", &[NodeLink::EndOfFragment]),
                ],
                vec![
                    draft("local_1", &[NodeLink::Resolved("local_2".into())]),
                    draft("local_2", &[]),
                ],
            ],
            &HashSet::new(),
        );
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["local_1", "local_2", "local_1_2", "local_2_2"]);
        assert_eq!(targets(&nodes[1]), vec!["local_1_2"]);
        assert_eq!(targets(&nodes[2]), vec!["local_2_2"]);
    }

    #[test]
    fn test_reserved_ids_are_avoided() {
        let reserved: HashSet<String> = ["node_1".to_string()].into_iter().collect();
        let nodes = link_fragments(
            vec![vec![
                draft("node_1", &[NodeLink::Resolved("node_2".into())]),
                draft("node_2", &[NodeLink::Resolved("node_1".into())]),
            ]],
            &reserved,
        );
        assert_eq!(nodes[0].id, "node_1_1");
        assert_eq!(targets(&nodes[1]), vec!["node_1_1"]);
    }

    #[test]
    fn test_self_loop_is_preserved() {
        let nodes = link_fragments(
            vec![vec![draft("a", &[NodeLink::Resolved("a".into())])]],
            &HashSet::new(),
        );
        assert_eq!(targets(&nodes[0]), vec!["a"]);
    }
}
