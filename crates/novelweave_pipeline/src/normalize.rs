//! Validating transforms from loosely typed model output to the data model.
//!
//! Model output is treated as untrusted. Each transform fills defaults,
//! drops entries that are not objects, and repairs what it can instead of
//! failing. Only a payload of the wrong overall shape is an error.

use crate::link_fragments;
use novelweave_core::{
    Character, Choice, DraftChoice, DraftNode, GalgameScript, NodeLink, Scene, StoryBeat,
    StoryNode, StoryOutline, VisualKind, VisualSpec,
};
use novelweave_error::{MalformedOutputError, MalformedOutputErrorKind, NovelweaveResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Title used when an outline comes back without one.
pub const UNTITLED_OUTLINE: &str = "未命名大纲";

/// Character ids that mean "no speaker".
const NARRATION_IDS: [&str; 3] = ["narration", "narrator", "null"];

type Object = Map<String, Value>;

/// Whether a character reference denotes narration.
pub fn is_narration(character_id: &str) -> bool {
    let id = character_id.trim();
    id.is_empty() || NARRATION_IDS.iter().any(|n| id.eq_ignore_ascii_case(n))
}

fn text_field(obj: &Object, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| obj.get(*key)).find_map(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn bool_field(obj: &Object, keys: &[&str]) -> bool {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .any(|value| value.as_bool().unwrap_or(false))
}

fn field<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = &Object> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[track_caller]
fn unexpected_shape(expected: &str, found: &Value) -> MalformedOutputError {
    MalformedOutputError::new(MalformedOutputErrorKind::UnexpectedShape(format!(
        "expected {}, found {}",
        expected,
        value_kind(found)
    )))
}

/// Normalize a character roster. Missing ids become `char_<n>`.
pub fn normalize_characters(value: Option<&Value>) -> Vec<Character> {
    let mut seen = HashSet::new();
    objects(value)
        .enumerate()
        .filter_map(|(i, obj)| {
            let id = text_field(obj, &["id"]).unwrap_or_else(|| format!("char_{}", i + 1));
            if !seen.insert(id.clone()) {
                tracing::debug!(character_id = %id, "Dropped duplicate character");
                return None;
            }
            Some(Character {
                name: text_field(obj, &["name"]).unwrap_or_else(|| id.clone()),
                description: text_field(obj, &["description"]).unwrap_or_default(),
                visual_traits: text_field(obj, &["visualTraits", "visual_traits"]).unwrap_or_default(),
                theme_color: text_field(obj, &["themeColor", "theme_color"]),
                id,
            })
        })
        .collect()
}

/// Normalize a scene roster. Missing ids become `scene_<n>`.
pub fn normalize_scenes(value: Option<&Value>) -> Vec<Scene> {
    let mut seen = HashSet::new();
    objects(value)
        .enumerate()
        .filter_map(|(i, obj)| {
            let id = text_field(obj, &["id"]).unwrap_or_else(|| format!("scene_{}", i + 1));
            if !seen.insert(id.clone()) {
                tracing::debug!(scene_id = %id, "Dropped duplicate scene");
                return None;
            }
            Some(Scene {
                description: text_field(obj, &["description"]).unwrap_or_default(),
                mood: text_field(obj, &["mood"]).unwrap_or_default(),
                visual_prompt: text_field(obj, &["visualPrompt", "visual_prompt"]).unwrap_or_default(),
                image_url: text_field(obj, &["imageUrl", "image_url"]),
                id,
            })
        })
        .collect()
}

/// Normalize beats. Ids may be numbers; beats without a summary are dropped.
pub fn normalize_beats(value: Option<&Value>) -> Vec<StoryBeat> {
    objects(value)
        .enumerate()
        .filter_map(|(i, obj)| {
            let summary = text_field(obj, &["summary", "description"])?;
            Some(StoryBeat {
                id: text_field(obj, &["id"]).unwrap_or_else(|| (i + 1).to_string()),
                summary,
                location_id: text_field(obj, &["locationId", "location_id", "sceneId"]),
                required_characters: string_list(field(
                    obj,
                    &["requiredCharacters", "required_characters"],
                )),
            })
        })
        .collect()
}

/// Normalize an outline response.
///
/// Missing arrays become empty and a missing title becomes
/// [`UNTITLED_OUTLINE`].
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::UnexpectedShape`] if `value` is not an object.
///
/// # Examples
///
/// ```
/// use novelweave_pipeline::normalize_outline;
/// use serde_json::json;
///
/// let outline = normalize_outline(&json!({
///     "title": "雨夜",
///     "beats": [{"id": 1, "summary": "凯尔在小巷等人"}]
/// })).unwrap();
///
/// assert_eq!(outline.beats[0].id, "1");
/// assert!(outline.scenes.is_empty());
/// ```
pub fn normalize_outline(value: &Value) -> NovelweaveResult<StoryOutline> {
    let obj = value
        .as_object()
        .ok_or_else(|| unexpected_shape("an outline object", value))?;

    Ok(StoryOutline {
        title: text_field(obj, &["title"]).unwrap_or_else(|| UNTITLED_OUTLINE.to_string()),
        synopsis: text_field(obj, &["synopsis"]).unwrap_or_default(),
        beats: normalize_beats(obj.get("beats")),
        characters: normalize_characters(obj.get("characters")),
        scenes: normalize_scenes(obj.get("scenes")),
    })
}

fn visual_spec(value: Option<&Value>) -> Option<VisualSpec> {
    let obj = match value? {
        Value::Array(items) => items.iter().find_map(Value::as_object)?,
        Value::Object(obj) => obj,
        _ => return None,
    };
    let kind = text_field(obj, &["type", "kind"])
        .and_then(|k| VisualKind::from_str(&k.to_lowercase()).ok())?;
    let description = text_field(obj, &["description"]).unwrap_or_default();
    let visual_prompt = text_field(obj, &["visualPrompt", "visual_prompt"]).unwrap_or_default();
    if description.is_empty() && visual_prompt.is_empty() {
        return None;
    }
    Some(VisualSpec {
        kind,
        description,
        visual_prompt,
        image_url: None,
    })
}

fn draft_choices(value: Option<&Value>, continue_label: &str) -> Vec<DraftChoice> {
    objects(value)
        .map(|obj| DraftChoice {
            text: text_field(obj, &["text"]).unwrap_or_else(|| continue_label.to_string()),
            target: NodeLink::from(
                text_field(obj, &["nextNodeId", "next_node_id", "next"])
                    .unwrap_or_default()
                    .as_str(),
            ),
            mood_effect: text_field(obj, &["moodEffect", "mood_effect"]),
        })
        .collect()
}

/// Parse node objects into drafts.
///
/// A node without choices that is not an ending gets one continuation:
/// `NextSibling` for interior nodes and `tail` for the last node.
fn draft_nodes(items: &[Value], tail: Option<NodeLink>, continue_label: &str) -> Vec<DraftNode> {
    let nodes: Vec<&Object> = items.iter().filter_map(Value::as_object).collect();
    let count = nodes.len();

    nodes
        .into_iter()
        .enumerate()
        .map(|(i, obj)| {
            let is_ending = bool_field(obj, &["isEnding", "is_ending"]);
            let mut choices = draft_choices(obj.get("choices"), continue_label);
            if choices.is_empty() && !is_ending {
                let target = if i + 1 == count {
                    tail.clone()
                } else {
                    Some(NodeLink::NextSibling)
                };
                if let Some(target) = target {
                    choices.push(DraftChoice {
                        text: continue_label.to_string(),
                        target,
                        mood_effect: None,
                    });
                }
            }

            DraftNode {
                local_id: text_field(obj, &["id"]).unwrap_or_else(|| format!("local_{}", i + 1)),
                scene_id: text_field(obj, &["sceneId", "scene_id"]),
                character_id: text_field(obj, &["characterId", "character_id"])
                    .filter(|id| !is_narration(id)),
                text: obj
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                choices,
                is_ending,
                visual_specs: visual_spec(field(obj, &["visualSpecs", "visual_specs"])),
            }
        })
        .collect()
}

fn node_items<'a>(value: &'a Value, expected: &str) -> NovelweaveResult<&'a Vec<Value>> {
    value
        .as_array()
        .or_else(|| value.get("nodes").and_then(Value::as_array))
        .ok_or_else(|| unexpected_shape(expected, value).into())
}

/// Normalize a fragment response (a node array or `{"nodes": [...]}`).
///
/// The last node's fallback continuation targets the end of the fragment.
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::UnexpectedShape`] if no node array is present.
pub fn normalize_fragment(value: &Value, continue_label: &str) -> NovelweaveResult<Vec<DraftNode>> {
    let items = node_items(value, "a node array")?;
    Ok(draft_nodes(items, Some(NodeLink::EndOfFragment), continue_label))
}

/// Normalize a follow-up response (`{"nodes": [...]}` or a node array).
///
/// The last node is left open for the next segment.
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::UnexpectedShape`] if no node array is present.
pub fn normalize_follow_up(value: &Value, continue_label: &str) -> NovelweaveResult<Vec<DraftNode>> {
    let items = node_items(value, "an object with a nodes array")?;
    Ok(draft_nodes(items, None, continue_label))
}

/// Normalize a complete script, such as a single-call response or a saved file.
///
/// When the top-level `nodes` array is missing or empty, nodes nested
/// inside scenes are collected instead, inheriting the scene's id.
///
/// # Errors
///
/// Returns an error if `value` is not an object or holds no nodes at all.
pub fn normalize_script_value(
    value: &Value,
    continue_label: &str,
) -> NovelweaveResult<(GalgameScript, NormalizationReport)> {
    let obj = value
        .as_object()
        .ok_or_else(|| unexpected_shape("a script object", value))?;

    let mut drafts = obj
        .get("nodes")
        .and_then(Value::as_array)
        .map(|items| draft_nodes(items, None, continue_label))
        .unwrap_or_default();

    if drafts.is_empty() {
        for scene in objects(obj.get("scenes")) {
            let scene_id = text_field(scene, &["id"]);
            let Some(items) = scene.get("nodes").and_then(Value::as_array) else {
                continue;
            };
            let mut nested = draft_nodes(items, None, continue_label);
            for node in &mut nested {
                if node.scene_id.is_none() {
                    node.scene_id = scene_id.clone();
                }
            }
            drafts.extend(nested);
        }
        if !drafts.is_empty() {
            tracing::debug!(nodes = drafts.len(), "Collected nodes nested in scenes");
        }
    }

    let mut script = GalgameScript {
        title: text_field(obj, &["title"]).unwrap_or_else(|| UNTITLED_OUTLINE.to_string()),
        synopsis: text_field(obj, &["synopsis"]).unwrap_or_default(),
        characters: normalize_characters(obj.get("characters")),
        scenes: normalize_scenes(obj.get("scenes")),
        nodes: link_fragments(vec![drafts], &HashSet::new()),
        start_node_id: text_field(obj, &["startNodeId", "start_node_id"]).unwrap_or_default(),
    };
    let report = normalize_script(&mut script, continue_label)?;
    Ok((script, report))
}

/// Counts of the integrity repairs made by [`normalize_script`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    /// Roster entries dropped because their id was already taken
    pub duplicates_removed: usize,
    /// Nodes renamed because their id was empty or taken
    pub nodes_renamed: usize,
    /// Speaker references turned into narration
    pub narration_coerced: usize,
    /// Unknown speaker ids matched to a roster entry
    pub characters_matched: usize,
    /// Roster entries created for unknown speakers
    pub characters_added: usize,
    /// Nodes moved off an unknown scene
    pub scenes_repaired: usize,
    /// Scenes created because the roster was empty
    pub scenes_added: usize,
    /// Dangling choices pointed at the following node
    pub choices_retargeted: usize,
    /// Dangling choices removed from the last node
    pub choices_dropped: usize,
    /// Empty choice labels filled in
    pub labels_filled: usize,
    /// Dead ends given a continuation
    pub dead_ends_linked: usize,
    /// Final nodes marked as endings
    pub endings_marked: usize,
    /// Whether the start node had to be rebound
    pub start_rebound: bool,
}

impl NormalizationReport {
    /// Whether nothing needed repair.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for NormalizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "no repairs");
        }
        let counts = [
            ("duplicate roster entries removed", self.duplicates_removed),
            ("nodes renamed", self.nodes_renamed),
            ("speakers coerced to narration", self.narration_coerced),
            ("speakers matched by name", self.characters_matched),
            ("characters added", self.characters_added),
            ("scene references repaired", self.scenes_repaired),
            ("scenes added", self.scenes_added),
            ("choices retargeted", self.choices_retargeted),
            ("choices dropped", self.choices_dropped),
            ("choice labels filled", self.labels_filled),
            ("dead ends linked", self.dead_ends_linked),
            ("endings marked", self.endings_marked),
        ];
        let mut parts: Vec<String> = counts
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(label, n)| format!("{} {}", n, label))
            .collect();
        if self.start_rebound {
            parts.push("start node rebound".to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Final integrity pass over a script.
///
/// Afterwards every choice resolves, every node that is not an ending has a
/// choice, every node references a known scene and speaker, node ids are
/// unique, and `start_node_id` names an existing node. Running it again on
/// its own output changes nothing.
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::NoNodes`] if the script has no nodes.
pub fn normalize_script(
    script: &mut GalgameScript,
    continue_label: &str,
) -> NovelweaveResult<NormalizationReport> {
    if script.nodes.is_empty() {
        return Err(MalformedOutputError::new(MalformedOutputErrorKind::NoNodes).into());
    }

    let mut report = NormalizationReport::default();

    let mut seen = HashSet::new();
    let before = script.characters.len();
    script.characters.retain(|c| seen.insert(c.id.clone()));
    report.duplicates_removed += before - script.characters.len();

    let mut seen = HashSet::new();
    let before = script.scenes.len();
    script.scenes.retain(|s| seen.insert(s.id.clone()));
    report.duplicates_removed += before - script.scenes.len();

    rename_duplicate_nodes(&mut script.nodes, &mut report);
    repair_speakers(script, &mut report);
    repair_scenes(script, &mut report);
    repair_choices(&mut script.nodes, continue_label, &mut report);

    if script.node(&script.start_node_id).is_none() {
        script.start_node_id = script.nodes[0].id.clone();
        report.start_rebound = true;
    }

    if !report.is_clean() {
        tracing::warn!(%report, "Repaired script integrity violations");
    }
    Ok(report)
}

fn rename_duplicate_nodes(nodes: &mut [StoryNode], report: &mut NormalizationReport) {
    let mut seen: HashSet<String> = HashSet::new();
    let taken: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();

    for node in nodes.iter_mut() {
        if !node.id.trim().is_empty() && seen.insert(node.id.clone()) {
            continue;
        }
        let base = match node.id.trim() {
            "" => "node".to_string(),
            id => id.to_string(),
        };
        let fresh = (2..)
            .map(|k| format!("{}_{}", base, k))
            .find(|candidate| !taken.contains(candidate) && !seen.contains(candidate))
            .unwrap_or_else(|| format!("{}_{}", base, seen.len() + 1));
        tracing::debug!(old = %node.id, new = %fresh, "Renamed duplicate node id");
        seen.insert(fresh.clone());
        node.id = fresh;
        report.nodes_renamed += 1;
    }
}

fn repair_speakers(script: &mut GalgameScript, report: &mut NormalizationReport) {
    for node in script.nodes.iter_mut() {
        let Some(id) = node.character_id.clone() else {
            continue;
        };
        if is_narration(&id) {
            node.character_id = None;
            report.narration_coerced += 1;
            continue;
        }
        if script.characters.iter().any(|c| c.id == id) {
            continue;
        }

        let wanted = id.trim().to_lowercase();
        let matched = script
            .characters
            .iter()
            .find(|c| c.id.to_lowercase() == wanted || c.name.trim().to_lowercase() == wanted);
        match matched {
            Some(character) => {
                node.character_id = Some(character.id.clone());
                report.characters_matched += 1;
            }
            None => {
                tracing::debug!(character_id = %id, "Added unknown speaker to roster");
                script.characters.push(Character {
                    id: id.clone(),
                    name: id,
                    description: String::new(),
                    visual_traits: String::new(),
                    theme_color: None,
                });
                report.characters_added += 1;
            }
        }
    }
}

fn repair_scenes(script: &mut GalgameScript, report: &mut NormalizationReport) {
    let mut previous: Option<String> = None;

    for node in script.nodes.iter_mut() {
        if script.scenes.iter().any(|s| s.id == node.scene_id) {
            previous = Some(node.scene_id.clone());
            continue;
        }

        let replacement = match previous.clone().or_else(|| script.scenes.first().map(|s| s.id.clone())) {
            Some(id) => {
                report.scenes_repaired += 1;
                id
            }
            None => {
                let id = match node.scene_id.trim() {
                    "" => "scene_1".to_string(),
                    id => id.to_string(),
                };
                script.scenes.push(Scene {
                    id: id.clone(),
                    description: String::new(),
                    mood: String::new(),
                    visual_prompt: String::new(),
                    image_url: None,
                });
                report.scenes_added += 1;
                id
            }
        };

        if node.scene_id != replacement {
            tracing::debug!(node = %node.id, scene = %node.scene_id, replacement = %replacement, "Replaced unknown scene");
        }
        node.scene_id = replacement.clone();
        previous = Some(replacement);
    }
}

fn repair_choices(nodes: &mut [StoryNode], continue_label: &str, report: &mut NormalizationReport) {
    let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let next_ids: Vec<Option<String>> = (0..nodes.len())
        .map(|i| nodes.get(i + 1).map(|n| n.id.clone()))
        .collect();

    for (node, next_id) in nodes.iter_mut().zip(next_ids) {
        let mut kept = Vec::with_capacity(node.choices.len());
        for mut choice in node.choices.drain(..) {
            if choice.text.trim().is_empty() {
                choice.text = continue_label.to_string();
                report.labels_filled += 1;
            }
            if !ids.contains(&choice.next_node_id) {
                match &next_id {
                    Some(next) => {
                        tracing::debug!(node = %node.id, target = %choice.next_node_id, "Retargeted dangling choice");
                        choice.next_node_id = next.clone();
                        report.choices_retargeted += 1;
                    }
                    None => {
                        report.choices_dropped += 1;
                        continue;
                    }
                }
            }
            kept.push(choice);
        }
        node.choices = kept;

        if node.choices.is_empty() && !node.is_ending {
            match next_id {
                Some(next) => {
                    node.choices.push(Choice::forward(continue_label, next));
                    report.dead_ends_linked += 1;
                }
                None => {
                    node.is_ending = true;
                    report.endings_marked += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LABEL: &str = "继续";

    fn node(id: &str, scene: &str, choices: &[&str]) -> StoryNode {
        StoryNode {
            id: id.to_string(),
            scene_id: scene.to_string(),
            character_id: None,
            text: format!("text {}", id),
            choices: choices.iter().map(|t| Choice::forward(LABEL, *t)).collect(),
            is_ending: false,
            visual_specs: None,
        }
    }

    fn script(nodes: Vec<StoryNode>) -> GalgameScript {
        GalgameScript {
            title: "t".to_string(),
            synopsis: String::new(),
            characters: vec![Character {
                id: "mira".to_string(),
                name: "Mira".to_string(),
                description: String::new(),
                visual_traits: String::new(),
                theme_color: None,
            }],
            scenes: vec![Scene {
                id: "s1".to_string(),
                description: "alley".to_string(),
                mood: String::new(),
                visual_prompt: String::new(),
                image_url: None,
            }],
            nodes,
            start_node_id: "n1".to_string(),
        }
    }

    #[test]
    fn test_outline_missing_scenes_defaults_to_empty() {
        let outline = normalize_outline(&json!({
            "title": "雨夜",
            "synopsis": "凯尔与米拉的交易",
            "characters": [{"id": "kyle", "name": "凯尔"}],
            "beats": [{"id": 1, "summary": "凯尔等待", "requiredCharacters": ["kyle"]}]
        }))
        .unwrap();
        assert!(outline.scenes.is_empty());
        assert_eq!(outline.characters.len(), 1);
        assert_eq!(outline.beats[0].required_characters, vec!["kyle"]);
    }

    #[test]
    fn test_outline_defaults_and_generated_ids() {
        let outline = normalize_outline(&json!({
            "characters": [{"name": "米拉"}, "stray", {"id": "mira", "name": "dup"}, {"id": "mira"}],
            "scenes": [{"description": "小巷"}],
            "beats": [{"summary": "开场"}, {"id": "b2"}]
        }))
        .unwrap();
        assert_eq!(outline.title, UNTITLED_OUTLINE);
        let ids: Vec<&str> = outline.characters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["char_1", "mira"]);
        assert_eq!(outline.scenes[0].id, "scene_1");
        assert_eq!(outline.beats.len(), 1);
        assert_eq!(outline.beats[0].id, "1");
    }

    #[test]
    fn test_outline_rejects_non_object() {
        assert!(normalize_outline(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_fragment_fills_missing_choices() {
        let drafts = normalize_fragment(
            &json!([
                {"id": "local_1", "sceneId": "s1", "characterId": "narration", "text": "雨还在下。", "choices": []},
                {"id": "local_2", "sceneId": "s1", "characterId": "mira", "text": "你迟到了。"}
            ]),
            LABEL,
        )
        .unwrap();
        assert_eq!(drafts[0].character_id, None);
        assert_eq!(drafts[0].choices[0].target, NodeLink::NextSibling);
        assert_eq!(drafts[1].choices[0].target, NodeLink::EndOfFragment);
        assert_eq!(drafts[1].choices[0].text, LABEL);
    }

    #[test]
    fn test_fragment_parses_sentinels_and_visuals() {
        let drafts = normalize_fragment(
            &json!({"nodes": [{
                "id": "local_1",
                "text": "她举起左轮手枪。",
                "choices": [{"text": "开枪", "nextNodeId": "NEXT"}, {"text": "离开", "nextNodeId": "END_OF_FRAGMENT"}],
                "visualSpecs": {"type": "Item", "description": "左轮手枪", "visualPrompt": "an old revolver"}
            }]}),
            LABEL,
        )
        .unwrap();
        let spec = drafts[0].visual_specs.as_ref().unwrap();
        assert_eq!(spec.kind, VisualKind::Item);
        assert_eq!(drafts[0].choices[0].target, NodeLink::NextSibling);
        assert_eq!(drafts[0].choices[1].target, NodeLink::EndOfFragment);
    }

    #[test]
    fn test_follow_up_leaves_last_node_open() {
        let drafts = normalize_follow_up(
            &json!({"nodes": [
                {"id": "node_7", "sceneId": "s1", "text": "a", "choices": [{"text": "继续", "nextNodeId": "node_8"}]},
                {"id": "node_8", "sceneId": "s1", "text": "b", "choices": []}
            ]}),
            LABEL,
        )
        .unwrap();
        assert_eq!(drafts[0].choices[0].target, NodeLink::Resolved("node_8".into()));
        assert!(drafts[1].choices.is_empty());
        assert!(normalize_follow_up(&json!({"text": "no nodes"}), LABEL).is_err());
    }

    #[test]
    fn test_script_value_collects_nested_nodes() {
        let (script, report) = normalize_script_value(
            &json!({
                "title": "雨夜",
                "characters": [{"id": "mira", "name": "米拉"}],
                "scenes": [
                    {"id": "s1", "nodes": [{"id": "n1", "text": "雨没有停。", "choices": [{"text": "继续", "nextNodeId": "n2"}]}]},
                    {"id": "s2", "nodes": [{"id": "n2", "characterId": "mira", "text": "你迟到了。"}]}
                ],
                "startNodeId": "missing"
            }),
            LABEL,
        )
        .unwrap();
        assert_eq!(script.nodes.len(), 2);
        assert_eq!(script.nodes[1].scene_id, "s2");
        assert_eq!(script.start_node_id, "n1");
        assert!(script.nodes[1].is_ending);
        assert!(report.start_rebound);
    }

    #[test]
    fn test_dead_end_gets_continue_choice() {
        let mut s = script(vec![node("n1", "s1", &[]), node("n2", "s1", &[])]);
        let report = normalize_script(&mut s, LABEL).unwrap();
        assert_eq!(s.nodes[0].choices, vec![Choice::forward(LABEL, "n2")]);
        assert!(s.nodes[1].is_ending);
        assert_eq!(report.dead_ends_linked, 1);
        assert_eq!(report.endings_marked, 1);
    }

    #[test]
    fn test_dangling_choices_are_repaired() {
        let mut s = script(vec![node("n1", "s1", &["ghost"]), node("n2", "s1", &["ghost"])]);
        normalize_script(&mut s, LABEL).unwrap();
        assert!(s.dangling_choices().is_empty());
        assert_eq!(s.nodes[0].choices[0].next_node_id, "n2");
        assert!(s.nodes[1].choices.is_empty());
        assert!(s.nodes[1].is_ending);
    }

    #[test]
    fn test_unknown_scene_and_speaker_are_repaired() {
        let mut nodes = vec![node("n1", "nowhere", &["n2"]), node("n2", "s1", &["n3"]), node("n3", "fabricated", &[])];
        nodes[0].character_id = Some("MIRA".to_string());
        nodes[1].character_id = Some("narration".to_string());
        nodes[2].character_id = Some("stranger".to_string());
        let mut s = script(nodes);
        let report = normalize_script(&mut s, LABEL).unwrap();

        assert_eq!(s.nodes[0].scene_id, "s1");
        assert_eq!(s.nodes[2].scene_id, "s1");
        assert_eq!(s.nodes[0].character_id.as_deref(), Some("mira"));
        assert_eq!(s.nodes[1].character_id, None);
        assert!(s.characters.iter().any(|c| c.id == "stranger"));
        assert_eq!(report.characters_matched, 1);
        assert_eq!(report.narration_coerced, 1);
        assert_eq!(report.characters_added, 1);
        assert_eq!(report.scenes_repaired, 2);
    }

    #[test]
    fn test_empty_scene_roster_gets_placeholder() {
        let mut s = script(vec![node("n1", "s9", &[])]);
        s.scenes.clear();
        normalize_script(&mut s, LABEL).unwrap();
        assert_eq!(s.scenes.len(), 1);
        assert_eq!(s.scenes[0].id, "s9");
    }

    #[test]
    fn test_duplicate_node_ids_are_renamed() {
        let mut s = script(vec![node("n1", "s1", &["n1"]), node("n1", "s1", &[])]);
        normalize_script(&mut s, LABEL).unwrap();
        assert_eq!(s.nodes[1].id, "n1_2");
        assert_eq!(s.nodes[0].choices[0].next_node_id, "n1");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut nodes = vec![
            node("n1", "bogus", &[]),
            node("n1", "s1", &["ghost", "n1"]),
            node("", "", &["n2"]),
        ];
        nodes[2].choices[0].text = String::new();
        nodes[1].character_id = Some("narrator".to_string());
        let mut s = script(nodes);
        s.start_node_id = "nope".to_string();

        let first = normalize_script(&mut s, LABEL).unwrap();
        assert!(!first.is_clean());
        let once = s.clone();

        let second = normalize_script(&mut s, LABEL).unwrap();
        assert!(second.is_clean(), "second pass repaired: {}", second);
        assert_eq!(s, once);
    }

    #[test]
    fn test_no_nodes_is_an_error() {
        let mut s = script(vec![]);
        assert!(normalize_script(&mut s, LABEL).is_err());
    }
}
