//! Prompt text for the outline, fragment and follow-up calls.

use novelweave_core::{Character, Scene, StoryBeat, END_OF_FRAGMENT};

/// System instruction for the outline call.
pub fn outline_system_instruction(language: &str) -> String {
    format!(
        r#"You are a senior literary architect and visual novel planner.
Analyze the whole novel below at the macro level and break it into a structured script outline.

Tasks:
1. Characters: extract EVERY character who appears, including minor characters with even one line of dialogue. Any speaker you miss will show up later as an unknown person. Give each a short visual description.
2. Scenes: extract every location and give each an English visualPrompt for background art.
3. Beat sheet: split the plot into ordered beats. Each beat covers roughly 200-500 characters of the source and is summarized in one sentence, without dialogue. A chapter usually yields 5-10 beats.

Write all summaries and descriptions in {language}. visualTraits and visualPrompt are in English.

Return exactly this JSON shape and nothing else, no markdown fences:
{{
  "title": "script title",
  "synopsis": "synopsis of the whole story",
  "characters": [
    {{ "id": "char_id", "name": "name", "description": "personality and role", "visualTraits": "appearance (English)" }}
  ],
  "scenes": [
    {{ "id": "scene_id", "description": "scene description", "mood": "atmosphere", "visualPrompt": "background art prompt (English)" }}
  ],
  "beats": [
    {{ "id": 1, "summary": "one-sentence event summary", "locationId": "scene_id", "requiredCharacters": ["char_id"] }}
  ]
}}"#
    )
}

/// User turn for the outline call.
pub fn outline_user_content(story_text: &str) -> String {
    format!("Analyze the following novel and produce the outline:\n\n{}", story_text)
}

fn character_lines(characters: &[Character]) -> String {
    if characters.is_empty() {
        return "- (none)".to_string();
    }
    characters
        .iter()
        .map(|c| format!("- {}: {} - {}", c.id, c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn scene_lines(scenes: &[Scene]) -> String {
    if scenes.is_empty() {
        return "- (none)".to_string();
    }
    scenes
        .iter()
        .map(|s| {
            if s.mood.is_empty() {
                format!("- {}: {}", s.id, s.description)
            } else {
                format!("- {}: {} (mood: {})", s.id, s.description, s.mood)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const NODE_RULES: &str = r#"Node rules:
- Dialogue nodes: `text` holds ONLY the words the character speaks. Never include attributions such as "he said", action beats, or descriptions of expression. Never cut off the first character of a line.
- Narration nodes: scenery, actions and expressions go in separate nodes with "characterId": null.
- Inner monologue, thoughts and talking to oneself are dialogue of that character (characterId is the character's id), never narration.
- sceneId must be taken from the scene list. Never invent scene ids.
- characterId must be taken from the character list or be null."#;

/// System instruction for one fragment call.
pub fn fragment_system_instruction(
    characters: &[Character],
    scenes: &[Scene],
    beats: &[StoryBeat],
    previous_context: Option<&str>,
    language: &str,
    continue_label: &str,
) -> String {
    let beat_lines = beats
        .iter()
        .map(|b| format!("- Beat {}: {}", b.id, b.summary))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are the storyboard director of a visual novel script engine.
Using the source novel and the beat sheet, generate detailed dialogue and narration nodes for ONLY the beats listed below.

Characters:
{characters}

Available scenes:
{scenes}

Previously: {previous}

Generate nodes covering only these beats:
{beats}

{rules}
- Linking: unless a node is a branch point with 2-3 choices, give it exactly one choice labelled "{label}" whose nextNodeId is "NEXT"; it is replaced with the real id during assembly.
- The last node's choice has nextNodeId "{end}".
- Special visuals: when the plot shows a key item (picking up a revolver, reading an old notebook) or a striking moment (checking a wound in a mirror), add
  "visualSpecs": {{ "type": "item" | "cg", "description": "what is shown", "visualPrompt": "English art prompt" }}.
  Use "item" for a concrete object and "cg" for an immersive scene.

Write node text in {language}. Return a bare JSON array of nodes, for example:
[
  {{ "id": "local_1", "characterId": null, "text": "The rain had not stopped.", "sceneId": "s1", "choices": [{{ "text": "{label}", "nextNodeId": "local_2" }}] }},
  {{ "id": "local_2", "characterId": "char_1", "text": "You're late.", "sceneId": "s1", "choices": [{{ "text": "{label}", "nextNodeId": "{end}" }}] }}
]"#,
        characters = character_lines(characters),
        scenes = scene_lines(scenes),
        previous = previous_context.unwrap_or("(none, this is the opening)"),
        beats = beat_lines,
        rules = NODE_RULES,
        label = continue_label,
        end = END_OF_FRAGMENT,
    )
}

/// User turn for one fragment call.
pub fn fragment_user_content(story_text: &str) -> String {
    format!(
        "Source novel:\n{}\n\nGenerate the script nodes for the beats above:",
        story_text
    )
}

/// System instruction for a streaming follow-up call.
pub fn follow_up_system_instruction(
    characters: &[Character],
    scenes: &[Scene],
    last_node_text: &str,
    first_node_number: usize,
    language: &str,
    continue_label: &str,
) -> String {
    format!(
        r#"You are a top visual novel director and game designer.
Rework the novel excerpt below into the NEXT script nodes of an existing visual novel.

Existing characters (use these ids):
{characters}

Existing scenes (use these ids):
{scenes}

Story so far ends with:
"{last}"

{rules}
- Node ids have the form "node_N" with N counting up from {first}. Every nextNodeId must point at one of your new nodes.
- Turn the excerpt into 3-5 consecutive nodes. Mostly advance linearly with a single "{label}" choice; offer 2-3 choices only at key turning points.
- The last node has an empty choices array; it continues with the next excerpt.

Write node text in {language}. Reply with pure JSON only, no prose and no markdown:
{{
  "nodes": [
    {{ "id": "node_{first}", "sceneId": "string", "characterId": "string or null", "text": "string", "choices": [{{ "text": "string", "nextNodeId": "string" }}] }}
  ]
}}"#,
        characters = character_lines(characters),
        scenes = scene_lines(scenes),
        last = last_node_text,
        rules = NODE_RULES,
        first = first_node_number,
        label = continue_label,
    )
}

/// User turn for a streaming follow-up call.
pub fn follow_up_user_content(segment_text: &str) -> String {
    format!(
        "Turn the following excerpt into the next script nodes:\n\n{}",
        segment_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_prompt_lists_rosters_and_sentinels() {
        let characters = vec![Character {
            id: "mira".to_string(),
            name: "米拉".to_string(),
            description: "informant".to_string(),
            visual_traits: String::new(),
            theme_color: None,
        }];
        let beats = vec![StoryBeat {
            id: "3".to_string(),
            summary: "米拉索要驱动器".to_string(),
            location_id: None,
            required_characters: vec![],
        }];
        let prompt =
            fragment_system_instruction(&characters, &[], &beats, Some("你迟到了。"), "Simplified Chinese", "继续");

        assert!(prompt.contains("- mira: 米拉 - informant"));
        assert!(prompt.contains("- Beat 3: 米拉索要驱动器"));
        assert!(prompt.contains("Previously: 你迟到了。"));
        assert!(prompt.contains(END_OF_FRAGMENT));
        assert!(prompt.contains("\"NEXT\""));
    }

    #[test]
    fn test_follow_up_prompt_numbers_nodes() {
        let prompt = follow_up_system_instruction(&[], &[], "雨没有停。", 12, "Simplified Chinese", "继续");
        assert!(prompt.contains("counting up from 12"));
        assert!(prompt.contains("\"node_12\""));
        assert!(prompt.contains("\"雨没有停。\""));
    }
}
