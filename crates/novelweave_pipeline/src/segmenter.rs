//! Splitting long input into segments at natural boundaries.
//!
//! Lengths are counted in Unicode scalar values so CJK text is measured the
//! way a reader sees it.

/// Inputs longer than this many characters are processed in segments.
pub const STORY_SEGMENT_THRESHOLD: usize = 5000;

/// Target length of one segment in characters.
pub const SEGMENT_SIZE: usize = 3000;

/// How far around [`SEGMENT_SIZE`] a blank line may be used as the cut.
const PARAGRAPH_WINDOW: usize = 500;

/// How far around [`SEGMENT_SIZE`] a sentence end may be used as the cut.
const SENTENCE_WINDOW: usize = 200;

/// Characters that end a sentence.
pub const SENTENCE_TERMINATORS: [char; 6] = ['。', '！', '？', '!', '?', '.'];

/// Whether `text` is long enough for the streaming pipeline.
///
/// # Examples
///
/// ```
/// use novelweave_pipeline::should_use_streaming;
///
/// assert!(!should_use_streaming("雨没有停。"));
/// assert!(should_use_streaming(&"字".repeat(5001)));
/// ```
pub fn should_use_streaming(text: &str) -> bool {
    text.chars().count() > STORY_SEGMENT_THRESHOLD
}

/// Split `text` into ordered, trimmed segments.
///
/// Text at or under [`STORY_SEGMENT_THRESHOLD`] comes back as one segment.
/// Longer text is cut repeatedly, preferring a blank line near
/// [`SEGMENT_SIZE`], then a sentence terminator, then a hard cut at exactly
/// [`SEGMENT_SIZE`]. The remainder is always emitted, however short.
#[tracing::instrument(skip(text), fields(text_chars = text.chars().count(), segments = tracing::field::Empty))]
pub fn split_into_segments(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let trimmed = normalized.trim();

    if trimmed.chars().count() <= STORY_SEGMENT_THRESHOLD {
        tracing::Span::current().record("segments", 1);
        return vec![trimmed.to_string()];
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut segments = Vec::new();
    let mut rest: &[char] = &chars;

    while rest.len() > SEGMENT_SIZE {
        let cut = paragraph_cut(rest)
            .or_else(|| sentence_cut(rest))
            .unwrap_or(SEGMENT_SIZE);

        let segment = collect_trimmed(&rest[..cut]);
        if !segment.is_empty() {
            segments.push(segment);
        }
        rest = trim_start(&rest[cut..]);
    }

    let tail = collect_trimmed(rest);
    if !tail.is_empty() {
        segments.push(tail);
    }

    tracing::Span::current().record("segments", segments.len());
    tracing::debug!(
        lengths = ?segments.iter().map(|s| s.chars().count()).collect::<Vec<_>>(),
        "Text segmented"
    );
    segments
}

/// End of a cut at the first blank line inside the paragraph window.
fn paragraph_cut(chars: &[char]) -> Option<usize> {
    let last = (SEGMENT_SIZE + PARAGRAPH_WINDOW).min(chars.len().saturating_sub(2));
    (SEGMENT_SIZE - PARAGRAPH_WINDOW..=last)
        .find(|&i| chars[i] == '\n' && chars[i + 1] == '\n')
        .map(|i| i + 2)
}

/// End of a cut just after the first sentence terminator inside the sentence window.
fn sentence_cut(chars: &[char]) -> Option<usize> {
    let last = (SEGMENT_SIZE + SENTENCE_WINDOW).min(chars.len().saturating_sub(1));
    (SEGMENT_SIZE - SENTENCE_WINDOW..=last)
        .find(|&i| SENTENCE_TERMINATORS.contains(&chars[i]))
        .map(|i| i + 1)
}

fn trim_start(chars: &[char]) -> &[char] {
    let skip = chars.iter().take_while(|c| c.is_whitespace()).count();
    &chars[skip..]
}

fn collect_trimmed(chars: &[char]) -> String {
    chars.iter().collect::<String>().trim().to_string()
}
