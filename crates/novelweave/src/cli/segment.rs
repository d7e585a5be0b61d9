//! Segmentation preview handler.

use super::files::read_text;
use novelweave::{should_use_streaming, split_into_segments, NovelweaveResult};
use std::path::Path;

/// Print how `input` would be segmented.
pub fn run_segment(input: &Path) -> NovelweaveResult<()> {
    let text = read_text(input)?;
    let segments = split_into_segments(&text);

    println!(
        "{} characters, {} segment(s), {}",
        text.chars().count(),
        segments.len(),
        if should_use_streaming(&text) { "streaming" } else { "single-shot" }
    );
    for (index, segment) in segments.iter().enumerate() {
        let preview: String = segment.chars().take(24).collect();
        println!("{:>3}. {:>5} chars  {}…", index + 1, segment.chars().count(), preview);
    }
    Ok(())
}
