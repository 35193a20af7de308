//! Image retention for model context.
//!
//! Only the image from the most recent user turn that carried one is passed
//! to the model. Everything else in the history is reduced to its text.

use super::types::{ContentBlock, Role, Turn};

/// Build the model view of a history.
///
/// Text blocks are kept unchanged. The newest user turn containing an image
/// keeps its last image block; every other image block is dropped. Turns left
/// with no content are removed.
pub fn sanitize_history(turns: &[Turn]) -> Vec<Turn> {
    let keep_at = turns
        .iter()
        .rposition(|t| t.role == Role::User && t.has_image());

    turns
        .iter()
        .enumerate()
        .filter_map(|(idx, turn)| {
            let kept_image = if Some(idx) == keep_at {
                turn.content.iter().rposition(ContentBlock::is_image)
            } else {
                None
            };

            let content: Vec<ContentBlock> = turn
                .content
                .iter()
                .enumerate()
                .filter(|(pos, block)| !block.is_image() || Some(*pos) == kept_image)
                .map(|(_, block)| block.clone())
                .collect();

            if content.is_empty() {
                None
            } else {
                Some(Turn {
                    role: turn.role,
                    content,
                    timestamp: turn.timestamp,
                })
            }
        })
        .collect()
}

/// Count image blocks across a history.
pub fn image_count(turns: &[Turn]) -> usize {
    turns.iter().map(|t| t.images().count()).sum()
}
