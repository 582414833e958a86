//! Packs a title, a summary and a link into a fixed character budget.
//!
//! The summary and the link are never cut. Only the title gives way: it is
//! kept whole when it fits, truncated with an ellipsis when at least
//! [`MIN_TITLE_SPACE`] characters remain, and dropped otherwise.
//! A title that is empty after cleaning is always dropped, so a post never
//! starts with a blank separator.
//! All lengths are counted in characters, not bytes.

use pb_core::{PackedPost, TitleLayout};

pub const DEFAULT_POST_BUDGET: usize = 280;

/// Two blank-line separators of two line breaks each.
pub const SEPARATOR_CHARS: usize = 4;

/// Below this many free characters the title is omitted.
pub const MIN_TITLE_SPACE: i64 = 10;

const ELLIPSIS: &str = "...";

/// Listing titles sometimes keep their "Title:" label.
pub fn clean_title(title: &str) -> String {
    title.replace("Title:", "").trim().to_string()
}

pub fn pack_post(title: &str, summary: &str, url: &str, budget: usize) -> PackedPost {
    let title = clean_title(title);
    let fixed = summary.chars().count() + url.chars().count() + SEPARATOR_CHARS;
    let available = budget as i64 - fixed as i64;
    let title_chars = title.chars().count() as i64;

    let (text, layout) = if title.is_empty() {
        (format!("{}\n\n{}", summary, url), TitleLayout::Omitted)
    } else if title_chars <= available {
        (format!("{}\n\n{}\n\n{}", title, summary, url), TitleLayout::Full)
    } else if available >= MIN_TITLE_SPACE {
        let kept_chars = (available - ELLIPSIS.len() as i64) as usize;
        let truncated: String = title.chars().take(kept_chars).collect();
        (
            format!("{}{}\n\n{}\n\n{}", truncated, ELLIPSIS, summary, url),
            TitleLayout::Truncated { kept_chars },
        )
    } else {
        (format!("{}\n\n{}", summary, url), TitleLayout::Omitted)
    };

    let length = text.chars().count();
    let post = PackedPost {
        text,
        layout,
        available_for_title: available,
        length,
        budget,
    };

    match post.layout {
        TitleLayout::Full => {
            tracing::debug!(remaining = available - title_chars, "Title kept whole");
        }
        TitleLayout::Truncated { kept_chars } => {
            tracing::info!(kept_chars, summary_chars = fixed - SEPARATOR_CHARS - url.chars().count(), "⚠️ Title truncated");
        }
        TitleLayout::Omitted => {
            tracing::warn!(available, "⚠️ Not enough room for the title, posting summary and link only");
        }
    }
    if post.exceeds_budget() {
        tracing::error!(length = post.length, budget, "❌ Post still exceeds the character budget");
    }

    post
}
