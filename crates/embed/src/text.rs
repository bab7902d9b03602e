/// Collapse line breaks and keep at most `max_chars` characters
pub fn clean_description(description: &str, max_chars: usize) -> String {
    description
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(max_chars)
        .collect()
}

/// Text handed to the embedding provider for one record.
///
/// Pre-enriched text wins when present; otherwise title and description are
/// combined so the model sees both who the creator is and what they do.
pub fn compose_embedding_text(
    title: &str,
    description: &str,
    rich_text: Option<&str>,
    max_description_chars: usize,
) -> String {
    if let Some(rich) = rich_text.map(str::trim).filter(|s| !s.is_empty()) {
        return rich.to_string();
    }

    let cleaned = clean_description(description, max_description_chars);
    format!("{} - {}", title.trim(), cleaned.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("a\nb\r\nc", 100), "a b  c");
        assert_eq!(clean_description("abcdef", 3), "abc");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "유튜브 크리에이터";
        assert_eq!(clean_description(text, 3), "유튜브");
    }

    #[test]
    fn test_compose_embedding_text() {
        let text = compose_embedding_text("Markiplier", "Horror games\nand sketches", None, 3000);
        assert_eq!(text, "Markiplier - Horror games and sketches");
    }

    #[test]
    fn test_rich_text_wins() {
        let text = compose_embedding_text(
            "Markiplier",
            "Horror games",
            Some("Markiplier - Horror games. Recent Videos: FNAF"),
            3000,
        );
        assert_eq!(text, "Markiplier - Horror games. Recent Videos: FNAF");

        let text = compose_embedding_text("Markiplier", "Horror games", Some("   "), 3000);
        assert_eq!(text, "Markiplier - Horror games");
    }
}
