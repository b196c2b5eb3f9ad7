//! Text cleanup and sentence splitting ahead of classification.

/// Prepare article text for the classifier: underscores become spaces and
/// whitespace runs collapse to one space. Case and punctuation are kept.
pub fn preprocess_article_text(text: &str) -> String {
    text.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into sentences on `.`, `!` or `?` followed by whitespace.
///
/// The terminator stays with its sentence; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'.' || b == b'!' || b == b'?')
            && i + 1 < bytes.len()
            && bytes[i + 1].is_ascii_whitespace()
        {
            let s = text[start..=i].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            start = i + 1;
        }
    }
    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess() {
        assert_eq!(
            preprocess_article_text("  Acme__Corp\n\n rose\t5%.  "),
            "Acme Corp rose 5%."
        );
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("Acme rose. Did it? Yes! It did.");
        assert_eq!(s, vec!["Acme rose.", "Did it?", "Yes!", "It did."]);
    }

    #[test]
    fn test_split_keeps_abbreviation_without_space() {
        let s = split_sentences("Shares hit $3.50 today. Then fell");
        assert_eq!(s, vec!["Shares hit $3.50 today.", "Then fell"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }
}
