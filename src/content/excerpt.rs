//! Plain-text excerpt generation.

use std::sync::Arc;

use crate::render::Converter;

const DEFAULT_WORD_COUNT: usize = 55;
const DEFAULT_MORE_TEXT: &str = "…";

/// Produces plain-text excerpts from Markdown sources.
///
/// Conversion goes through the same [`Converter`] the render pipeline uses,
/// so excerpts reflect what readers actually see rather than raw Markdown
/// syntax. Tags are stripped afterwards, whitespace runs collapse to single
/// spaces, and the result is trimmed to a word budget.
pub struct ExcerptGenerator {
    converter: Arc<dyn Converter>,
    word_count: usize,
    more_text: String,
}

impl ExcerptGenerator {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self {
            converter,
            word_count: DEFAULT_WORD_COUNT,
            more_text: DEFAULT_MORE_TEXT.to_string(),
        }
    }

    /// Word budget before the excerpt is cut. Clamped to at least 1.
    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count.max(1);
        self
    }

    /// Indicator appended only when trimming occurred.
    pub fn with_more_text(mut self, more_text: impl Into<String>) -> Self {
        self.more_text = more_text.into();
        self
    }

    /// Excerpt straight from Markdown source.
    pub fn from_markdown(&self, markdown: &str) -> String {
        self.from_html(&self.converter.convert(markdown))
    }

    /// Excerpt from already-rendered HTML.
    pub fn from_html(&self, html: &str) -> String {
        let text = strip_tags(html);
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.is_empty() {
            return String::new();
        }
        if words.len() <= self.word_count {
            return words.join(" ");
        }

        let mut excerpt = words[..self.word_count].join(" ");
        excerpt.push_str(&self.more_text);
        excerpt
    }
}

fn strip_tags(html: &str) -> String {
    ammonia::Builder::empty().clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ComrakConverter;

    fn generator() -> ExcerptGenerator {
        ExcerptGenerator::new(Arc::new(ComrakConverter::default()))
    }

    #[test]
    fn strips_markup_down_to_text() {
        let excerpt = generator().from_markdown(
            "# Title\n\nSome **bold** text with a [link](https://example.com).",
        );

        assert_eq!(excerpt, "Title Some bold text with a link.");
    }

    #[test]
    fn trims_to_word_budget_and_appends_indicator() {
        let source = (1..=20)
            .map(|n| format!("word{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        let excerpt = generator().with_word_count(10).from_markdown(&source);

        assert!(excerpt.ends_with('…'));
        assert_eq!(excerpt.trim_end_matches('…').split_whitespace().count(), 10);
    }

    #[test]
    fn short_text_is_left_whole() {
        let excerpt = generator().from_markdown("Just five words right here.");

        assert_eq!(excerpt, "Just five words right here.");
        assert!(!excerpt.contains('…'));
    }

    #[test]
    fn collapses_whitespace_runs() {
        let excerpt = generator().from_html("<p>spaced    out</p>\n\n<p>lines</p>");

        assert_eq!(excerpt, "spaced out lines");
    }

    #[test]
    fn empty_markdown_yields_empty_excerpt() {
        assert_eq!(generator().from_markdown(""), "");
    }

    #[test]
    fn custom_more_text_is_used() {
        let source = (1..=20)
            .map(|n| format!("word{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        let excerpt = generator()
            .with_word_count(5)
            .with_more_text(" [more]")
            .from_markdown(&source);

        assert!(excerpt.ends_with(" [more]"));
    }
}
