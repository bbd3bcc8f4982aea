use serde::{Deserialize, Serialize};

/// Presentation style of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    #[default]
    Text,
    /// First line of a page (`user@host:~$ `)
    Title,
    /// Trailing prompt line; receives the blinking cursor once everything is shown
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Text,
    Heart,
    Link,
    /// Display slot of the interest cycler
    Cycle,
}

/// A run of text inside a block. Nested elements (links, the heart, the
/// cycling word) are their own segments so a reveal can keep their
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub kind: SegmentKind,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            text: text.into(),
            href: None,
        }
    }

    pub fn heart() -> Self {
        Self {
            kind: SegmentKind::Heart,
            text: "❤".to_string(),
            href: None,
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Link,
            text: text.into(),
            href: Some(href.into()),
        }
    }

    pub fn cycle(initial: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Cycle,
            text: initial.into(),
            href: None,
        }
    }

    #[inline]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of page content subject to reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Position in the page; assigned when the page is loaded
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub style: BlockStyle,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl ContentBlock {
    pub fn new(order: usize, style: BlockStyle, segments: Vec<Segment>) -> Self {
        Self { order, style, segments }
    }

    /// Single-segment plain text block.
    pub fn plain(order: usize, text: impl Into<String>) -> Self {
        Self::new(order, BlockStyle::Text, vec![Segment::text(text)])
    }

    /// Full text the block displays once revealed.
    pub fn target_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[inline]
    pub fn is_prompt(&self) -> bool {
        self.style == BlockStyle::Prompt
    }

    pub fn char_len(&self) -> usize {
        self.segments.iter().map(Segment::char_len).sum()
    }

    /// Index of the cycling segment, if this block hosts one.
    pub fn cycle_segment(&self) -> Option<usize> {
        self.segments.iter().position(|s| s.kind == SegmentKind::Cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_text_joins_segments() {
        let block = ContentBlock::new(
            3,
            BlockStyle::Text,
            vec![Segment::text("I "), Segment::heart(), Segment::text(" "), Segment::cycle("CI/CD")],
        );
        assert_eq!(block.target_text(), "I ❤ CI/CD");
        assert_eq!(block.char_len(), 9);
        assert_eq!(block.cycle_segment(), Some(3));
        assert!(!block.is_prompt());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let block: ContentBlock = serde_yaml::from_str("style: prompt").unwrap();
        assert!(block.is_prompt());
        assert_eq!(block.target_text(), "");

        let seg: Segment = serde_yaml::from_str("kind: cycle").unwrap();
        assert_eq!(seg.kind, SegmentKind::Cycle);
        assert_eq!(seg.text, "");
    }
}
