//! Text node content and the placeholder hint behaviour.

use crate::color::SerializableColor;
use crate::config::DEFAULT_HINT_COLOR;

/// Approximate advance of one glyph relative to the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height relative to the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.16;

/// Horizontal alignment of text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "center" => TextAlign::Center,
            "right" => TextAlign::Right,
            "justify" => TextAlign::Justify,
            _ => TextAlign::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Content and typography of a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    content: String,
    pub font_size: f64,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    /// Whether the text accepts in-place editing (cursor and selection).
    interactive: bool,
    editing: bool,
    /// The content currently shown is the placeholder default, muted.
    is_hint: bool,
    default_content: Option<String>,
    /// Colour used while the hint is shown.
    pub hint_color: SerializableColor,
    /// Caret position in chars; only tracked for interactive text.
    caret: Option<usize>,
}

impl TextNode {
    pub fn new(content: impl Into<String>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            font_size,
            font_family: "sans-serif".to_string(),
            bold: false,
            italic: false,
            align: TextAlign::Left,
            interactive: false,
            editing: false,
            is_hint: false,
            default_content: None,
            hint_color: DEFAULT_HINT_COLOR,
            caret: None,
        }
    }

    /// Make the text editable in place, enabling caret tracking.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self.caret = interactive.then_some(0);
        self
    }

    /// Attach placeholder default content. When the current content equals
    /// the default it is shown as a hint.
    pub fn with_default_content(mut self, default_content: Option<String>) -> Self {
        self.is_hint = default_content
            .as_deref()
            .is_some_and(|d| !d.is_empty() && d == self.content);
        self.default_content = default_content;
        self
    }

    pub fn with_hint_color(mut self, color: SerializableColor) -> Self {
        self.hint_color = color;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn default_content(&self) -> Option<&str> {
        self.default_content.as_deref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_hint(&self) -> bool {
        self.is_hint
    }

    pub fn caret(&self) -> Option<usize> {
        self.caret
    }

    /// Hints always render italic.
    pub fn renders_italic(&self) -> bool {
        self.italic || self.is_hint
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.is_hint = false;
        if self.interactive {
            self.caret = Some(content.chars().count());
        }
        self.content = content;
    }

    /// Enter in-place editing. Hint content is cleared so the user starts
    /// from an empty string. Returns `false` for static text.
    pub fn enter_editing(&mut self) -> bool {
        if !self.interactive {
            return false;
        }
        self.editing = true;
        if self.is_hint || self.default_content.as_deref() == Some(self.content.as_str()) {
            self.content.clear();
            self.is_hint = false;
        }
        self.caret = Some(self.content.chars().count());
        true
    }

    /// Leave editing. Empty content reverts to the default as a hint.
    pub fn exit_editing(&mut self) {
        self.editing = false;
        if self.content.trim().is_empty() {
            if let Some(default) = &self.default_content {
                self.content = default.clone();
                self.is_hint = true;
            }
        }
        if self.interactive {
            self.caret = Some(self.content.chars().count());
        }
    }

    fn char_width(&self) -> f64 {
        let factor = if self.bold { CHAR_WIDTH_FACTOR * 1.1 } else { CHAR_WIDTH_FACTOR };
        self.font_size * factor
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    /// Approximate unwrapped size of the content.
    pub fn estimate_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.content.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        (
            (longest.max(1) as f64) * self.char_width(),
            lines.len().max(1) as f64 * self.line_height(),
        )
    }

    /// Greedy word wrap to `max_width`, honouring explicit newlines.
    pub fn wrap_lines(&self, max_width: f64) -> Vec<String> {
        let per_line = ((max_width / self.char_width()).floor() as usize).max(1);
        let mut out = Vec::new();
        for paragraph in self.content.split('\n') {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let needed = if line.is_empty() {
                    word.chars().count()
                } else {
                    line.chars().count() + 1 + word.chars().count()
                };
                if needed > per_line && !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            }
            out.push(line);
        }
        out
    }

    /// Approximate advance of `line` in pixels.
    pub fn line_width(&self, line: &str) -> f64 {
        line.chars().count() as f64 * self.char_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hinted() -> TextNode {
        TextNode::new("Your headline", 32.0)
            .with_interactive(true)
            .with_default_content(Some("Your headline".to_string()))
    }

    #[test]
    fn test_default_content_is_hint() {
        let text = hinted();
        assert!(text.is_hint());
        assert!(text.renders_italic());
    }

    #[test]
    fn test_enter_editing_clears_hint() {
        let mut text = hinted();
        assert!(text.enter_editing());
        assert!(text.is_editing());
        assert_eq!(text.content(), "");
        assert_eq!(text.caret(), Some(0));
    }

    #[test]
    fn test_exit_editing_restores_hint_when_empty() {
        let mut text = hinted();
        text.enter_editing();
        text.exit_editing();
        assert_eq!(text.content(), "Your headline");
        assert!(text.is_hint());

        text.enter_editing();
        text.set_content("Grand opening".to_string());
        text.exit_editing();
        assert_eq!(text.content(), "Grand opening");
        assert!(!text.is_hint());
    }

    #[test]
    fn test_static_text_cannot_edit() {
        let mut text = TextNode::new("Fixed", 12.0);
        assert!(!text.enter_editing());
        assert_eq!(text.caret(), None);
    }

    #[test]
    fn test_wrap_lines() {
        let text = TextNode::new("alpha beta gamma\ndelta", 10.0);
        // 5.5px per char, so 10 chars fit in 60px
        let lines = text.wrap_lines(60.0);
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_align_parse() {
        assert_eq!(TextAlign::parse("Center"), TextAlign::Center);
        assert_eq!(TextAlign::parse("unknown"), TextAlign::Left);
    }
}
