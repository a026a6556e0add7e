use crate::themes::Theme;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

pub const BORDER_CHAR: &str = "─";
pub const RULE_CHAR: &str = "┄";

/// Full-width `─` border.
pub fn border(width: u16, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(BORDER_CHAR.repeat(width as usize), theme.separator))
}

/// Full-width `┄` rule used between sections.
pub fn rule(width: u16, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(RULE_CHAR.repeat(width as usize), theme.separator))
}

/// Prefix `line` with spaces so it sits in the middle of `width` columns.
pub fn centered(mut line: Line<'static>, width: u16) -> Line<'static> {
    let text_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
    let pad = (width as usize).saturating_sub(text_width) / 2;
    if pad > 0 {
        line.spans.insert(0, Span::raw(" ".repeat(pad)));
    }
    line
}

/// Boxed, centred title block:
///
/// 1. border
/// 2. title
/// 3. subtitle (when present)
/// 4. border
pub struct Header<'a> {
    pub title: &'a str,
    pub subtitle: Option<&'a str>,
    pub width: u16,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str, subtitle: Option<&'a str>, width: u16, theme: &'a Theme) -> Self {
        Self {
            title,
            subtitle,
            width,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            border(self.width, self.theme),
            centered(
                Line::from(Span::styled(self.title.to_string(), self.theme.header)),
                self.width,
            ),
        ];
        if let Some(subtitle) = self.subtitle {
            lines.push(centered(
                Line::from(Span::styled(subtitle.to_string(), self.theme.label)),
                self.width,
            ));
        }
        lines.push(border(self.width, self.theme));
        lines
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_with_subtitle_has_four_lines() {
        let theme = Theme::dark();
        let lines = Header::new("BadBits Monitor", Some("Posture and habit tracking"), 40, &theme)
            .to_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(text(&lines[0]).chars().count(), 40);
        assert_eq!(text(&lines[1]).trim(), "BadBits Monitor");
        assert_eq!(text(&lines[2]).trim(), "Posture and habit tracking");
    }

    #[test]
    fn test_header_without_subtitle() {
        let theme = Theme::dark();
        let lines = Header::new("Done", None, 20, &theme).to_lines();
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_centered_pads_left() {
        let line = centered(Line::from("abcd"), 10);
        assert_eq!(text(&line), "   abcd");
    }

    #[test]
    fn test_centered_wider_than_width_is_unchanged() {
        let line = centered(Line::from("abcdefgh"), 4);
        assert_eq!(line.spans.len(), 1);
    }

    #[test]
    fn test_rule_width() {
        let theme = Theme::dark();
        assert_eq!(text(&rule(12, &theme)).chars().count(), 12);
    }
}
