use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Bordered single-line text field. The cursor always sits at the end.
pub struct InputWidget<'a> {
    label: &'a str,
    value: &'a str,
    placeholder: Option<&'a str>,
    focused: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(label: &'a str, value: &'a str) -> Self {
        Self {
            label,
            value,
            placeholder: None,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let block = Block::default()
            .title(self.label)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let mut spans = Vec::new();
        match self.placeholder {
            Some(hint) if self.value.is_empty() && !self.focused => {
                spans.push(Span::styled(hint, Theme::dim()));
            }
            _ => spans.push(Span::styled(self.value, Theme::normal())),
        }
        if self.focused {
            spans.push(Span::styled(" ", Theme::selected()));
        }

        Paragraph::new(Line::from(spans)).render(inner, buf);
    }
}

/// Bordered option picker cycled with left/right.
pub struct SelectWidget<'a> {
    label: &'a str,
    options: &'a [String],
    selected: usize,
    focused: bool,
}

impl<'a> SelectWidget<'a> {
    pub fn new(label: &'a str, options: &'a [String], selected: usize) -> Self {
        Self {
            label,
            options,
            selected,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for SelectWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let block = Block::default()
            .title(self.label)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let value = self
            .options
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or("");
        let display = if self.focused {
            format!("< {} >", value)
        } else {
            value.to_string()
        };

        let style = if self.focused {
            Theme::highlight()
        } else {
            Theme::normal()
        };

        Paragraph::new(Span::styled(display, style)).render(inner, buf);
    }
}
