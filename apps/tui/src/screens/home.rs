//! "Tenant Assistant" home screen: the conversation and the message input.
//!
//! Two modes. While typing, keys go to the input line and Enter sends. While
//! browsing (Esc or ↑ from the input), a cursor walks the assistant messages:
//! ←/→ pick an option, Enter sends it, `s` reads the message aloud, `x`
//! stops, `c` saves a diagnosis summary, `L` logs out.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tenantchat_core::ChatSession;
use tenantchat_markdown::{BubbleCard, BubbleLine, Inline, layout_bubble};
use tenantchat_shared::Message;

use super::Action;
use crate::widgets::input_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Typing,
    Browsing,
}

pub(crate) struct HomeScreen {
    pub chat: Option<ChatSession>,
    pub tenant_name: Option<String>,
    /// Replies still in flight; drives the typing indicator.
    pub pending: usize,
    input: String,
    mode: Mode,
    /// Index into the message list of the browsed assistant message.
    cursor: Option<usize>,
    option_idx: usize,
}

impl HomeScreen {
    pub(crate) fn new() -> Self {
        Self {
            chat: None,
            tenant_name: None,
            pending: 0,
            input: String::new(),
            mode: Mode::Typing,
            cursor: None,
            option_idx: 0,
        }
    }

    /// Start over with a fresh conversation.
    pub(crate) fn reset(&mut self, chat: ChatSession, tenant_name: Option<String>) {
        *self = Self {
            chat: Some(chat),
            tenant_name,
            ..Self::new()
        };
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.mode == Mode::Typing
    }

    fn messages(&self) -> &[Message] {
        self.chat.as_ref().map(ChatSession::messages).unwrap_or_default()
    }

    fn cursor_message(&self) -> Option<&Message> {
        self.messages().get(self.cursor?)
    }

    /// Nearest assistant message before (`back`) or after the cursor.
    fn move_cursor(&mut self, back: bool) {
        let messages = self.messages();
        let is_ai = |i: &usize| !messages[*i].is_user();
        let next = match (self.cursor, back) {
            (None, _) => (0..messages.len()).rev().find(is_ai),
            (Some(c), true) => (0..c).rev().find(is_ai),
            (Some(c), false) => (c + 1..messages.len()).find(is_ai),
        };
        if next.is_some() {
            self.cursor = next;
            self.option_idx = 0;
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Option<Action> {
        match self.mode {
            Mode::Typing => self.handle_typing(code),
            Mode::Browsing => self.handle_browsing(code),
        }
    }

    fn handle_typing(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter if !self.input.trim().is_empty() => {
                return Some(Action::Send(std::mem::take(&mut self.input)));
            }
            KeyCode::Esc | KeyCode::Up => {
                self.mode = Mode::Browsing;
                self.cursor = None;
                self.move_cursor(true);
            }
            _ => {}
        }
        None
    }

    fn handle_browsing(&mut self, code: KeyCode) -> Option<Action> {
        let card = self.cursor_message().map(layout_bubble);
        let option_count = card
            .as_ref()
            .filter(|c| c.interactive)
            .map_or(0, |c| c.options().count());

        match code {
            KeyCode::Up => self.move_cursor(true),
            KeyCode::Down => self.move_cursor(false),
            KeyCode::Left if option_count > 0 => {
                self.option_idx = (self.option_idx + option_count - 1) % option_count;
            }
            KeyCode::Right if option_count > 0 => {
                self.option_idx = (self.option_idx + 1) % option_count;
            }
            KeyCode::Enter if option_count > 0 => {
                let message = self.cursor_message()?;
                let card = card?;
                let option = card.options().nth(self.option_idx)?;
                return Some(Action::Choose {
                    message_id: message.id,
                    value: option.value.clone(),
                });
            }
            KeyCode::Char('s') => {
                return self.cursor_message().map(|m| Action::Speak(m.text.clone()));
            }
            KeyCode::Char('x') => return Some(Action::StopSpeech),
            KeyCode::Char('c') if card.as_ref().is_some_and(|c| c.copyable) => {
                return self.cursor_message().map(|m| Action::Export(m.text.clone()));
            }
            KeyCode::Char('L') => return Some(Action::Logout),
            KeyCode::Esc | KeyCode::Char('i') | KeyCode::Tab => {
                self.mode = Mode::Typing;
                self.cursor = None;
            }
            _ => {}
        }
        None
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, speaking: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(3),    // Conversation
                Constraint::Length(3), // Input
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let mut header = vec![Line::from("Tenant Assistant").style(Style::default().add_modifier(Modifier::BOLD))];
        if let Some(name) = &self.tenant_name {
            header.push(Line::from(format!("Welcome, {name}")).style(Style::default().fg(Color::Gray)));
        }
        f.render_widget(
            Paragraph::new(header).block(Block::default().borders(Borders::BOTTOM)),
            chunks[0],
        );

        let width = chunks[1].width.max(1);
        let (lines, cursor_row) = self.conversation_lines();
        let rows: Vec<u16> = lines.iter().map(|l| wrapped_rows(l, width)).collect();
        let total: u16 = rows.iter().fold(0u16, |acc, r| acc.saturating_add(*r));
        let bottom = total.saturating_sub(chunks[1].height);
        let scroll = match cursor_row {
            Some(row) if self.mode == Mode::Browsing => {
                let start = rows[..row].iter().fold(0u16, |acc, r| acc.saturating_add(*r));
                start.min(bottom)
            }
            _ => bottom,
        };
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            chunks[1],
        );

        let typing = self.mode == Mode::Typing;
        f.render_widget(input_field("Message", &self.input, typing, typing), chunks[2]);

        let hint = match (self.mode, speaking) {
            (_, true) => "Speaking · x to stop",
            (Mode::Typing, false) => "Enter to send · Esc/↑ to browse replies · Ctrl-C to quit",
            (Mode::Browsing, false) => {
                "↑↓ message · ←→ option · Enter pick · s speak · c copy · L logout · Esc type"
            }
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[3],
        );
    }

    /// Conversation rendered as lines, plus the line index where the
    /// browsed message starts.
    fn conversation_lines(&self) -> (Vec<Line<'static>>, Option<usize>) {
        let mut lines = Vec::new();
        let mut cursor_row = None;
        let chat = self.chat.as_ref();

        for (idx, message) in self.messages().iter().enumerate() {
            let is_cursor = self.mode == Mode::Browsing && self.cursor == Some(idx);
            if is_cursor {
                cursor_row = Some(lines.len());
            }
            let selected = chat.and_then(|c| c.selected_option(message.id));
            let focused_option = is_cursor.then_some(self.option_idx);
            push_bubble(&mut lines, &layout_bubble(message), is_cursor, selected, focused_option);
        }

        if self.pending > 0 {
            lines.push(Line::from(Span::styled(
                "Assistant is typing...",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )));
        }
        (lines, cursor_row)
    }
}

fn push_bubble(
    lines: &mut Vec<Line<'static>>,
    card: &BubbleCard,
    is_cursor: bool,
    selected: Option<&str>,
    focused_option: Option<usize>,
) {
    let align = if card.is_user { Alignment::Right } else { Alignment::Left };
    let who = if card.is_user { "You" } else { "Assistant" };
    let marker = if is_cursor { "▶ " } else { "" };
    lines.push(
        Line::from(Span::styled(
            format!("{marker}{who}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .alignment(align),
    );

    let mut option_no = 0;
    for line in &card.lines {
        match line {
            BubbleLine::Text(runs) => {
                lines.push(Line::from(runs.iter().map(inline_span).collect::<Vec<_>>()).alignment(align));
            }
            BubbleLine::Option(opt) => {
                let chosen = selected == Some(opt.value.as_str());
                let mut style = if chosen {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                if focused_option == Some(option_no) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let check = if chosen { "✓ " } else { "" };
                lines.push(Line::from(Span::styled(
                    format!("  [{check}{}]", BubbleLine::caption(opt)),
                    style,
                )));
                option_no += 1;
            }
        }
    }

    for doc in &card.documents {
        lines.push(Line::from(vec![
            Span::styled("  📄 ", Style::default()),
            Span::styled(doc.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", doc.url), Style::default().fg(Color::Blue)),
        ]));
    }
    if card.copyable {
        lines.push(Line::from(Span::styled(
            "  [c] Copy summary",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
}

fn inline_span(run: &Inline) -> Span<'static> {
    match run {
        Inline::Text(text) => Span::raw(text.clone()),
        Inline::Bold(text) => Span::styled(text.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Inline::Link { label, .. } => Span::styled(
            label.clone(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        ),
    }
}

/// Rows a line takes once wrapped to `width` columns (estimate).
fn wrapped_rows(line: &Line<'_>, width: u16) -> u16 {
    let w = line.width().max(1);
    u16::try_from(w.div_ceil(usize::from(width))).unwrap_or(u16::MAX)
}
