//! "Login" screen: phone number, submit, and a link to registration.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tenantchat_core::Route;
use tenantchat_core::auth::digits_only;

use super::Action;
use crate::widgets::{button, centered_rect, input_field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Phone,
    Submit,
    Register,
}

pub(crate) struct LoginScreen {
    phone: String,
    focused: Field,
}

impl LoginScreen {
    pub(crate) fn new() -> Self {
        Self {
            phone: String::new(),
            focused: Field::Phone,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.focused == Field::Phone
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, busy: bool) {
        let card = centered_rect(60, 70, area);
        let block = Block::default().borders(Borders::ALL).title(" Sign in ");
        let inner = block.inner(card);
        f.render_widget(block, card);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2), // Intro
                Constraint::Length(3), // Phone
                Constraint::Length(1), // Gap
                Constraint::Length(1), // Submit
                Constraint::Length(1), // Gap
                Constraint::Length(1), // Register link
                Constraint::Min(0),
            ])
            .split(inner);

        let intro = Paragraph::new("Enter the phone number you registered with, including the country code.")
            .style(Style::default().fg(Color::Gray))
            .wrap(ratatui::widgets::Wrap { trim: true });
        f.render_widget(intro, chunks[0]);

        f.render_widget(
            input_field(
                "Phone number (digits only)",
                &self.phone,
                self.focused == Field::Phone,
                self.focused == Field::Phone,
            ),
            chunks[1],
        );

        let label = if busy { "Signing in..." } else { "Login" };
        f.render_widget(button(label, self.focused == Field::Submit), chunks[3]);
        f.render_widget(
            button("New here? Register", self.focused == Field::Register),
            chunks[5],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char(c) if self.focused == Field::Phone => {
                self.phone.push_str(&digits_only(&c.to_string()));
            }
            KeyCode::Backspace if self.focused == Field::Phone => {
                self.phone.pop();
            }
            KeyCode::Enter => {
                return match self.focused {
                    Field::Phone | Field::Submit => Some(Action::Login(self.phone.clone())),
                    Field::Register => Some(Action::Navigate(Route::Register)),
                };
            }
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            _ => {}
        }
        None
    }

    fn next_field(&mut self) {
        self.focused = match self.focused {
            Field::Phone => Field::Submit,
            Field::Submit => Field::Register,
            Field::Register => Field::Phone,
        };
    }

    fn prev_field(&mut self) {
        self.focused = match self.focused {
            Field::Phone => Field::Register,
            Field::Submit => Field::Phone,
            Field::Register => Field::Submit,
        };
    }
}
