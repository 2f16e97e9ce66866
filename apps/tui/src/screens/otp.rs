//! "Verify OTP" screen.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tenantchat_core::Route;
use tenantchat_core::auth::digits_only;

use super::Action;
use crate::widgets::{button, centered_rect, input_field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Code,
    Verify,
}

pub(crate) struct OtpScreen {
    code: String,
    focused: Field,
}

impl OtpScreen {
    pub(crate) fn new() -> Self {
        Self {
            code: String::new(),
            focused: Field::Code,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.focused == Field::Code
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, busy: bool) {
        let card = centered_rect(50, 60, area);
        let block = Block::default().borders(Borders::ALL).title(" Verify OTP ");
        let inner = block.inner(card);
        f.render_widget(block, card);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let intro = Paragraph::new("Enter the one-time code we sent to your phone.")
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        f.render_widget(intro, chunks[0]);

        let editing = self.focused == Field::Code;
        f.render_widget(input_field("OTP code", &self.code, editing, editing), chunks[1]);

        let label = if busy { "Verifying..." } else { "Verify" };
        f.render_widget(button(label, self.focused == Field::Verify), chunks[3]);

        let back = Paragraph::new("Wrong number? Esc to register again")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(back, chunks[4]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char(c) if self.is_editing() => self.code.push_str(&digits_only(&c.to_string())),
            KeyCode::Backspace if self.is_editing() => {
                self.code.pop();
            }
            KeyCode::Enter => return Some(Action::VerifyOtp(self.code.clone())),
            KeyCode::Esc => return Some(Action::Navigate(Route::Register)),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focused = match self.focused {
                    Field::Code => Field::Verify,
                    Field::Verify => Field::Code,
                };
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_digits_only() {
        let mut screen = OtpScreen::new();
        for c in "12 3-4x".chars() {
            screen.handle_key(KeyCode::Char(c));
        }
        assert!(matches!(screen.handle_key(KeyCode::Enter), Some(Action::VerifyOtp(c)) if c == "1234"));
    }

    #[test]
    fn esc_goes_back_to_registration() {
        let mut screen = OtpScreen::new();
        screen.handle_key(KeyCode::Char('9'));
        assert!(matches!(
            screen.handle_key(KeyCode::Esc),
            Some(Action::Navigate(Route::Register))
        ));
    }
}
