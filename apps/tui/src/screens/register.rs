//! "Register" screen: name, email, country code, phone.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tenantchat_core::Route;
use tenantchat_core::auth::{RegistrationForm, digits_only};
use tenantchat_shared::RegistrationConfig;

use super::Action;
use crate::widgets::{button, centered_rect, focus_style, input_field};

/// Which input field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
    CountryCode,
    Phone,
    Submit,
    Login,
}

const ORDER: [Field; 6] = [
    Field::Name,
    Field::Email,
    Field::CountryCode,
    Field::Phone,
    Field::Submit,
    Field::Login,
];

pub(crate) struct RegisterScreen {
    name: String,
    email: String,
    phone: String,
    country_codes: Vec<String>,
    country_idx: usize,
    focused: Field,
}

impl RegisterScreen {
    pub(crate) fn new(config: &RegistrationConfig) -> Self {
        let mut country_codes = config.country_codes.clone();
        if country_codes.is_empty() {
            country_codes.push(config.default_country_code.clone());
        }
        let country_idx = country_codes
            .iter()
            .position(|c| *c == config.default_country_code)
            .unwrap_or(0);
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            country_codes,
            country_idx,
            focused: Field::Name,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        matches!(self.focused, Field::Name | Field::Email | Field::Phone)
    }

    fn form(&self) -> RegistrationForm {
        RegistrationForm {
            full_name: self.name.clone(),
            email: self.email.clone(),
            country_code: self.country_codes[self.country_idx].clone(),
            phone: self.phone.clone(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, busy: bool) {
        let card = centered_rect(60, 90, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Create your tenant account ");
        let inner = block.inner(card);
        f.render_widget(block, card);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Name
                Constraint::Length(3), // Email
                Constraint::Length(3), // Country code
                Constraint::Length(3), // Phone
                Constraint::Length(1), // Gap
                Constraint::Length(1), // Submit
                Constraint::Length(1), // Gap
                Constraint::Length(1), // Login link
                Constraint::Min(0),
            ])
            .split(inner);

        f.render_widget(self.text_field("Full name", &self.name, Field::Name), chunks[0]);
        f.render_widget(self.text_field("Email", &self.email, Field::Email), chunks[1]);

        let code_block = Block::default()
            .borders(Borders::ALL)
            .title(" Country code ")
            .border_style(focus_style(self.focused == Field::CountryCode, false));
        let code = Paragraph::new(format!(
            "< {} >  (← → to change)",
            self.country_codes[self.country_idx]
        ))
        .block(code_block);
        f.render_widget(code, chunks[2]);

        f.render_widget(
            self.text_field("Phone number (digits only)", &self.phone, Field::Phone),
            chunks[3],
        );

        let label = if busy { "Registering..." } else { "Register" };
        f.render_widget(button(label, self.focused == Field::Submit), chunks[5]);
        f.render_widget(
            button("Already registered? Login", self.focused == Field::Login),
            chunks[7],
        );
    }

    fn text_field<'a>(&self, title: &'a str, value: &'a str, which: Field) -> Paragraph<'a> {
        let focused = self.focused == which;
        input_field(title, value, focused, focused)
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char(c) if self.is_editing() => match self.focused {
                Field::Phone => self.phone.push_str(&digits_only(&c.to_string())),
                Field::Name => self.name.push(c),
                Field::Email => self.email.push(c),
                _ => {}
            },
            KeyCode::Backspace if self.is_editing() => {
                match self.focused {
                    Field::Phone => self.phone.pop(),
                    Field::Name => self.name.pop(),
                    Field::Email => self.email.pop(),
                    _ => None,
                };
            }
            KeyCode::Left if self.focused == Field::CountryCode => self.cycle_country(false),
            KeyCode::Right if self.focused == Field::CountryCode => self.cycle_country(true),
            KeyCode::Enter => {
                return match self.focused {
                    Field::Login => Some(Action::Navigate(Route::Login)),
                    Field::CountryCode => {
                        self.cycle_country(true);
                        None
                    }
                    _ => Some(Action::Register(self.form())),
                };
            }
            KeyCode::Tab | KeyCode::Down => self.step(1),
            KeyCode::BackTab | KeyCode::Up => self.step(ORDER.len() - 1),
            _ => {}
        }
        None
    }

    fn step(&mut self, by: usize) {
        let idx = ORDER.iter().position(|f| *f == self.focused).unwrap_or(0);
        self.focused = ORDER[(idx + by) % ORDER.len()];
    }

    fn cycle_country(&mut self, forward: bool) {
        let n = self.country_codes.len();
        self.country_idx = if forward {
            (self.country_idx + 1) % n
        } else {
            (self.country_idx + n - 1) % n
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(screen: &mut RegisterScreen, text: &str) {
        for c in text.chars() {
            screen.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn fills_form_in_order() {
        let mut screen = RegisterScreen::new(&RegistrationConfig::default());
        type_text(&mut screen, "Ada Lovelace");
        screen.handle_key(KeyCode::Tab);
        type_text(&mut screen, "ada@example.com");
        screen.handle_key(KeyCode::Tab);
        screen.handle_key(KeyCode::Right);
        screen.handle_key(KeyCode::Tab);
        type_text(&mut screen, "555-1234");

        let Some(Action::Register(form)) = screen.handle_key(KeyCode::Enter) else {
            panic!("expected a register action");
        };
        assert_eq!(form.full_name, "Ada Lovelace");
        assert_eq!(form.email, "ada@example.com");
        assert_eq!(form.country_code, "+44");
        assert_eq!(form.phone, "5551234");
    }

    #[test]
    fn country_code_wraps_backwards() {
        let mut screen = RegisterScreen::new(&RegistrationConfig::default());
        screen.handle_key(KeyCode::Tab);
        screen.handle_key(KeyCode::Tab);
        screen.handle_key(KeyCode::Left);
        assert_eq!(screen.form().country_code, "+65");
    }
}
