//! TUI screen definitions.
//!
//! One screen per route. Screens own their form state and turn key presses
//! into [`Action`]s; the app performs the actions.

mod home;
mod login;
mod otp;
mod register;

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use tenantchat_core::Route;
use tenantchat_core::auth::RegistrationForm;
use tenantchat_shared::RegistrationConfig;

pub(crate) use home::HomeScreen;

/// Something a screen asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Navigate(Route),
    Register(RegistrationForm),
    VerifyOtp(String),
    Login(String),
    Send(String),
    Choose { message_id: u64, value: String },
    Speak(String),
    StopSpeech,
    Export(String),
    Logout,
}

/// Per-route screen state.
pub(crate) struct Screens {
    pub login: login::LoginScreen,
    pub register: register::RegisterScreen,
    pub otp: otp::OtpScreen,
    pub home: HomeScreen,
}

impl Screens {
    pub(crate) fn new(registration: &RegistrationConfig) -> Self {
        Self {
            login: login::LoginScreen::new(),
            register: register::RegisterScreen::new(registration),
            otp: otp::OtpScreen::new(),
            home: HomeScreen::new(),
        }
    }

    /// Whether the current screen has an active text input field.
    pub(crate) fn is_editing(&self, route: Route) -> bool {
        match route {
            Route::Login => self.login.is_editing(),
            Route::Register => self.register.is_editing(),
            Route::Otp => self.otp.is_editing(),
            Route::Home => self.home.is_editing(),
        }
    }

    pub(crate) fn draw(&self, route: Route, f: &mut Frame, area: Rect, busy: bool, speaking: bool) {
        match route {
            Route::Login => self.login.draw(f, area, busy),
            Route::Register => self.register.draw(f, area, busy),
            Route::Otp => self.otp.draw(f, area, busy),
            Route::Home => self.home.draw(f, area, speaking),
        }
    }

    pub(crate) fn handle_key(&mut self, route: Route, code: KeyCode) -> Option<Action> {
        match route {
            Route::Login => self.login.handle_key(code),
            Route::Register => self.register.handle_key(code),
            Route::Otp => self.otp.handle_key(code),
            Route::Home => self.home.handle_key(code),
        }
    }
}
