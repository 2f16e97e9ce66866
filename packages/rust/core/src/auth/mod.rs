//! Register → OTP → login flows.
//!
//! Every flow validates its input before touching the network. Failures are
//! returned as [`TenantChatError::Form`] (bad input) or
//! [`TenantChatError::Rejected`] (the backend said no, or could not be
//! reached); both display as the popup text. On success a flow returns the
//! route to show next.

mod login;
mod otp;
mod register;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tenantchat_shared::TenantChatError;

pub use login::login;
pub use otp::verify_otp;
pub use register::{RegistrationForm, register};

pub(crate) const MSG_ENTER_PHONE: &str = "Please enter your phone number";
pub(crate) const MSG_PHONE_DIGITS: &str = "Phone number must contain only digits";

/// Keep only ASCII digits; used on every keystroke of phone and OTP inputs.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// True when `s` is non-empty and all ASCII digits.
pub(crate) fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Shared phone checks for registration and login.
pub(crate) fn check_phone(phone: &str) -> Result<(), TenantChatError> {
    if phone.trim().is_empty() {
        return Err(TenantChatError::form(MSG_ENTER_PHONE));
    }
    if !is_all_digits(phone) {
        return Err(TenantChatError::form(MSG_PHONE_DIGITS));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Duplicate-submission guard
// ---------------------------------------------------------------------------

/// Blocks a second submit while one is in flight.
#[derive(Debug, Clone, Default)]
pub struct FlowGuard {
    busy: Arc<AtomicBool>,
}

impl FlowGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. `None` while another submission holds it.
    pub fn try_begin(&self) -> Option<FlowTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlowTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its [`FlowGuard`] when dropped.
#[derive(Debug)]
pub struct FlowTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for FlowTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_filter() {
        assert_eq!(digits_only("+1 (555) 123-4567"), "15551234567");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn phone_checks() {
        assert_eq!(check_phone("  ").unwrap_err().to_string(), MSG_ENTER_PHONE);
        assert_eq!(check_phone("555-1234").unwrap_err().to_string(), MSG_PHONE_DIGITS);
        assert!(check_phone("5551234").is_ok());
    }

    #[test]
    fn guard_blocks_until_ticket_dropped() {
        let guard = FlowGuard::new();
        let ticket = guard.try_begin().expect("first submit");
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());

        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }
}
