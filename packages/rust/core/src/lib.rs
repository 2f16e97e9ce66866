//! Application logic for the tenant chat client.
//!
//! Ties the gateway, session storage, and text parsing crates together into
//! the flows both front-ends drive: sign-up and sign-in ([`auth`]), the
//! conversation ([`chat`]), screen routing ([`router`]), and read-aloud
//! ([`speech`]).

pub mod auth;
pub mod chat;
pub mod export;
pub mod router;
pub mod session;
pub mod speech;

#[cfg(test)]
mod test_support;

pub use chat::{ChatSession, PendingTurn};
pub use router::Route;
pub use session::SessionStore;
pub use speech::SpeechPlayer;
