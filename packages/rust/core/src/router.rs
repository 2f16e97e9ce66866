//! Screen routing with the signed-in guard.

use std::fmt;

use tenantchat_shared::Result;

use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Register,
    Otp,
    Login,
    Home,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Register => "/register",
            Self::Otp => "/otp",
            Self::Login => "/login",
            Self::Home => "/home",
        }
    }

    /// Map a path to a route. `/` and unknown paths go to the login screen.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/register" => Self::Register,
            "/otp" => Self::Otp,
            "/login" => Self::Login,
            "/home" => Self::Home,
            _ => Self::Login,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Register => "Register",
            Self::Otp => "Verify OTP",
            Self::Login => "Login",
            Self::Home => "Tenant Assistant",
        };
        f.write_str(name)
    }
}

/// Where a navigation to `requested` actually lands.
pub async fn resolve(requested: Route, session: &SessionStore) -> Result<Route> {
    if requested == Route::Home && !session.is_signed_in().await? {
        tracing::debug!("no tenant phone on file, redirecting to login");
        return Ok(Route::Login);
    }
    Ok(requested)
}

/// Start-up route: Home when signed in, otherwise Login.
pub async fn initial(session: &SessionStore) -> Result<Route> {
    resolve(Route::Home, session).await
}
