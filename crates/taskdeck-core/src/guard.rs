//! Navigation guard between public (login/register) and protected areas.

use crate::session::Session;

/// Navigation targets known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Session not resolved yet; show a loading state.
    Pending,
    Allow,
    Redirect(Route),
}

/// Guard for protected areas: anonymous users go to the login page.
pub fn protected(session: &Session) -> Access {
    if session.is_loading {
        Access::Pending
    } else if session.is_authenticated {
        Access::Allow
    } else {
        Access::Redirect(Route::Login)
    }
}

/// Guard for public areas: authenticated users go to the dashboard.
pub fn public(session: &Session) -> Access {
    if session.is_loading {
        Access::Pending
    } else if session.is_authenticated {
        Access::Redirect(Route::Dashboard)
    } else {
        Access::Allow
    }
}

/// Applies the guard matching `route`.
pub fn check(route: Route, session: &Session) -> Access {
    if route.is_protected() {
        protected(session)
    } else {
        public(session)
    }
}
