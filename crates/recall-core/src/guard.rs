//! Navigation guard.
//!
//! Decides, before every navigation, whether the target route may be shown
//! for the current session or where to send the user instead.

use std::fmt;

use uuid::Uuid;

use crate::session::Session;

/// Client routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: course selection and statistics.
    Main,
    /// `/login`
    Login,
    /// `/cards/:uuid`: card-by-card review of one test session.
    Cards(Uuid),
}

impl Route {
    /// Match a path against the routing table. Unknown paths yield `None`.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Main),
            "/login" => Some(Route::Login),
            _ => trimmed
                .strip_prefix("/cards/")
                .and_then(|id| Uuid::parse_str(id).ok())
                .map(Route::Cards),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Main => "main",
            Route::Login => "login",
            Route::Cards(_) => "cards",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Main => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Cards(uuid) => write!(f, "/cards/{uuid}"),
        }
    }
}

/// Result of consulting the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Route),
}

/// Decide whether navigation to `target` may proceed.
pub fn guard(session: &Session, target: &Route) -> Decision {
    decide(session.is_telegram_context(), session.is_authenticated(), target)
}

fn decide(telegram: bool, authenticated: bool, target: &Route) -> Decision {
    if telegram {
        return Decision::Allow;
    }
    match (target, authenticated) {
        (Route::Login, true) => Decision::Redirect(Route::Main),
        (Route::Login, false) => Decision::Allow,
        (_, false) => Decision::Redirect(Route::Login),
        (_, true) => Decision::Allow,
    }
}
