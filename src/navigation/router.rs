//! Session-driven top-level routing

use crate::auth::{Session, SessionState, User};
use tokio::sync::watch;

use super::profile::{profile_for, RoleNavigationProfile, ScreenId, TabId};

/// Where the app should be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Session restoration still running
    Splash,
    Login,
    Main {
        user: User,
        profile: RoleNavigationProfile,
    },
}

impl Destination {
    /// Resolve the destination for a session snapshot
    pub fn resolve(state: &SessionState) -> Self {
        if !state.ready {
            return Destination::Splash;
        }
        Self::for_session(&state.session)
    }

    pub fn for_session(session: &Session) -> Self {
        match session {
            Session::LoggedOut => Destination::Login,
            Session::LoggedIn { user, .. } => Destination::Main {
                user: user.clone(),
                profile: profile_for(user.role),
            },
        }
    }

    pub fn profile(&self) -> Option<&RoleNavigationProfile> {
        match self {
            Destination::Main { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn can_open_tab(&self, tab: TabId) -> bool {
        self.profile().is_some_and(|p| p.allows_tab(tab))
    }

    pub fn can_open_screen(&self, screen: ScreenId) -> bool {
        self.profile().is_some_and(|p| p.allows_screen(screen))
    }
}

/// Tracks the destination as the session changes
pub struct NavigationRouter {
    session: watch::Receiver<SessionState>,
    current: Destination,
}

impl NavigationRouter {
    /// Create a router from a session subscription
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        let current = Destination::resolve(&session.borrow());
        Self { session, current }
    }

    pub fn current(&self) -> &Destination {
        &self.current
    }

    /// Wait for the next session change and return the new destination
    ///
    /// Returns `None` once the session manager is gone.
    pub async fn changed(&mut self) -> Option<&Destination> {
        self.session.changed().await.ok()?;
        self.current = Destination::resolve(&self.session.borrow_and_update());
        Some(&self.current)
    }

    /// Re-read the latest session state without waiting
    pub fn refresh(&mut self) -> &Destination {
        self.current = Destination::resolve(&self.session.borrow_and_update());
        &self.current
    }
}
