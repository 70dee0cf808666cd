//! Role-gated navigation

pub mod profile;
pub mod router;

pub use profile::{profile_for, RoleNavigationProfile, ScreenId, TabId};
pub use router::{Destination, NavigationRouter};
