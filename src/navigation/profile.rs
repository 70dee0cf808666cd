//! Role to navigation policy
//!
//! Every screen asks this table what the current role may reach instead of
//! checking role strings itself.

use crate::auth::Role;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Top-level tabs, in tab bar order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TabId {
    Dashboard,
    Checklist,
    Incident,
    AdminManagement,
    ManagerApprovals,
    Analytics,
    Profile,
}

impl TabId {
    pub const ALL: [TabId; 7] = [
        TabId::Dashboard,
        TabId::Checklist,
        TabId::Incident,
        TabId::AdminManagement,
        TabId::ManagerApprovals,
        TabId::Analytics,
        TabId::Profile,
    ];

    /// Title shown in the tab bar
    pub fn title(&self) -> &'static str {
        match self {
            TabId::Dashboard => "Dashboard",
            TabId::Checklist => "New Checklist",
            TabId::Incident => "Report Incident",
            TabId::AdminManagement => "Admin",
            TabId::ManagerApprovals => "Approvals",
            TabId::Analytics => "Analytics",
            TabId::Profile => "Profile",
        }
    }

    /// Route name registered with the tab navigator
    pub fn route(&self) -> &'static str {
        match self {
            TabId::Dashboard => "Dashboard",
            TabId::Checklist => "Checklist",
            TabId::Incident => "Incident",
            TabId::AdminManagement => "AdminManagement",
            TabId::ManagerApprovals => "ManagerStack",
            TabId::Analytics => "Analytics",
            TabId::Profile => "Profile",
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Screens nested inside the admin and manager tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScreenId {
    UserManagement,
    FarmManagement,
    FarmAssignments,
    BarnManagement,
    SystemStats,
    Approvals,
}

impl ScreenId {
    pub fn title(&self) -> &'static str {
        match self {
            ScreenId::UserManagement => "User Management",
            ScreenId::FarmManagement => "Farm Management",
            ScreenId::FarmAssignments => "Farm Assignments",
            ScreenId::BarnManagement => "Barn Management",
            ScreenId::SystemStats => "System Statistics",
            ScreenId::Approvals => "Approvals",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            ScreenId::UserManagement => "AdminUserManagement",
            ScreenId::FarmManagement => "AdminFarmManagement",
            ScreenId::FarmAssignments => "AdminFarmAssignments",
            ScreenId::BarnManagement => "AdminBarnManagement",
            ScreenId::SystemStats => "AdminSystemStats",
            ScreenId::Approvals => "ManagerApprovals",
        }
    }

    /// The tab this screen lives under
    pub fn parent(&self) -> TabId {
        match self {
            ScreenId::Approvals => TabId::ManagerApprovals,
            _ => TabId::AdminManagement,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

const ADMIN_SCREENS: [ScreenId; 5] = [
    ScreenId::UserManagement,
    ScreenId::FarmManagement,
    ScreenId::FarmAssignments,
    ScreenId::BarnManagement,
    ScreenId::SystemStats,
];

const MANAGER_SCREENS: [ScreenId; 1] = [ScreenId::Approvals];

/// What a role may reach
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleNavigationProfile {
    pub visible_tabs: BTreeSet<TabId>,
    /// Non-empty only for admin
    pub visible_admin_subscreens: BTreeSet<ScreenId>,
    /// Non-empty only for manager
    pub visible_manager_subscreens: BTreeSet<ScreenId>,
}

impl RoleNavigationProfile {
    /// Visible tabs in tab bar order
    pub fn tabs(&self) -> Vec<TabId> {
        self.visible_tabs.iter().copied().collect()
    }

    pub fn allows_tab(&self, tab: TabId) -> bool {
        self.visible_tabs.contains(&tab)
    }

    /// A nested screen is reachable only if its parent tab is too
    pub fn allows_screen(&self, screen: ScreenId) -> bool {
        self.allows_tab(screen.parent())
            && (self.visible_admin_subscreens.contains(&screen)
                || self.visible_manager_subscreens.contains(&screen))
    }

    /// Nested screens under a tab, in declaration order
    pub fn screens_under(&self, tab: TabId) -> Vec<ScreenId> {
        match tab {
            TabId::AdminManagement => self.visible_admin_subscreens.iter().copied().collect(),
            TabId::ManagerApprovals => self.visible_manager_subscreens.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

/// Derive the navigation profile for a role
pub fn profile_for(role: Role) -> RoleNavigationProfile {
    let mut visible_tabs = BTreeSet::from([TabId::Dashboard, TabId::Profile]);
    let mut visible_admin_subscreens = BTreeSet::new();
    let mut visible_manager_subscreens = BTreeSet::new();

    match role {
        Role::Worker => {
            visible_tabs.insert(TabId::Checklist);
            visible_tabs.insert(TabId::Incident);
        }
        Role::Admin => {
            visible_tabs.insert(TabId::AdminManagement);
            visible_admin_subscreens.extend(ADMIN_SCREENS);
        }
        Role::Manager => {
            visible_tabs.insert(TabId::ManagerApprovals);
            visible_manager_subscreens.extend(MANAGER_SCREENS);
        }
        Role::Vet | Role::Auditor | Role::Visitor => {}
    }

    if matches!(role, Role::Admin | Role::Manager | Role::Vet | Role::Auditor) {
        visible_tabs.insert(TabId::Analytics);
    }

    RoleNavigationProfile {
        visible_tabs,
        visible_admin_subscreens,
        visible_manager_subscreens,
    }
}
