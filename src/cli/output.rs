//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{Role, Session};
use crate::navigation::{RoleNavigationProfile, TabId};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a role with a per-role color
pub fn format_role(role: Role) -> String {
    let name = role.as_str();
    match role {
        Role::Admin => name.red().to_string(),
        Role::Manager => name.blue().to_string(),
        Role::Worker => name.green().to_string(),
        Role::Vet | Role::Auditor => name.magenta().to_string(),
        Role::Visitor => name.normal().to_string(),
    }
}

/// Print the session summary
pub fn print_session(session: &Session) {
    println!("{}", "Session".bold().underline());
    println!();

    match session {
        Session::LoggedOut => {
            println!("  {} {}", "Status:".bold(), "logged out".red());
        }
        Session::LoggedIn { user, .. } => {
            println!("  {} {}", "Status:".bold(), "logged in".green());
            println!("  {} {}", "User:".bold(), user.name);
            println!("  {} {}", "Email:".bold(), user.email);
            println!("  {} {}", "ID:".bold(), user.id);
            println!("  {} {}", "Role:".bold(), format_role(user.role));
        }
    }
}

/// Print a table of tabs and the screens under them
pub fn print_navigation_table(role: Role, profile: &RoleNavigationProfile) {
    println!("{} {}", "Navigation for".bold(), format_role(role));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Tab").fg(Color::Cyan),
            Cell::new("Route").fg(Color::Cyan),
            Cell::new("Visible").fg(Color::Cyan),
            Cell::new("Screens").fg(Color::Cyan),
        ]);

    for tab in TabId::ALL {
        let visible = profile.allows_tab(tab);
        let screens = profile
            .screens_under(tab)
            .iter()
            .map(|screen| screen.title())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(tab.title()),
            Cell::new(tab.route()),
            if visible {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::Red)
            },
            Cell::new(if screens.is_empty() { "-".to_string() } else { screens }),
        ]);
    }

    println!("{table}");
}
