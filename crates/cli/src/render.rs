//! Plain-text rendering of portal screens

use lims_portal_core::nav::menu;
use lims_portal_core::{AuthError, Icon, MenuState, NavItem, NavLink, Route, Screen};
use std::fmt::Write;

const TITLE: &str = "Mini LIMS";

const fn glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Home => "[H]",
        Icon::Swatch => "[S]",
        Icon::ClipboardList => "[C]",
        Icon::Database => "[D]",
        Icon::Flask => "[F]",
        Icon::TestTube => "[T]",
        Icon::FileText => "[=]",
        Icon::Calendar => "[#]",
        Icon::Settings => "[*]",
        Icon::BarChart => "[%]",
        Icon::Shield => "[!]",
        Icon::Users => "[U]",
        Icon::Wallet => "[$]",
    }
}

/// Label shown for a protected route
fn page_title(route: &Route) -> String {
    match route {
        Route::Dashboard => "Dashboard".to_string(),
        Route::Protected => "Protected Content".to_string(),
        Route::Section(path) => find_label(&menu(), path).map_or_else(|| path.clone(), str::to_string),
        other => other.path().to_string(),
    }
}

fn find_label(items: &[NavItem], path: &str) -> Option<&'static str> {
    items
        .iter()
        .flat_map(|item| match item {
            NavItem::Leaf(link) => std::slice::from_ref(link),
            NavItem::Group { children, .. } => children.as_slice(),
        })
        .find(|link| link.destination == path)
        .map(|link| link.label)
}

pub fn screen(screen: &Screen, menu_state: &MenuState) -> String {
    let mut out = String::new();
    match screen {
        Screen::Checking => out.push_str("Checking authentication service...\n"),
        Screen::Fatal(e) => {
            let _ = writeln!(out, "{TITLE} is unavailable");
            let _ = writeln!(out, "error [{}]: {e}", e.code());
        }
        Screen::Landing => {
            let _ = writeln!(out, "Welcome to {TITLE}");
            out.push_str("Sign in to continue: login <email> <password>\n");
        }
        Screen::LoginForm { error } => {
            let _ = writeln!(out, "{TITLE} - Sign in");
            if let Some(error) = error {
                let _ = writeln!(out, "! {error}");
            }
            out.push_str("Email and password required\n");
        }
        Screen::Protected(route) => {
            let _ = writeln!(out, "{TITLE} - {}", page_title(route));
            out.push_str(&nav_menu(menu_state, Some(route.path())));
            let _ = writeln!(out, "You are signed in at {route}");
        }
        Screen::NotFound(path) => {
            let _ = writeln!(out, "No page at {path}");
        }
    }
    out
}

/// Render the navigation menu, marking `active` when given
pub fn nav_menu(state: &MenuState, active: Option<&str>) -> String {
    let mut out = String::new();
    for item in menu() {
        render_item(&mut out, &item, state, active);
    }
    out
}

fn render_item(out: &mut String, item: &NavItem, state: &MenuState, active: Option<&str>) {
    match item {
        NavItem::Leaf(link) => render_link(out, link, state, active, 1),
        NavItem::Group { id, children, .. } => {
            let open = state.is_open(id);
            let arrow = if open { "v" } else { ">" };
            let label = if state.is_collapsed() { "" } else { item.label() };
            let _ = writeln!(out, "   {} {label:<22} {arrow} ({id})", glyph(item.icon()));
            if open && !state.is_collapsed() {
                for link in children {
                    render_link(out, link, state, active, 2);
                }
            }
        }
    }
}

fn render_link(
    out: &mut String,
    link: &NavLink,
    state: &MenuState,
    active: Option<&str>,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    let marker = if active == Some(link.destination) { ">" } else { " " };
    let label = if state.is_collapsed() { "" } else { link.label };
    let _ = writeln!(
        out,
        "{marker}{indent}{} {label:<22} {}",
        glyph(link.icon),
        link.destination
    );
}

pub fn login_error(error: &AuthError) -> Screen {
    Screen::LoginForm {
        error: Some(error.to_string()),
    }
}
