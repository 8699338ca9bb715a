//! Navigation destinations and the primary menu

use std::fmt;

/// Path of the login view
pub const LOGIN_PATH: &str = "/login";
/// Path of the protected landing page after login
pub const DASHBOARD_PATH: &str = "/dashboard";

/// A navigable destination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Unauthenticated landing view, `/`
    Landing,
    Login,
    Dashboard,
    /// Generic protected page, `/protected`
    Protected,
    /// One of the menu destinations, e.g. `/samples/register`
    Section(String),
    NotFound(String),
}

impl Route {
    /// Map a path to a route. Query strings, fragments and trailing slashes
    /// are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        match normalized {
            "/" => Self::Landing,
            LOGIN_PATH => Self::Login,
            DASHBOARD_PATH => Self::Dashboard,
            "/protected" => Self::Protected,
            other if is_menu_destination(other) => Self::Section(other.to_string()),
            other => Self::NotFound(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Landing => "/",
            Self::Login => LOGIN_PATH,
            Self::Dashboard => DASHBOARD_PATH,
            Self::Protected => "/protected",
            Self::Section(path) | Self::NotFound(path) => path,
        }
    }

    /// Whether the Route Guard must approve this destination
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Protected | Self::Section(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

fn is_menu_destination(path: &str) -> bool {
    menu()
        .iter()
        .flat_map(NavItem::destinations)
        .any(|destination| destination == path)
}

/// Menu glyphs; the renderer decides what they look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Home,
    Swatch,
    ClipboardList,
    Database,
    Flask,
    TestTube,
    FileText,
    Calendar,
    Settings,
    BarChart,
    Shield,
    Users,
    Wallet,
}

/// A single menu link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: Icon,
    pub destination: &'static str,
}

impl NavLink {
    const fn new(
        id: &'static str,
        label: &'static str,
        icon: Icon,
        destination: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            icon,
            destination,
        }
    }
}

/// Menu entry: either a link or a named group of links. Groups hold links
/// only, never other groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Leaf(NavLink),
    Group {
        id: &'static str,
        label: &'static str,
        icon: Icon,
        children: Vec<NavLink>,
    },
}

impl NavItem {
    const fn leaf(
        id: &'static str,
        label: &'static str,
        icon: Icon,
        destination: &'static str,
    ) -> Self {
        Self::Leaf(NavLink::new(id, label, icon, destination))
    }

    pub const fn id(&self) -> &'static str {
        match self {
            Self::Leaf(link) => link.id,
            Self::Group { id, .. } => *id,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Leaf(link) => link.label,
            Self::Group { label, .. } => *label,
        }
    }

    pub const fn icon(&self) -> Icon {
        match self {
            Self::Leaf(link) => link.icon,
            Self::Group { icon, .. } => *icon,
        }
    }

    /// Every link destination reachable from this entry
    pub fn destinations(&self) -> Vec<&'static str> {
        match self {
            Self::Leaf(link) => vec![link.destination],
            Self::Group { children, .. } => {
                children.iter().map(|link| link.destination).collect()
            }
        }
    }
}

/// Primary navigation of the LIMS
pub fn menu() -> Vec<NavItem> {
    vec![
        NavItem::leaf("dashboard", "Dashboard", Icon::Home, DASHBOARD_PATH),
        NavItem::Group {
            id: "samples",
            label: "Samples",
            icon: Icon::Swatch,
            children: vec![
                NavLink::new("sample-registration", "Sample Registration", Icon::ClipboardList, "/samples/register"),
                NavLink::new("sample-tracking", "Sample Tracking", Icon::Database, "/samples/tracking"),
                NavLink::new("sample-storage", "Sample Storage", Icon::Flask, "/samples/storage"),
            ],
        },
        NavItem::Group {
            id: "tests",
            label: "Tests & Analysis",
            icon: Icon::TestTube,
            children: vec![
                NavLink::new("test-methods", "Test Methods", Icon::FileText, "/tests/methods"),
                NavLink::new("test-queue", "Test Queue", Icon::Calendar, "/tests/queue"),
                NavLink::new("lab-equipment", "Equipment", Icon::Settings, "/tests/equipment"),
            ],
        },
        NavItem::Group {
            id: "results",
            label: "Results",
            icon: Icon::BarChart,
            children: vec![
                NavLink::new("test-results", "Test Results", Icon::FileText, "/results/tests"),
                NavLink::new("reports", "Reports", Icon::ClipboardList, "/results/reports"),
                NavLink::new("data-export", "Data Export", Icon::Database, "/results/export"),
            ],
        },
        NavItem::Group {
            id: "quality",
            label: "Quality Control",
            icon: Icon::Shield,
            children: vec![
                NavLink::new("calibration", "Calibration", Icon::Settings, "/quality/calibration"),
                NavLink::new("validation", "Validation", Icon::TestTube, "/quality/validation"),
                NavLink::new("audit-trail", "Audit Trail", Icon::FileText, "/quality/audit"),
            ],
        },
        NavItem::leaf("users", "User Management", Icon::Users, "/users"),
        NavItem::leaf("billing", "Billing", Icon::Wallet, "/billing"),
    ]
}

/// Collapse and expansion state of the menu.
///
/// At most one group is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    collapsed: bool,
    open_group: Option<&'static str>,
}

impl MenuState {
    pub const fn new(collapsed: bool) -> Self {
        Self {
            collapsed,
            open_group: None,
        }
    }

    pub const fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    /// Open `id`, closing any other group; toggling the open group closes it
    pub fn toggle_group(&mut self, id: &'static str) {
        self.open_group = if self.open_group == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open_group == Some(id)
    }
}
