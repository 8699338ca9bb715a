//! CLI commands

use anyhow::{Result, anyhow};
use clap::Subcommand;
use lims_portal_core::nav::menu;
use lims_portal_core::{
    AuthClient, AuthConfig, BootState, FileSessionStore, MenuState, NavItem, PortalSettings,
    Screen, SessionStore, Shell, StoreResult,
};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::config;
use crate::render;

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the Auth Service and report the stored session
    Status,

    /// Sign in and store the session token
    Login {
        /// Account email
        email: String,

        /// Account password (prompted on stdin when omitted)
        #[arg(long, env = "LIMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Discard the stored session
    Logout,

    /// Navigate to a portal path and render it
    Open {
        /// Path such as /dashboard or /samples/register
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print the navigation menu
    Menu {
        /// Icons only
        #[arg(long)]
        collapsed: bool,

        /// Group to expand
        #[arg(long)]
        open: Option<String>,
    },

    /// Interactive portal session
    Shell,
}

impl Commands {
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Shell)
    }

    pub async fn execute(self, data_dir: PathBuf, settings: PortalSettings) -> Result<()> {
        if let Self::Menu { collapsed, ref open } = self {
            return print_menu(collapsed, open.as_deref());
        }

        let (shell, store) = build_shell(&data_dir, settings)?;
        boot(&shell).await?;

        match self {
            Self::Status => status(&shell, store.as_ref()),
            Self::Login { email, password } => {
                let password = match password {
                    Some(password) => password,
                    None => prompt_password().await?,
                };
                login(&shell, &email, &password).await
            }
            Self::Logout => {
                let screen = shell.logout()?;
                print!("{}", render::screen(&screen, &MenuState::default()));
                Ok(())
            }
            Self::Open { path } => {
                let screen = shell.navigate(&path);
                print!("{}", render::screen(&screen, &MenuState::default()));
                Ok(())
            }
            Self::Shell => repl(&shell, store.as_ref()).await,
            Self::Menu { .. } => Ok(()),
        }
    }
}

fn build_shell(
    data_dir: &std::path::Path,
    settings: PortalSettings,
) -> Result<(Shell, Arc<FileSessionStore>)> {
    let store = Arc::new(FileSessionStore::new(config::session_path(
        &settings, data_dir,
    )));
    let client = AuthClient::builder()
        .timeout(settings.request_timeout())
        .transport(settings.credential_transport)
        .build()?;

    info!(session = %store.path().display(), "Session jar");
    let shell = Shell::new(AuthConfig::from_env(), settings, store.clone(), Arc::new(client));
    Ok((shell, store))
}

/// Boot the shell; a fatal verdict is rendered and returned as the error
async fn boot(shell: &Shell) -> Result<()> {
    print!("{}", render::screen(&Screen::Checking, &MenuState::default()));
    match shell.boot().await {
        BootState::Fatal(e) => {
            print!("{}", render::screen(&Screen::Fatal(e), &MenuState::default()));
            Err(e.into())
        }
        _ => Ok(()),
    }
}

fn status(shell: &Shell, store: &FileSessionStore) -> Result<()> {
    println!("Auth Service: {}", shell.reachability());
    match store.get() {
        Some(token) => println!("Session: signed in until {}", token.expires_at()),
        None => println!("Session: signed out"),
    }
    println!("Jar: {}", store.path().display());
    Ok(())
}

async fn login(shell: &Shell, email: &str, password: &str) -> Result<()> {
    match shell.login(email, password).await {
        Ok(screen) => {
            print!("{}", render::screen(&screen, &MenuState::default()));
            Ok(())
        }
        Err(e) => {
            print!("{}", render::screen(&render::login_error(&e), &MenuState::default()));
            Err(e.into())
        }
    }
}

async fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("No password given"))
}

fn print_menu(collapsed: bool, open: Option<&str>) -> Result<()> {
    let mut state = MenuState::new(collapsed);
    if let Some(open) = open {
        let id = group_id(open).ok_or_else(|| anyhow!("Unknown menu group: {open}"))?;
        state.toggle_group(id);
    }
    print!("{}", render::nav_menu(&state, None));
    Ok(())
}

/// Look up a group id in the menu, giving back the menu's own string
fn group_id(name: &str) -> Option<&'static str> {
    menu()
        .iter()
        .filter(|item| matches!(item, NavItem::Group { .. }))
        .map(NavItem::id)
        .find(|id| *id == name)
}

/// One line of input in the interactive shell
#[derive(PartialEq, Eq)]
enum Input {
    Open(String),
    /// Without a password on the line, the next line is read as the password
    Login {
        email: String,
        password: Option<String>,
    },
    Logout,
    Menu,
    Collapse,
    Toggle(String),
    Status,
    Help,
    Quit,
    Empty,
    /// Unrecognized command word or wrong number of arguments. Only the
    /// command word is kept so a mistyped password never gets echoed.
    Unknown(String),
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { email, password } => f
                .debug_struct("Login")
                .field("email", email)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Open(path) => f.debug_tuple("Open").field(path).finish(),
            Self::Toggle(group) => f.debug_tuple("Toggle").field(group).finish(),
            Self::Unknown(command) => f.debug_tuple("Unknown").field(command).finish(),
            Self::Logout => f.write_str("Logout"),
            Self::Menu => f.write_str("Menu"),
            Self::Collapse => f.write_str("Collapse"),
            Self::Status => f.write_str("Status"),
            Self::Help => f.write_str("Help"),
            Self::Quit => f.write_str("Quit"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl Input {
    fn parse(line: &str) -> Self {
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            [] => Self::Empty,
            ["open" | "go", path] => Self::Open((*path).to_string()),
            ["login", email] => Self::Login {
                email: (*email).to_string(),
                password: None,
            },
            ["login", email, password] => Self::Login {
                email: (*email).to_string(),
                password: Some((*password).to_string()),
            },
            ["logout"] => Self::Logout,
            ["menu"] => Self::Menu,
            ["collapse"] => Self::Collapse,
            ["toggle", group] => Self::Toggle((*group).to_string()),
            ["status"] => Self::Status,
            ["help" | "?"] => Self::Help,
            ["quit" | "exit"] => Self::Quit,
            [command, ..] => Self::Unknown((*command).to_string()),
        }
    }
}

/// Screen to show after a logout attempt. A failed logout is reported and
/// the current screen stays up.
fn after_logout(result: StoreResult<Screen>, current: Screen) -> Screen {
    match result {
        Ok(screen) => screen,
        Err(e) => {
            tracing::error!(error = %e, "Logout failed");
            println!("Logout failed: {e}");
            current
        }
    }
}

const HELP: &str = "\
Commands:
  open <path>               navigate, e.g. open /dashboard
  login <email> [password]  sign in; omit the password to be asked for it
  logout                    sign out
  menu                      show the navigation menu
  collapse                  collapse or expand the menu
  toggle <group>            open or close a menu group
  status                    service and session status
  quit                      leave the shell
";

async fn repl(shell: &Shell, store: &FileSessionStore) -> Result<()> {
    let mut menu_state = MenuState::default();

    // Report sessions that end without this shell asking, e.g. expiry
    let mut session = shell.subscribe_session();
    let watcher = tokio::spawn(async move {
        while session.changed().await.is_ok() {
            let logged_in = *session.borrow_and_update();
            tracing::info!(logged_in, "Session state changed");
        }
    });

    let mut screen = shell.navigate(&shell.location().to_string());
    print!("{}", render::screen(&screen, &menu_state));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("lims> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => print!("{HELP}"),
            Input::Status => status(shell, store)?,
            Input::Unknown(command) => println!("Unrecognized input for '{command}' (try help)"),
            Input::Menu => print!("{}", render::nav_menu(&menu_state, Some(&shell.location().to_string()))),
            Input::Collapse => {
                menu_state.toggle_collapsed();
                print!("{}", render::screen(&screen, &menu_state));
            }
            Input::Toggle(name) => match group_id(&name) {
                Some(id) => {
                    menu_state.toggle_group(id);
                    print!("{}", render::screen(&screen, &menu_state));
                }
                None => println!("Unknown menu group: {name}"),
            },
            Input::Open(path) => {
                screen = shell.navigate(&path);
                print!("{}", render::screen(&screen, &menu_state));
            }
            Input::Login { email, password } => {
                let password = match password {
                    Some(password) => password,
                    None => {
                        print!("Password: ");
                        std::io::stdout().flush()?;
                        match lines.next_line().await? {
                            Some(password) => password,
                            None => break,
                        }
                    }
                };
                screen = shell
                    .login(&email, &password)
                    .await
                    .unwrap_or_else(|e| render::login_error(&e));
                print!("{}", render::screen(&screen, &menu_state));
            }
            Input::Logout => {
                screen = after_logout(shell.logout(), screen);
                print!("{}", render::screen(&screen, &menu_state));
            }
        }
    }

    watcher.abort();
    Ok(())
}
