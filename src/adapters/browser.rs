//! Opens the dashboard in a local browser.

use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Launch commands tried in order until one starts.
const LAUNCHERS: &[(&str, &[&str])] = &[
    ("google-chrome", &["--new-tab"]),
    ("chromium-browser", &["--new-tab"]),
    ("xdg-open", &[]),
    ("open", &[]),
];

/// Best effort: returns whether any launcher started.
pub fn open_browser(url: &str) -> bool {
    for (program, args) in LAUNCHERS {
        let spawned = Command::new(program)
            .args(*args)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => {
                debug!(program, url, "browser launched");
                return true;
            }
            Err(e) => debug!(program, error = %e, "browser launcher unavailable"),
        }
    }
    warn!(url, "could not open a browser; open the URL manually");
    false
}
