//! CLI command implementations.

mod allowed;
mod login;
mod records;

pub use allowed::allowed;
pub use login::{login, LoginArgs};
pub use records::{records, RecordKind};

use anyhow::Result;
use gate_config_and_utils::Config;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Load configuration from the optional file plus the environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(Config::load(path)?)
}

/// Prompt on stdout and read one trimmed line from stdin.
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
