//! External command execution utilities.
//!
//! Provides the `exec!` macro for running commands and the [`WriteNotifier`]
//! hook used to stage rewritten descriptors with git.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Output},
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments from a working directory.
///
/// # Examples
/// ```ignore
/// exec!(root; ["git"]; "add", "--", path)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            $root,
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Trait for converting to command vector.
pub trait ToCmd {
    fn to_cmd(self) -> Vec<OsString>;
}

impl<const N: usize> ToCmd for [&str; N] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.into_iter().map(OsString::from).collect()
    }
}

/// Convert command to Vec<OsString>.
#[inline]
pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
    cmd.to_cmd()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(root: &Path, cmd: &[OsString], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("Command `{name}` failed with {}", output.status);
        }
        bail!("Command `{name}` failed with {}: {stderr}", output.status);
    }

    Ok(output)
}

/// Prepare a Command from components.
fn prepare(root: &Path, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args).current_dir(root);

    Ok((name, command))
}

// ============================================================================
// Write Notification
// ============================================================================

/// Side effect run after a descriptor was written.
///
/// Implementations must not fail the run; errors are reported and dropped.
pub trait WriteNotifier {
    fn notify_written(&self, path: &Path);
}

/// Does nothing.
pub struct Silent;

impl WriteNotifier for Silent {
    fn notify_written(&self, _path: &Path) {}
}

/// Stages written files with `git add`, run from the project root.
pub struct GitAdd {
    root: PathBuf,
}

impl GitAdd {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl WriteNotifier for GitAdd {
    fn notify_written(&self, path: &Path) {
        match exec!(self.root.as_path(); ["git"]; "add", "--", path) {
            Ok(_) => log!("git"; "staged {}", path.display()),
            Err(err) => log!("warn"; "git add {}: {err:#}", path.display()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
