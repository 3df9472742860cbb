//! Access to the process environment.
//!
//! Everything the resolver reads from the outside world (variables, home
//! directory, working directory, temp directory) goes through the
//! [`Environment`] trait. [`ProcessEnv`] reads the real process state;
//! [`MapEnv`] is an in-memory stand-in for tests and embedders.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Overrides the configuration directory (default `~/.config/herbie`).
pub const CONFIG_PATH_VAR: &str = "HERBIE_CONFIG_PATH";

/// Overrides the `save_dir` value from the configuration file.
pub const SAVE_DIR_VAR: &str = "HERBIE_SAVE_DIR";

/// Forces serverless mode on or off.
pub const SERVERLESS_VAR: &str = "HERBIE_SERVERLESS";

/// Disables diagnostic messages when falsy.
pub const VERBOSE_VAR: &str = "HERBIE_VERBOSE";

/// A source of environment information.
pub trait Environment {
    /// Returns the raw value of an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Returns the home directory of the named user.
    fn user_home_dir(&self, user: &str) -> Option<PathBuf>;

    /// Returns the current working directory.
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Returns the platform temporary-storage directory.
    fn temp_dir(&self) -> PathBuf;

    /// Returns a variable's value, or `None` if it is unset, empty, or
    /// whitespace-only. The value is trimmed.
    fn var_non_empty(&self, key: &str) -> Option<String> {
        self.var(key).and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.len() == value.len() {
                Some(value)
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// Whether diagnostic messages are enabled.
    ///
    /// On unless [`VERBOSE_VAR`] holds a falsy value.
    fn verbose(&self) -> bool {
        self.var(VERBOSE_VAR)
            .and_then(|value| parse_flag(&value))
            .unwrap_or(true)
    }
}

/// Parses a boolean-ish flag value.
///
/// Recognizes `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitively and
/// ignoring surrounding whitespace. Anything else yields `None`.
///
/// # Examples
///
/// ```
/// use herbie_config::env::parse_flag;
///
/// assert_eq!(parse_flag("YES"), Some(true));
/// assert_eq!(parse_flag(" 0 "), Some(false));
/// assert_eq!(parse_flag("maybe"), None);
/// ```
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn user_home_dir(&self, user: &str) -> Option<PathBuf> {
        lookup_user_home(user)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

#[cfg(unix)]
fn lookup_user_home(user: &str) -> Option<PathBuf> {
    use std::ffi::{CStr, CString, OsStr};
    use std::os::unix::ffi::OsStrExt;

    const MAX_BUF: usize = 1 << 20;

    let name = CString::new(user).ok()?;
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    // SAFETY: `passwd` is a plain C struct; all-zero is a valid placeholder
    // that `getpwnam_r` overwrites before we read it.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        // SAFETY: every pointer refers to a live local, and `buf.len()` is the
        // true length of `buf`.
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < MAX_BUF {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return None;
        }
        break;
    }

    if result.is_null() || pwd.pw_dir.is_null() {
        return None;
    }

    // SAFETY: `pw_dir` is a NUL-terminated string stored inside `buf`, which
    // is still alive.
    let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
    Some(PathBuf::from(OsStr::from_bytes(dir.to_bytes())))
}

#[cfg(not(unix))]
fn lookup_user_home(user: &str) -> Option<PathBuf> {
    // No user database; assume homes are siblings.
    dirs::home_dir()?.parent().map(|parent| parent.join(user))
}

/// An environment backed by in-memory values.
///
/// # Examples
///
/// ```
/// use herbie_config::env::{Environment, MapEnv};
///
/// let env = MapEnv::new()
///     .with_var("HERBIE_VERBOSE", "false")
///     .with_home("/home/racer");
///
/// assert!(!env.verbose());
/// assert_eq!(env.home_dir().unwrap().to_str(), Some("/home/racer"));
/// ```
#[derive(Debug, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    users: HashMap<String, PathBuf>,
    cwd: Option<PathBuf>,
    temp: PathBuf,
}

impl Default for MapEnv {
    fn default() -> Self {
        Self {
            vars: HashMap::new(),
            home: None,
            users: HashMap::new(),
            cwd: None,
            temp: std::env::temp_dir(),
        }
    }
}

impl MapEnv {
    /// Creates an environment with no variables, no home, and no working
    /// directory. The temp directory defaults to the real one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Sets the current user's home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Registers another user's home directory for `~user` expansion.
    #[must_use]
    pub fn with_user_home(mut self, user: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        self.users.insert(user.into(), home.into());
        self
    }

    /// Sets the current working directory.
    #[must_use]
    pub fn with_current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Sets the temporary-storage directory.
    #[must_use]
    pub fn with_temp_dir(mut self, temp: impl Into<PathBuf>) -> Self {
        self.temp = temp.into();
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn user_home_dir(&self, user: &str) -> Option<PathBuf> {
        self.users.get(user).cloned()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        self.cwd
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no working directory set"))
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp.clone()
    }
}
