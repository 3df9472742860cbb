//! Environment-aware path expansion.
//!
//! Configuration values such as `save_dir = "${SCRATCH}/herbie"` or
//! `save_dir = "~/data"` are expanded here before anything else sees them.
//!
//! Expansion happens in a fixed order:
//!
//! 1. `$NAME` and `${NAME}` are replaced with the variable's value. Unset
//!    variables are left in place, verbatim. Substituted values are not
//!    scanned again.
//! 2. A leading `~` or `~user` is replaced with the matching home directory.
//! 3. With [`ExpandOptions::resolve`], the path is canonicalized.
//! 4. With [`ExpandOptions::absolute`], a relative path is anchored to the
//!    working directory.

use std::path::{Component, Path, PathBuf};

use crate::env::Environment;
use crate::error::{ConfigError, Result};

/// Optional post-processing steps for [`expand_path`].
///
/// # Examples
///
/// ```
/// use herbie_config::ExpandOptions;
///
/// let options = ExpandOptions::new().absolute();
/// assert!(options.absolute);
/// assert!(!options.resolve);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Canonicalize the path: follow symlinks, drop `.` and `..`.
    pub resolve: bool,
    /// Anchor a relative path to the current working directory.
    pub absolute: bool,
}

impl ExpandOptions {
    /// Variable and home expansion only.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolve: false,
            absolute: false,
        }
    }

    /// Enables canonicalization.
    #[must_use]
    pub const fn resolve(mut self) -> Self {
        self.resolve = true;
        self
    }

    /// Enables anchoring to the working directory.
    #[must_use]
    pub const fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

/// Fully expands a path expression.
///
/// The expression is read as UTF-8; non-UTF-8 segments are replaced lossily.
///
/// # Errors
///
/// Returns an error if `resolve` or `absolute` is requested and the working
/// directory is needed but unavailable, or if canonicalization fails for a
/// reason other than a missing path component.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use herbie_config::env::MapEnv;
/// use herbie_config::{ExpandOptions, expand_path};
///
/// let env = MapEnv::new()
///     .with_var("MODEL", "hrrr")
///     .with_home("/home/racer");
///
/// let path = expand_path("~/data/${MODEL}", ExpandOptions::new(), &env).unwrap();
/// assert_eq!(path, PathBuf::from("/home/racer/data/hrrr"));
/// ```
pub fn expand_path(
    expr: impl AsRef<Path>,
    options: ExpandOptions,
    env: &impl Environment,
) -> Result<PathBuf> {
    let expr = expr.as_ref().to_string_lossy();
    let mut path = expand_user(&expand_vars(&expr, env), env);

    if options.resolve {
        path = canonicalize(&anchor(path, env)?)?;
    }

    if options.absolute {
        path = anchor(path, env)?;
    }

    Ok(path)
}

/// Replaces `$NAME` and `${NAME}` references with their values.
///
/// `NAME` is a run of ASCII letters, digits, and underscores. References to
/// unset variables, a lone `$`, and an unterminated `${` are kept as written.
///
/// # Examples
///
/// ```
/// use herbie_config::env::MapEnv;
/// use herbie_config::expand::expand_vars;
///
/// let env = MapEnv::new().with_var("HOME", "/home/racer");
/// assert_eq!(expand_vars("$HOME/data", &env), "/home/racer/data");
/// assert_eq!(expand_vars("${NOPE}/data", &env), "${NOPE}/data");
/// ```
#[must_use]
pub fn expand_vars(expr: &str, env: &impl Environment) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut rest = expr;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !is_name_char(c))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        let reference = &rest[pos..pos + 1 + consumed];
        match (consumed, env.var(name)) {
            (0, _) => out.push('$'),
            (_, Some(value)) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(reference),
        }
        rest = &rest[pos + 1 + consumed..];
    }

    out.push_str(rest);
    out
}

/// Expands a leading `~` or `~user`.
///
/// The path is returned unchanged if it does not start with `~` or the home
/// directory cannot be found.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use herbie_config::env::MapEnv;
/// use herbie_config::expand::expand_user;
///
/// let env = MapEnv::new()
///     .with_home("/home/racer")
///     .with_user_home("jim", "/home/jim");
///
/// assert_eq!(expand_user("~/data", &env), PathBuf::from("/home/racer/data"));
/// assert_eq!(expand_user("~jim", &env), PathBuf::from("/home/jim"));
/// assert_eq!(expand_user("~nobody/x", &env), PathBuf::from("~nobody/x"));
/// ```
#[must_use]
pub fn expand_user(path: &str, env: &impl Environment) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };

    let split = rest.find(std::path::is_separator).unwrap_or(rest.len());
    let (user, tail) = rest.split_at(split);
    let home = if user.is_empty() {
        env.home_dir()
    } else {
        env.user_home_dir(user)
    };

    match home {
        Some(home) => {
            let tail = tail.trim_start_matches(std::path::is_separator);
            if tail.is_empty() {
                home
            } else {
                home.join(tail)
            }
        }
        None => PathBuf::from(path),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn anchor(path: PathBuf, env: &impl Environment) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env.current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(cwd.join(path))
}

/// Canonicalizes the longest existing prefix and appends the remainder
/// lexically, so paths that do not exist yet still resolve.
fn canonicalize(path: &Path) -> Result<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();

    for split in (1..=components.len()).rev() {
        let head: PathBuf = components[..split].iter().collect();
        match std::fs::canonicalize(&head) {
            Ok(mut base) => {
                for component in &components[split..] {
                    match component {
                        Component::ParentDir => {
                            base.pop();
                        }
                        Component::Normal(part) => base.push(part),
                        Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                    }
                }
                return Ok(base);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConfigError::Canonicalize {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    Err(ConfigError::Canonicalize {
        path: path.to_path_buf(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn env() -> MapEnv {
        MapEnv::new()
            .with_var("HOME", "/home/racer")
            .with_var("MODEL", "hrrr")
            .with_var("EMPTY", "")
            .with_home("/home/racer")
            .with_current_dir("/work")
    }

    #[test]
    fn expand_vars_plain_and_braced() {
        let env = env();
        assert_eq!(expand_vars("$MODEL", &env), "hrrr");
        assert_eq!(expand_vars("${MODEL}", &env), "hrrr");
        assert_eq!(expand_vars("a/${MODEL}b/$MODEL/c", &env), "a/hrrrb/hrrr/c");
    }

    #[test]
    fn expand_vars_name_stops_at_non_word_char() {
        let env = env();
        assert_eq!(expand_vars("$MODEL.grib2", &env), "hrrr.grib2");
        assert_eq!(expand_vars("$MODEL-x", &env), "hrrr-x");
        // the name greedily includes the trailing underscore
        assert_eq!(expand_vars("$MODEL_x", &env), "$MODEL_x");
    }

    #[test]
    fn expand_vars_unset_left_literal() {
        let env = env();
        assert_eq!(expand_vars("$NOPE/x", &env), "$NOPE/x");
        assert_eq!(expand_vars("${NOPE}/x", &env), "${NOPE}/x");
    }

    #[test]
    fn expand_vars_empty_value_substitutes() {
        assert_eq!(expand_vars("a$EMPTY/b", &env()), "a/b");
    }

    #[test]
    fn expand_vars_degenerate_references() {
        let env = env();
        assert_eq!(expand_vars("$", &env), "$");
        assert_eq!(expand_vars("a$/b", &env), "a$/b");
        assert_eq!(expand_vars("${}", &env), "${}");
        assert_eq!(expand_vars("${MODEL", &env), "${MODEL");
        assert_eq!(expand_vars("$$MODEL", &env), "$hrrr");
    }

    #[test]
    fn expand_vars_does_not_rescan_values() {
        let env = MapEnv::new()
            .with_var("A", "$B")
            .with_var("B", "nested");
        assert_eq!(expand_vars("$A", &env), "$B");
    }

    #[test]
    fn expand_user_variants() {
        let env = env().with_user_home("jim", "/home/jim");
        assert_eq!(expand_user("~", &env), PathBuf::from("/home/racer"));
        assert_eq!(expand_user("~/", &env), PathBuf::from("/home/racer"));
        assert_eq!(expand_user("~/data/x", &env), PathBuf::from("/home/racer/data/x"));
        assert_eq!(expand_user("~jim/data", &env), PathBuf::from("/home/jim/data"));
        assert_eq!(expand_user("data/~", &env), PathBuf::from("data/~"));
    }

    #[test]
    fn expand_user_without_home_is_unchanged() {
        let env = MapEnv::new();
        assert_eq!(expand_user("~/data", &env), PathBuf::from("~/data"));
    }

    #[test]
    fn expand_path_vars_before_home() {
        let env = env().with_var("TILDE", "~");
        let path = expand_path("$TILDE/data", ExpandOptions::new(), &env).unwrap();
        assert_eq!(path, PathBuf::from("/home/racer/data"));
    }

    #[test]
    fn expand_path_absolute_anchors_relative() {
        let env = env();
        let path = expand_path("data/$MODEL", ExpandOptions::new().absolute(), &env).unwrap();
        assert_eq!(path, PathBuf::from("/work/data/hrrr"));

        let path = expand_path("/abs", ExpandOptions::new().absolute(), &env).unwrap();
        assert_eq!(path, PathBuf::from("/abs"));
    }

    #[test]
    fn expand_path_absolute_without_cwd_fails() {
        let env = MapEnv::new();
        let err = expand_path("rel", ExpandOptions::new().absolute(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::CurrentDir(_)));
    }

    #[test]
    fn expand_path_resolve_existing_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        let env = MapEnv::new().with_current_dir(dir.path());

        let path = expand_path("a/../a/./", ExpandOptions::new().resolve(), &env).unwrap();
        assert_eq!(path, canonical.join("a"));
    }

    #[test]
    fn expand_path_resolve_missing_tail() {
        let dir = TempDir::new().unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        let env = MapEnv::new().with_var("ROOT", dir.path().to_string_lossy());

        let path = expand_path("$ROOT/new/deeper/../leaf", ExpandOptions::new().resolve(), &env)
            .unwrap();
        assert_eq!(path, canonical.join("new").join("leaf"));
    }

    #[cfg(unix)]
    #[test]
    fn expand_path_resolve_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();
        let env = MapEnv::new();

        let path = expand_path(dir.path().join("link"), ExpandOptions::new().resolve(), &env)
            .unwrap();
        assert_eq!(path, std::fs::canonicalize(&target).unwrap());
    }

    fn path_segment() -> impl Strategy<Value = String> {
        "[a-z0-9_.-]{1,8}"
    }

    proptest! {
        #[test]
        fn undefined_references_are_preserved(
            name in "UNDEF_[A-Z]{1,8}",
            prefix in path_segment(),
            braced in any::<bool>(),
        ) {
            let env = MapEnv::new();
            let expr = if braced {
                format!("{prefix}/${{{name}}}/x")
            } else {
                format!("{prefix}/${name}/x")
            };
            prop_assert_eq!(expand_vars(&expr, &env), expr);
        }

        #[test]
        fn defined_references_substitute_once(
            value in "[a-z0-9/]{0,16}",
            prefix in path_segment(),
        ) {
            let env = MapEnv::new().with_var("DEFINED", value.clone());
            let expr = format!("{prefix}/${{DEFINED}}/${{DEFINED}}");
            prop_assert_eq!(expand_vars(&expr, &env), format!("{prefix}/{value}/{value}"));
        }

        #[test]
        fn expansion_is_idempotent(
            segments in prop::collection::vec(path_segment(), 1..5),
            with_var in any::<bool>(),
            with_home in any::<bool>(),
        ) {
            let env = env();
            let mut expr = segments.join("/");
            if with_var {
                expr = format!("${{MODEL}}/{expr}/$UNDEFINED_THING");
            }
            if with_home {
                expr = format!("~/{expr}");
            }

            let once = expand_path(&expr, ExpandOptions::new(), &env).unwrap();
            let twice = expand_path(&once, ExpandOptions::new(), &env).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
