use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Resolve the server home directory to an absolute path.
///
/// - `None` selects the platform default: `%APPDATA%/<default_subdir>` on Windows,
///   `$HOME/<default_subdir>` elsewhere.
/// - A leading `~` is expanded against the same platform base.
/// - Relative paths are joined with the current working directory.
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    raw: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match raw {
        None => platform_base()?.join(default_subdir),
        Some(s) if s == "~" => platform_base()?,
        Some(s) if s.starts_with("~/") || s.starts_with("~\\") => platform_base()?.join(&s[2..]),
        Some(s) => {
            let p = PathBuf::from(s);
            if p.is_absolute() {
                p
            } else {
                std::env::current_dir()
                    .context("cannot read current directory")?
                    .join(p)
            }
        }
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("cannot create home dir {}", resolved.display()))?;
    }
    Ok(resolved)
}

fn platform_base() -> Result<PathBuf> {
    let var = if cfg!(windows) { "APPDATA" } else { "HOME" };
    match std::env::var_os(var) {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => bail!("environment variable {var} is not set"),
    }
}
