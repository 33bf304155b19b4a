use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Result};

/// Where an output identifier resolved to: a local file path, or a
/// destination scheme this manager does not write to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    File(PathBuf),
    Unsupported { scheme: String },
}

/// Extracts the URI scheme from an identifier, if it has one. Single-letter
/// prefixes are treated as Windows drive letters, not schemes.
pub fn parse_scheme(identifier: &str) -> Option<&str> {
    let (candidate, _) = identifier.split_once(':')?;
    if candidate.len() < 2 {
        return None;
    }

    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.any(|ch| !(ch.is_ascii_alphanumeric() || ch == '+' || ch == '-' || ch == '.')) {
        return None;
    }

    Some(candidate)
}

/// Resolves a requested output identifier against the run's base output
/// location. Relative identifiers land next to the base output; `file:` URIs
/// are converted to paths; any other scheme is reported as unsupported.
pub fn resolve_output_location(base: &Path, identifier: &str) -> Result<ResolvedLocation> {
    if identifier.trim().is_empty() {
        return Err(anyhow!("output identifier must not be empty"));
    }

    if let Some(scheme) = parse_scheme(identifier) {
        if !scheme.eq_ignore_ascii_case("file") {
            return Ok(ResolvedLocation::Unsupported {
                scheme: scheme.to_string(),
            });
        }
        return Ok(ResolvedLocation::File(normalize_path(&file_uri_to_path(
            identifier,
        )?)));
    }

    let requested = Path::new(identifier);
    if requested.is_absolute() {
        return Ok(ResolvedLocation::File(normalize_path(requested)));
    }

    let joined = match base.parent() {
        Some(parent) => parent.join(requested),
        None => requested.to_path_buf(),
    };
    Ok(ResolvedLocation::File(normalize_path(&joined)))
}

/// Folds `.` and `..` components lexically, without touching the filesystem,
/// so two spellings of one destination compare equal before either exists.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(component.as_os_str()),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn file_uri_to_path(uri: &str) -> Result<PathBuf> {
    let rest = &uri["file:".len()..];
    let path_part = if let Some(stripped) = rest.strip_prefix("//") {
        match stripped.find('/') {
            Some(0) => stripped,
            Some(slash) => {
                let host = &stripped[..slash];
                if !host.eq_ignore_ascii_case("localhost") {
                    return Err(anyhow!(
                        "file URI with non-local host '{host}' is not supported: {uri}"
                    ));
                }
                &stripped[slash..]
            }
            None => return Err(anyhow!("file URI is missing a path: {uri}")),
        }
    } else {
        rest
    };

    if path_part.is_empty() {
        return Err(anyhow!("file URI is missing a path: {uri}"));
    }

    // A leading slash before a drive letter comes from the URI form, not the
    // path itself.
    if cfg!(windows) {
        let bytes = path_part.as_bytes();
        if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
        {
            return Ok(PathBuf::from(&path_part[1..]));
        }
    }

    Ok(PathBuf::from(path_part))
}
