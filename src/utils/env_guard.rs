use std::fs;
use std::path::Path;

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value_no_comment = value.split('#').next().unwrap_or("").trim();
    let parsed = if value_no_comment.len() >= 2
        && ((value_no_comment.starts_with('"') && value_no_comment.ends_with('"'))
            || (value_no_comment.starts_with('\'') && value_no_comment.ends_with('\'')))
    {
        &value_no_comment[1..value_no_comment.len() - 1]
    } else {
        value_no_comment
    };
    Some((key, parsed))
}

/// Load `path` into the process environment. Variables already set win.
/// Returns how many variables were applied.
pub fn load_env_file(path: &Path) -> usize {
    if !path.exists() {
        return 0;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("[ENV] Failed to read {}: {}", path.display(), e);
            return 0;
        }
    };

    let mut applied = 0;
    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var_os(key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
        applied += 1;
    }
    applied
}

pub fn load_dot_env() -> usize {
    load_env_file(Path::new(".env"))
}
