use chrono::{DateTime, TimeZone};
use std::env;
use std::path::PathBuf;

/// Format of the per-run backup directory; sorts lexicographically by time
pub const RUN_DIRECTORY_FORMAT: &str = "%Y_%m_%d__%H%M%S";

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_NAME_LENGTH: usize = 255;

pub fn run_directory_name<Tz: TimeZone>(started: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    started.format(RUN_DIRECTORY_FORMAT).to_string()
}

/// Expands environment variables and a leading `~` in a configured path
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_env_vars(raw);

    if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = expanded
        .strip_prefix("~/")
        .or_else(|| expanded.strip_prefix("~\\"))
    {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(expanded)
}

/// Expands `%VAR%`, `$VAR` and `${VAR}`. Unknown variables are left as written.
pub fn expand_env_vars(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '%' => {
                if let Some(len) = chars[i + 1..].iter().position(|&c| c == '%') {
                    let name: String = chars[i + 1..i + 1 + len].iter().collect();
                    if is_var_name(&name) {
                        if let Ok(value) = env::var(&name) {
                            out.push_str(&value);
                            i += len + 2;
                            continue;
                        }
                    }
                }
                out.push('%');
                i += 1;
            }
            '$' if chars.get(i + 1) == Some(&'{') => {
                if let Some(len) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let name: String = chars[i + 2..i + 2 + len].iter().collect();
                    if let Ok(value) = env::var(&name) {
                        out.push_str(&value);
                        i += len + 3;
                        continue;
                    }
                }
                out.push('$');
                i += 1;
            }
            '$' => {
                let len = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                    .count();
                let name: String = chars[i + 1..i + 1 + len].iter().collect();
                match env::var(&name) {
                    Ok(value) if len > 0 => {
                        out.push_str(&value);
                        i += len + 1;
                    }
                    _ => {
                        out.push('$');
                        i += 1;
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == ')')
}

/// Turns an arbitrary label into a name usable as a directory on Windows and Unix
pub fn make_safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c) && !c.is_control())
        .collect();

    let mut safe = cleaned.trim_matches(|c| c == '.' || c == ' ').to_string();

    let stem = safe.split('.').next().unwrap_or("").to_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        safe.insert(0, '_');
    }

    if safe.is_empty() {
        safe = "_empty_".to_string();
    }

    safe.chars().take(MAX_NAME_LENGTH).collect()
}
