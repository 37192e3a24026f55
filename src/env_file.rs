//! Best-effort `.env` loading.
//!
//! Lines are `KEY=VALUE`; comments, blank lines and anything that does not
//! split on `=` are skipped. A missing file is not an error — defaults apply
//! downstream. Values are never injected into the process environment; the
//! map is handed explicitly to each subprocess invocation.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

pub fn load_env_file(path: &Path) -> HashMap<String, String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            warn!("No env file at {}, using built-in defaults", path.display());
            return HashMap::new();
        }
    };

    parse_env(&contents)
}

fn parse_env(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for (lineno, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Tolerate shell-style "export KEY=VALUE"
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();

        let Some((key, value)) = line.split_once('=') else {
            debug!("Skipping malformed env line {}: {:?}", lineno + 1, raw);
            continue;
        };

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            debug!("Skipping malformed env line {}: {:?}", lineno + 1, raw);
            continue;
        }

        map.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    map
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_simple_pairs() {
        let map = parse_env("DB_NAME=tasks\nDB_USER=app\n");
        assert_eq!(map.get("DB_NAME").unwrap(), "tasks");
        assert_eq!(map.get("DB_USER").unwrap(), "app");
    }

    #[test]
    fn skips_comments_blanks_and_malformed_lines() {
        let map = parse_env("# comment\n\nnot a pair\nKEY=value\nBAD KEY=x\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("KEY").unwrap(), "value");
    }

    #[test]
    fn strips_quotes_and_export_prefix() {
        let map = parse_env("export DB_PASSWORD=\"s3cret\"\nURL='http://x'\n");
        assert_eq!(map.get("DB_PASSWORD").unwrap(), "s3cret");
        assert_eq!(map.get("URL").unwrap(), "http://x");
    }

    #[test]
    fn value_may_contain_equals() {
        let map = parse_env("TOKEN=abc=def==\n");
        assert_eq!(map.get("TOKEN").unwrap(), "abc=def==");
    }

    #[test]
    fn missing_file_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_env_file(&dir.path().join(".env"));
        assert!(map.is_empty());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "DB_NAME=from_disk").unwrap();

        let map = load_env_file(&path);
        assert_eq!(map.get("DB_NAME").unwrap(), "from_disk");
    }
}
