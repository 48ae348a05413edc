//! Value parsers for CLI arguments.

const MAX_NAME_LEN: usize = 50;
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];
const RESERVED_PREFIXES: &[&str] = &["npm", "node", "bini", "."];
const RESERVED_NAMES: &[&str] = &[
    "node_modules",
    "package.json",
    "package-lock.json",
    "favicon.ico",
    "con",
    "prn",
    "aux",
    "nul",
];

/// Validate a project name for `bini create`.
///
/// Names become both a directory and the npm package name, so only
/// `[A-Za-z0-9_.-]` is accepted.
///
/// ```
/// use bini_cli::cli::parse_project_name;
///
/// assert!(parse_project_name("my-app").is_ok());
/// assert!(parse_project_name("../escape").is_err());
/// ```
pub fn parse_project_name(s: &str) -> Result<String, String> {
    let name = s.trim();
    if name.is_empty() {
        return Err("Project name cannot be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!(
            "Project name must be at most {} characters",
            MAX_NAME_LEN
        ));
    }
    if name.contains("..") {
        return Err("Project name cannot contain '..'".to_string());
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("Project name cannot contain '{}'", c));
    }
    if let Some(prefix) = RESERVED_PREFIXES
        .iter()
        .find(|prefix| name.to_ascii_lowercase().starts_with(*prefix))
    {
        return Err(format!("Project name cannot start with '{}'", prefix));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(
            "Project name can only contain letters, numbers, '-', '_' and '.'".to_string(),
        );
    }
    if RESERVED_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(format!("'{}' is a reserved name", name));
    }

    Ok(name.to_string())
}

/// Parse a TCP port, rejecting 0.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid port number", s))?;
    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }
    Ok(port)
}
