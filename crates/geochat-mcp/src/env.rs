use std::collections::BTreeMap;

/// Variables every child process gets when present in the parent
const DEFAULT_INHERITED: &[&str] = &[
    "HOME",
    "LOGNAME",
    "PATH",
    "SHELL",
    "TERM",
    "USER",
    "APPDATA",
    "SYSTEMROOT",
    "TEMP",
];

/// Proxy settings the tool server needs to reach remote geo services
const PROXY_ALLOW_LIST: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "http_proxy",
    "https_proxy",
    "no_proxy",
];

/// Compute the environment of the tool server process.
///
/// The child starts from an empty environment; only the default inherited
/// set and the proxy allow-list are copied from `parent`, then `LOG_LEVEL`
/// is set when a level is configured. Secrets held by the parent (API keys,
/// database passwords) never reach the tool server.
pub fn forwarded_env<'a, I>(parent: I, log_level: Option<&str>) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut env: BTreeMap<String, String> = parent
        .into_iter()
        .filter(|(key, _)| DEFAULT_INHERITED.contains(key) || PROXY_ALLOW_LIST.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    if let Some(level) = log_level.filter(|l| !l.is_empty()) {
        env.insert("LOG_LEVEL".to_string(), level.to_string());
    }

    env
}

/// `forwarded_env` applied to the current process environment
pub fn forwarded_process_env(log_level: Option<&str>) -> BTreeMap<String, String> {
    let vars: Vec<(String, String)> = std::env::vars().collect();
    forwarded_env(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())), log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_not_forwarded() {
        let parent = [
            ("PATH", "/usr/bin"),
            ("HOME", "/home/geo"),
            ("ANTHROPIC_API_KEY", "sk-secret"),
            ("POSTGRES_PASSWORD", "hunter2"),
        ];
        let env = forwarded_env(parent, None);

        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
        assert_eq!(env.get("HOME").map(String::as_str), Some("/home/geo"));
        assert!(!env.contains_key("ANTHROPIC_API_KEY"));
        assert!(!env.contains_key("POSTGRES_PASSWORD"));
        assert!(!env.contains_key("LOG_LEVEL"));
    }

    #[test]
    fn test_proxies_forwarded_in_both_cases() {
        let parent = [
            ("HTTPS_PROXY", "http://proxy:3128"),
            ("no_proxy", "localhost"),
            ("ALL_PROXY", "socks5://proxy:1080"),
        ];
        let env = forwarded_env(parent, Some("debug"));

        assert_eq!(env.len(), 3);
        assert_eq!(env["HTTPS_PROXY"], "http://proxy:3128");
        assert_eq!(env["no_proxy"], "localhost");
        assert_eq!(env["LOG_LEVEL"], "debug");
    }

    #[test]
    fn test_empty_log_level_is_ignored() {
        let env = forwarded_env(std::iter::empty(), Some(""));
        assert!(env.is_empty());
    }
}
