//! Saved defaults for the command line.
//!
//! Config files hold plain CLI flag tokens, one or more per line, with `#`
//! comments. The global file is merged with a local `.coreblogrc`, then the
//! flags given on the command line win over both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cache::DEFAULT_TTL;
use crate::page::LinkStyle;
use crate::repository::DEFAULT_MANIFEST;
use crate::source::DEFAULT_TIMEOUT;

/// Cache file used when none is configured.
pub const DEFAULT_CACHE_FILE: &str = ".coreblog-cache.json";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub source: Option<String>,
    pub manifest: Option<String>,
    pub cache_file: Option<PathBuf>,
    pub ttl_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub links: Option<LinkStyle>,
    pub no_cache: bool,
    pub verbose: bool,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            source: other.source.clone().or_else(|| self.source.clone()),
            manifest: other.manifest.clone().or_else(|| self.manifest.clone()),
            cache_file: other.cache_file.clone().or_else(|| self.cache_file.clone()),
            ttl_ms: other.ttl_ms.or(self.ttl_ms),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            links: other.links.or(self.links),
            no_cache: self.no_cache || other.no_cache,
            verbose: self.verbose || other.verbose,
        }
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(".")
    }

    pub fn manifest(&self) -> &str {
        self.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl_ms.map_or(DEFAULT_TTL, Duration::from_millis)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    pub fn links(&self) -> LinkStyle {
        self.links.unwrap_or_default()
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("coreblog").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("coreblog")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("coreblog").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("coreblog").join("config");
        }
    }

    PathBuf::from(".coreblogrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".coreblogrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# coreblog defaults (saved with --save)".to_string());
    if let Some(source) = &flags.source {
        lines.push(format!("--source {source}"));
    }
    if let Some(manifest) = &flags.manifest {
        lines.push(format!("--manifest {manifest}"));
    }
    if let Some(cache_file) = &flags.cache_file {
        lines.push(format!("--cache-file {}", cache_file.display()));
    }
    if let Some(ttl_ms) = flags.ttl_ms {
        lines.push(format!("--ttl-ms {ttl_ms}"));
    }
    if let Some(timeout_secs) = flags.timeout_secs {
        lines.push(format!("--timeout-secs {timeout_secs}"));
    }
    if let Some(links) = flags.links {
        let links_str = match links {
            LinkStyle::Query => "query",
            LinkStyle::Files => "files",
        };
        lines.push(format!("--links {links_str}"));
    }
    if flags.no_cache {
        lines.push("--no-cache".to_string());
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; everything else is ignored.
///
/// Value flags accept both `--flag value` and `--flag=value`. Numeric values
/// that do not parse are dropped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--no-cache" {
            flags.no_cache = true;
        } else if token == "--verbose" || token == "-v" {
            flags.verbose = true;
        } else if let Some((name, inline)) = split_value_flag(token) {
            let value = match inline {
                Some(value) => Some(value.to_string()),
                None => {
                    let next = tokens.get(i + 1).cloned();
                    if next.is_some() {
                        i += 1;
                    }
                    next
                }
            };
            if let Some(value) = value {
                apply_value(&mut flags, name, &value);
            }
        }
        i += 1;
    }
    flags
}

const VALUE_FLAGS: &[&str] = &[
    "--source",
    "--manifest",
    "--cache-file",
    "--ttl-ms",
    "--timeout-secs",
    "--links",
];

fn split_value_flag(token: &str) -> Option<(&str, Option<&str>)> {
    let (name, inline) = match token.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (token, None),
    };
    VALUE_FLAGS.contains(&name).then_some((name, inline))
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--source" => flags.source = Some(value.to_string()),
        "--manifest" => flags.manifest = Some(value.to_string()),
        "--cache-file" => flags.cache_file = Some(PathBuf::from(value)),
        "--ttl-ms" => flags.ttl_ms = value.parse().ok(),
        "--timeout-secs" => flags.timeout_secs = value.parse().ok(),
        "--links" => flags.links = parse_links(value),
        _ => {}
    }
}

fn parse_links(s: &str) -> Option<LinkStyle> {
    match s {
        "query" => Some(LinkStyle::Query),
        "files" => Some(LinkStyle::Files),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "coreblog",
            "--source",
            "https://blog.example.com/",
            "--ttl-ms=1000",
            "--no-cache",
            "--links",
            "files",
            "build",
            "--out",
            "public",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.source.as_deref(), Some("https://blog.example.com/"));
        assert_eq!(flags.ttl_ms, Some(1000));
        assert!(flags.no_cache);
        assert_eq!(flags.links, Some(LinkStyle::Files));
        assert_eq!(flags.manifest, None);
    }

    #[test]
    fn test_invalid_numbers_are_dropped() {
        let flags = parse_flag_tokens(&tokens(&["--ttl-ms", "soon", "--timeout-secs=x"]));
        assert_eq!(flags.ttl_ms, None);
        assert_eq!(flags.timeout_secs, None);
    }

    #[test]
    fn test_defaults_when_unset() {
        let flags = ConfigFlags::default();
        assert_eq!(flags.source(), ".");
        assert_eq!(flags.manifest(), "posts/list.txt");
        assert_eq!(flags.cache_file(), PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(flags.ttl(), Duration::from_millis(259_200_000));
        assert_eq!(flags.timeout(), Duration::from_secs(30));
        assert_eq!(flags.links(), LinkStyle::Query);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_cache: true,
            ttl_ms: Some(10),
            source: Some("site".to_string()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            verbose: true,
            ttl_ms: Some(20),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_cache);
        assert!(merged.verbose);
        assert_eq!(merged.ttl_ms, Some(20));
        assert_eq!(merged.source.as_deref(), Some("site"));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".coreblogrc");
        let flags = ConfigFlags {
            source: Some("https://blog.example.com/".to_string()),
            manifest: Some("posts/list.txt".to_string()),
            cache_file: Some(PathBuf::from("cache.json")),
            ttl_ms: Some(60_000),
            timeout_secs: Some(5),
            links: Some(LinkStyle::Files),
            no_cache: true,
            verbose: true,
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
