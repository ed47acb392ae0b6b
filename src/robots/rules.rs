//! robots.txt parsing

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

static DIRECTIVE: OnceLock<Regex> = OnceLock::new();

fn directive_pattern() -> &'static Regex {
    DIRECTIVE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z-]+)\s*:\s*(.*?)\s*$").expect("directive pattern compiles")
    })
}

/// Agents whose rules decide whether a URL counts as blocked
const RELEVANT_AGENTS: &[&str] = &["*", "googlebot"];

/// Parsed robots.txt rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// `(user-agent, disallow path)` in file order
    disallows: Vec<(String, String)>,
    /// `Sitemap:` values in file order
    sitemaps: Vec<String>,
}

impl RobotsRules {
    /// Parse robots.txt content
    ///
    /// Consecutive `User-agent` lines form one group that shares the rules
    /// following them. `Sitemap` lines are global and may appear anywhere.
    pub fn parse(content: &str) -> Self {
        let mut rules = Self::default();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_run = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let Some(caps) = directive_pattern().captures(line) else {
                continue;
            };
            let name = caps[1].to_ascii_lowercase();
            let value = caps[2].to_string();

            match name.as_str() {
                "user-agent" => {
                    if !in_agent_run {
                        group.clear();
                    }
                    group.push(value);
                    in_agent_run = true;
                }
                "disallow" => {
                    in_agent_run = false;
                    for agent in &group {
                        rules.disallows.push((agent.clone(), value.clone()));
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        rules.sitemaps.push(value);
                    }
                }
                _ => in_agent_run = false,
            }
        }

        rules
    }

    /// Rules that block nothing and list no sitemaps
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// `(user-agent, disallow path)` pairs in file order
    pub fn disallows(&self) -> &[(String, String)] {
        &self.disallows
    }

    /// Whether a `Disallow` for `*` or Googlebot is a prefix of `path`
    ///
    /// An empty `Disallow:` allows everything. A bare `Disallow: /` is
    /// ignored and never blocks.
    pub fn is_blocked(&self, path: &str) -> bool {
        let blocked = self.disallows.iter().any(|(agent, disallow)| {
            RELEVANT_AGENTS
                .iter()
                .any(|relevant| agent.eq_ignore_ascii_case(relevant))
                && !disallow.is_empty()
                && disallow != "/"
                && path.starts_with(disallow.as_str())
        });

        if blocked {
            debug!("robots.txt disallows {}", path);
        }
        blocked
    }

    /// [`is_blocked`](Self::is_blocked) for the path of a full URL
    pub fn is_url_blocked(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.is_blocked(parsed.path()),
            Err(_) => false,
        }
    }

    /// Whether a `Sitemap:` line names `sitemap_url` exactly
    pub fn references(&self, sitemap_url: &str) -> bool {
        let parsed = Url::parse(sitemap_url).ok();
        self.sitemaps.iter().any(|declared| {
            declared == sitemap_url
                || parsed
                    .as_ref()
                    .zip(Url::parse(declared).ok())
                    .is_some_and(|(wanted, declared)| *wanted == declared)
        })
    }
}
