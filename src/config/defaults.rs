//! Default values for configuration

/// Default user agent, overridable through `SITEMAP_VALIDATOR_USER_AGENT`
pub fn default_user_agent() -> String {
    std::env::var("SITEMAP_VALIDATOR_USER_AGENT").unwrap_or_else(|_| {
        format!(
            "sitemap-validator/{} (+https://github.com/withvision/XML-Sitemap-Validator)",
            env!("CARGO_PKG_VERSION")
        )
    })
}

/// Default request timeout in seconds
pub fn default_http_timeout() -> u64 {
    10
}

/// Default number of sitemap URLs probed per run
pub fn default_sample_urls_count() -> usize {
    5
}

/// Default number of probes in flight at once
pub fn default_probe_concurrency() -> usize {
    5
}

/// Default: verify TLS certificates
pub fn default_verify_ssl() -> bool {
    true
}

/// Default hard ceiling for sitemap bodies (150 MiB)
pub fn default_max_filesize() -> u64 {
    150 * 1024 * 1024
}
