//! Config command implementation

use crate::config::Config;
use crate::error::Result;

/// Render the effective configuration, optionally writing it to its path
pub fn cmd_config(config: &Config, save: bool) -> Result<String> {
    if save {
        config.save()?;
    }
    Ok(toml::to_string_pretty(config)?)
}

/// Print the rendered configuration
pub fn print_config(config: &Config, rendered: &str, saved: bool) {
    println!("# {}", config.paths.config_file.display());
    println!("{}", rendered);
    if saved {
        println!("✓ Config written to {}", config.paths.config_file.display());
    }
}
