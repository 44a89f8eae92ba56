//! Configuration resolution for recipe-server
//!
//! Combines command-line arguments (with environment fallbacks), the
//! optional TOML file and compiled defaults into one [`ServerConfig`].
//! Priority: CLI/ENV → TOML → defaults.

use clap::Parser;
use recipe_common::config::{CompiledDefaults, RootFolderResolver, TomlConfig};
use std::path::PathBuf;

/// Command-line arguments for recipe-server
#[derive(Parser, Debug, Default)]
#[command(name = "recipe-server")]
#[command(about = "Recipe Manager HTTP API")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RECIPE_PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "RECIPE_HOST")]
    pub host: Option<String>,

    /// Folder holding recipes.db and the uploads directory
    /// (falls back to RECIPE_ROOT_FOLDER, then the config file)
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "RECIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Largest accepted image upload in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Fully resolved bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl ServerConfig {
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();

        let root_folder = RootFolderResolver::new("recipe-server")
            .with_cli_arg(args.root_folder.clone())
            .with_toml(toml)
            .resolve();

        Self {
            root_folder,
            host: args
                .host
                .clone()
                .or_else(|| toml.host.clone())
                .unwrap_or(defaults.host),
            port: args.port.or(toml.port).unwrap_or(defaults.port),
            max_upload_bytes: args
                .max_upload_bytes
                .or(toml.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            log_level: resolve_log_level(args, toml),
        }
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default tracing filter when RUST_LOG is not set
    pub fn log_filter(&self) -> String {
        log_filter(&self.log_level)
    }
}

/// Log level alone, for starting tracing before the rest is resolved
pub fn resolve_log_level(args: &Args, toml: &TomlConfig) -> String {
    args.log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone())
}

pub fn log_filter(level: &str) -> String {
    format!("recipe_server={level},recipe_common={level},tower_http={level}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_cli_overrides_toml() {
        let args = Args::parse_from([
            "recipe-server",
            "--port",
            "7000",
            "--root-folder",
            "/tmp/recipes-cli",
            "--log-level",
            "debug",
        ]);
        let toml = TomlConfig {
            port: Some(6000),
            host: Some("127.0.0.1".into()),
            max_upload_bytes: Some(1024),
            ..Default::default()
        };

        let config = ServerConfig::resolve(&args, &toml);
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.root_folder, PathBuf::from("/tmp/recipes-cli"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_address(), "127.0.0.1:7000");
    }

    #[test]
    fn test_defaults() {
        let args = Args {
            root_folder: Some(PathBuf::from("/tmp/recipes-default")),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&args, &TomlConfig::default());

        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.log_level, "info");
        assert!(config.log_filter().contains("recipe_server=info"));
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        std::env::set_var("RECIPE_CONFIG", "/tmp/recipe-env.toml");
        let args = Args::parse_from(["recipe-server"]);
        std::env::remove_var("RECIPE_CONFIG");

        assert_eq!(args.config, Some(PathBuf::from("/tmp/recipe-env.toml")));

        // Flag wins over the environment
        std::env::set_var("RECIPE_CONFIG", "/tmp/recipe-env.toml");
        let args = Args::parse_from(["recipe-server", "--config", "/tmp/recipe-cli.toml"]);
        std::env::remove_var("RECIPE_CONFIG");

        assert_eq!(args.config, Some(PathBuf::from("/tmp/recipe-cli.toml")));
    }
}
