//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod simulate;

use flowlayer::config::{ConfigFile, FlowConfig};

use crate::error::CliError;

/// Build the flow config from CLI route arguments, falling back to the
/// configuration file when none were given.
fn resolve_flow_config(routes: Vec<String>) -> Result<FlowConfig, CliError> {
    resolve_with(routes, ConfigFile::load().ok())
}

fn resolve_with(routes: Vec<String>, stored: Option<ConfigFile>) -> Result<FlowConfig, CliError> {
    let config = if routes.is_empty() {
        let file = stored.ok_or_else(|| {
            CliError::Config(
                "No route files given and no configuration file found. \
                 Pass route URLs or set routes.files with 'flowlayer config set'."
                    .to_string(),
            )
        })?;
        file.flow_config()
    } else {
        FlowConfig::new(routes)
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_file() -> ConfigFile {
        let mut file = ConfigFile::default();
        file.route_files = vec!["http://r/stored.json".to_string()];
        file.particles_per_route = 4;
        file.trip_duration_ms = 5_000.0;
        file
    }

    #[test]
    fn test_explicit_routes_win_over_stored_config() {
        let config = resolve_with(
            vec!["http://r/cli.json".to_string()],
            Some(stored_file()),
        )
        .unwrap();
        assert_eq!(config.route_files, vec!["http://r/cli.json".to_string()]);
        // Defaults apply, not the stored animation settings.
        assert_eq!(config.particles_per_route, 15);
    }

    #[test]
    fn test_empty_routes_fall_back_to_stored_config() {
        let config = resolve_with(Vec::new(), Some(stored_file())).unwrap();
        assert_eq!(config.route_files, vec!["http://r/stored.json".to_string()]);
        assert_eq!(config.particles_per_route, 4);
        assert_eq!(config.loop_clock().loop_duration_ms(), 20_000.0);
    }

    #[test]
    fn test_no_routes_and_no_config_file_errors() {
        let result = resolve_with(Vec::new(), None);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_stored_config_without_routes_is_rejected() {
        // A config file exists but routes.files was never set.
        let result = resolve_with(Vec::new(), Some(ConfigFile::default()));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_resolves_from_config_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut file = ConfigFile::default();
        file.set("routes.files", "http://r/a.json, http://r/b.json")
            .unwrap();
        file.set("animation.particles_per_route", "6").unwrap();
        file.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        let config = resolve_with(Vec::new(), Some(loaded)).unwrap();
        assert_eq!(config.route_files.len(), 2);
        assert_eq!(config.particles_per_route, 6);
        assert!(config.validate().is_ok());
    }
}
