//! Persistent configuration file.
//!
//! Stored as INI at `~/.config/flowlayer/config.ini`. The CLI reads and
//! edits it through dotted keys (`animation.opacity`); embedding code can
//! turn a loaded file into a [`FlowConfig`] with
//! [`ConfigFile::flow_config`].

use std::path::{Path, PathBuf};

use ini::Ini;

use super::{ConfigError, FlowConfig};

/// Dotted keys recognized by [`ConfigFile::get`] and [`ConfigFile::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "routes.files",
    "animation.trip_duration_ms",
    "animation.particles_per_route",
    "animation.trail_length_ms",
    "animation.width_px",
    "animation.opacity",
    "logging.filter",
];

/// Contents of the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Route file URLs, stored comma-separated.
    pub route_files: Vec<String>,
    pub trip_duration_ms: f64,
    pub particles_per_route: u32,
    pub trail_length_ms: f64,
    pub width_px: f64,
    pub opacity: f64,
    /// Default tracing filter for binaries.
    pub log_filter: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = FlowConfig::default();
        Self {
            route_files: Vec::new(),
            trip_duration_ms: defaults.trip_duration_ms,
            particles_per_route: defaults.particles_per_route,
            trail_length_ms: defaults.trail_length_ms,
            width_px: defaults.width_px,
            opacity: defaults.opacity,
            log_filter: "info".to_string(),
        }
    }
}

impl ConfigFile {
    /// Default location of the configuration file.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowlayer")
            .join("config.ini")
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("routes")) {
            if let Some(files) = section.get("files") {
                config.route_files = files
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
        if let Some(section) = ini.section(Some("animation")) {
            parse_into(section.get("trip_duration_ms"), &mut config.trip_duration_ms)?;
            parse_into(
                section.get("particles_per_route"),
                &mut config.particles_per_route,
            )?;
            parse_into(section.get("trail_length_ms"), &mut config.trail_length_ms)?;
            parse_into(section.get("width_px"), &mut config.width_px)?;
            parse_into(section.get("opacity"), &mut config.opacity)?;
        }
        if let Some(section) = ini.section(Some("logging")) {
            if let Some(filter) = section.get("filter") {
                config.log_filter = filter.to_string();
            }
        }

        Ok(config)
    }

    /// Save to the default location, creating parent directories.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::File(format!("{}: {}", parent.display(), e)))?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("routes"))
            .set("files", self.route_files.join(","));
        ini.with_section(Some("animation"))
            .set("trip_duration_ms", self.trip_duration_ms.to_string())
            .set(
                "particles_per_route",
                self.particles_per_route.to_string(),
            )
            .set("trail_length_ms", self.trail_length_ms.to_string())
            .set("width_px", self.width_px.to_string())
            .set("opacity", self.opacity.to_string());
        ini.with_section(Some("logging"))
            .set("filter", self.log_filter.clone());

        ini.write_to_file(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))
    }

    /// Read a value by dotted key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "routes.files" => Some(self.route_files.join(",")),
            "animation.trip_duration_ms" => Some(self.trip_duration_ms.to_string()),
            "animation.particles_per_route" => Some(self.particles_per_route.to_string()),
            "animation.trail_length_ms" => Some(self.trail_length_ms.to_string()),
            "animation.width_px" => Some(self.width_px.to_string()),
            "animation.opacity" => Some(self.opacity.to_string()),
            "logging.filter" => Some(self.log_filter.clone()),
            _ => None,
        }
    }

    /// Write a value by dotted key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "routes.files" => {
                self.route_files = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(())
            }
            "animation.trip_duration_ms" => parse_value(key, value, &mut self.trip_duration_ms),
            "animation.particles_per_route" => {
                parse_value(key, value, &mut self.particles_per_route)
            }
            "animation.trail_length_ms" => parse_value(key, value, &mut self.trail_length_ms),
            "animation.width_px" => parse_value(key, value, &mut self.width_px),
            "animation.opacity" => parse_value(key, value, &mut self.opacity),
            "logging.filter" => {
                self.log_filter = value.to_string();
                Ok(())
            }
            _ => Err(ConfigError::File(format!("Unknown key '{}'", key))),
        }
    }

    /// Build a [`FlowConfig`] from this file.
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::new(self.route_files.clone())
            .with_trip_duration_ms(self.trip_duration_ms)
            .with_particles_per_route(self.particles_per_route)
            .with_trail_length_ms(self.trail_length_ms)
            .with_width_px(self.width_px)
            .with_opacity(self.opacity)
    }
}

fn parse_into<T: std::str::FromStr>(
    value: Option<&str>,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = value {
        *target = value
            .parse()
            .map_err(|_| ConfigError::File(format!("Invalid value '{}'", value)))?;
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    value: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    *target = value
        .parse()
        .map_err(|_| ConfigError::File(format!("Invalid value '{}' for key '{}'", value, key)))?;
    Ok(())
}
