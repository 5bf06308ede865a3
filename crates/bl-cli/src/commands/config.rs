//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use bl_core::config::{self, BoardConfig, ProjectConfig, PROJECT_CONFIG_FILE};
use bl_core::error::ConfigError;

/// The global config file to operate on
pub fn resolve_config_path(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Load the global config, falling back to defaults when the file is missing
pub fn load_board_config(config_path: Option<&PathBuf>) -> Result<BoardConfig> {
    let path = resolve_config_path(config_path);
    match config::load_config::<BoardConfig>(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(BoardConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", path)),
    }
}

/// Get a config value by key
pub fn config_get(config_path: Option<&PathBuf>, key: &str) -> Result<()> {
    let table = effective_table(config_path)?;

    // Navigate through the key path (e.g., "timing.heartbeat_interval")
    let mut current = &toml::Value::Table(table);
    for part in key.split('.') {
        match current.as_table().and_then(|t| t.get(part)) {
            Some(v) => current = v,
            None => {
                print_error(&format!("Key not found: {}", key));
                return Ok(());
            }
        }
    }

    match current {
        toml::Value::String(s) => println!("{}", s),
        toml::Value::Integer(i) => println!("{}", i),
        toml::Value::Float(f) => println!("{}", f),
        toml::Value::Boolean(b) => println!("{}", b),
        toml::Value::Array(a) => {
            for item in a {
                match item {
                    toml::Value::String(s) => println!("{}", s),
                    other => println!("{}", other),
                }
            }
        }
        toml::Value::Table(_) => println!("{}", toml::to_string_pretty(current)?),
        toml::Value::Datetime(d) => println!("{}", d),
    }

    Ok(())
}

/// Set a config value by key
///
/// The result must still deserialize into a [`BoardConfig`]; an unknown key
/// or a value of the wrong type leaves the file untouched.
pub fn config_set(config_path: Option<&PathBuf>, key: &str, value: &str) -> Result<()> {
    let path = resolve_config_path(config_path);
    let mut table = effective_table(config_path)?;

    let parts: Vec<&str> = key.split('.').collect();
    let (last_key, parents) = parts
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Invalid key: key path cannot be empty"))?;

    let mut current = &mut table;
    for part in parents {
        current = current
            .get_mut(*part)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
    }

    let existing = current
        .get(*last_key)
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
    let new_value = parse_value(existing, value);
    current.insert(last_key.to_string(), new_value);

    let updated = toml::Value::Table(table)
        .try_into::<BoardConfig>()
        .with_context(|| format!("Invalid value for {}: {}", key, value))?;
    config::save_config(&path, &updated)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    print_success(&format!("Set {} = {}", key, value));
    Ok(())
}

/// Show current configuration
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(config_path);

    if !path.exists() {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing defaults. Run 'boardlink config init' to create one");
        println!();
        println!("{}", toml::to_string_pretty(&BoardConfig::default())?);
        return Ok(());
    }

    print_info(&format!("Configuration file: {:?}", path));
    println!();

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    println!("{}", content);

    Ok(())
}

/// Initialize the global configuration with defaults
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve_config_path(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    config::save_config(&path, &BoardConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}

/// Create a project config in `project_root`, pre-filled from the global one
pub fn config_init_project(config_path: Option<&PathBuf>, project_root: &Path) -> Result<()> {
    let global = load_board_config(config_path)?;
    let target = project_root.join(PROJECT_CONFIG_FILE);

    if target.exists() {
        print_error(&format!("Project config already exists: {:?}", target));
        return Ok(());
    }

    ProjectConfig::from_global(&global)
        .create(project_root)
        .with_context(|| format!("Failed to create {:?}", target))?;

    print_success(&format!("Created project configuration: {:?}", target));
    Ok(())
}

/// Print the global config path
pub fn config_path(config_path: Option<&PathBuf>) {
    println!("{}", resolve_config_path(config_path).display());
}

/// The global config with defaults filled in, as a TOML table
fn effective_table(config_path: Option<&PathBuf>) -> Result<toml::Table> {
    let config = load_board_config(config_path)?;
    match toml::Value::try_from(&config).context("Failed to serialize config")? {
        toml::Value::Table(table) => Ok(table),
        other => anyhow::bail!("Config serialized to a {} instead of a table", other.type_str()),
    }
}

/// Interpret `raw` with the type of the value it replaces
fn parse_value(existing: &toml::Value, raw: &str) -> toml::Value {
    match existing {
        toml::Value::Boolean(_) => match raw {
            "true" => toml::Value::Boolean(true),
            "false" => toml::Value::Boolean(false),
            _ => toml::Value::String(raw.to_string()),
        },
        toml::Value::Integer(_) => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .unwrap_or_else(|_| toml::Value::String(raw.to_string())),
        toml::Value::Array(_) => toml::Value::Array(
            raw.split(',')
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(|item| toml::Value::String(item.to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw.to_string()),
    }
}
