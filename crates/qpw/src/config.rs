//! Global-flag aware profile resolution.
//!
//! The single boundary where CLI flags and `qpw_config` profiles become a
//! `qpw_core::ConnectionConfig`.

use std::time::Duration;

use clap::ValueEnum;
use qpw_config::{Config, Profile, profile_to_connection_config};
use qpw_core::ConnectionConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use qpw_config::config_path;

/// Load the config file and `QPW_` environment. A missing file yields
/// defaults; an unreadable or malformed one is an error.
pub fn load_config() -> Result<Config, CliError> {
    Ok(qpw_config::load_config()?)
}

/// `--output` / `QPW_OUTPUT` if given, otherwise `defaults.output`.
pub fn output_format(global: &GlobalOpts, config: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = &global.output {
        return Ok(format.clone());
    }
    OutputFormat::from_str(&config.defaults.output, true).map_err(|_| CliError::Validation {
        field: "defaults.output".into(),
        reason: format!(
            "unknown output format '{}'. Valid formats: table, json, json-compact, yaml, plain",
            config.defaults.output
        ),
    })
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the connection config for `profile_name`, applying flag overrides.
///
/// Without a stored profile, `--client-id` alone is enough to build one.
pub fn resolve_connection(
    global: &GlobalOpts,
    config: &Config,
    profile_name: &str,
) -> Result<ConnectionConfig, CliError> {
    let mut conn = if let Some(profile) = config.profiles.get(profile_name) {
        profile_to_connection_config(profile, &config.defaults)?
    } else if let Some(client_id) = &global.client_id {
        profile_to_connection_config(&Profile::new(client_id.clone()), &config.defaults)?
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name.into(),
            available: config.profile_names(),
        });
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    if let Some(client_id) = &global.client_id {
        conn.client_id.clone_from(client_id);
    }
    if let Some(region) = &global.region {
        conn.default_region = Some(region.clone());
    }
    if let Some(secs) = global.timeout {
        conn.timeout = Some(Duration::from_secs(secs));
    }

    Ok(conn)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["qpw"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn output_flag_beats_config_default() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        let format = output_format(&global(&["-o", "json"]), &cfg).unwrap();
        assert!(matches!(format, OutputFormat::Json));
    }

    #[test]
    fn config_default_applies_without_flag() {
        let mut cfg = Config::default();
        cfg.defaults.output = "JSON-Compact".into();
        let mut opts = global(&[]);
        opts.output = None;
        let format = output_format(&opts, &cfg).unwrap();
        assert!(matches!(format, OutputFormat::JsonCompact));
    }

    #[test]
    fn unknown_config_default_is_rejected() {
        let mut cfg = Config::default();
        cfg.defaults.output = "xml".into();
        let mut opts = global(&[]);
        opts.output = None;
        let err = output_format(&opts, &cfg).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "defaults.output"));
    }
}
