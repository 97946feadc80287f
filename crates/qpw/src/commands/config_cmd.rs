//! Config subcommand handlers. None of these touch the network.

use dialoguer::Input;

use qpw_config::{Config, DEFAULT_REDIRECT_URI, Profile, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::{CliError, prompt_err};
use crate::output;

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let available = cfg.profile_names();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available
        },
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let mut cfg = config::load_config()?;
            eprintln!("qpw configuration wizard");
            eprintln!("   Config path: {}\n", config::config_path().display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(config::active_profile_name(global, &cfg))
                .interact_text()
                .map_err(prompt_err)?;

            let client_id: String = Input::new()
                .with_prompt("OAuth client id")
                .interact_text()
                .map_err(prompt_err)?;
            if client_id.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "client_id".into(),
                    reason: "client id cannot be empty".into(),
                });
            }

            let region: String = Input::new()
                .with_prompt("Region (e.g. mypurecloud.ie)")
                .interact_text()
                .map_err(prompt_err)?;

            let redirect_uri: String = Input::new()
                .with_prompt("Redirect URI registered for the client")
                .default(DEFAULT_REDIRECT_URI.into())
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(client_id.trim());
            profile.region = Some(region.trim().to_owned()).filter(|r| !r.is_empty());
            profile.redirect_uri = redirect_uri;

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: qpw login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = config::output_format(global, &cfg)?;
            let out = output::render_single(
                &format,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.profile_names(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));

            match key.as_str() {
                "client_id" | "client-id" => profile.client_id = value,
                "redirect_uri" | "redirect-uri" => profile.redirect_uri = value,
                "region" => profile.region = Some(value),
                "api_base" | "api-base" => profile.api_base = Some(value),
                "login_base" | "login-base" => profile.login_base = Some(value),
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                "max_pages" | "max-pages" => {
                    profile.max_pages = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "max_pages".into(),
                        reason: "must be a positive number".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: client_id, redirect_uri, \
                             region, api_base, login_base, timeout, max_pages"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            eprintln!("Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: qpw config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort_unstable();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }
    }
}
