//! CLI configuration: thin wrapper around `streamtopo_config` that applies
//! `GlobalOpts` flag overrides (--controller, --insecure, --timeout).

use streamtopo_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use streamtopo_config::{Config, Profile, config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `ControllerConfig` for a controller-bound command.
///
/// Flag > env > profile > defaults. Without a matching profile, a
/// `--controller` URL alone is enough.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: cfg.profile_names(),
            });
        }
        None => {
            let url = global.controller.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url)
        }
    };

    if let Some(ref url) = global.controller {
        profile.controller.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    tracing::debug!(profile = %profile_name, controller = %profile.controller, "resolved controller");
    Ok(streamtopo_config::profile_to_controller_config(
        &profile,
        &cfg.defaults,
    )?)
}
