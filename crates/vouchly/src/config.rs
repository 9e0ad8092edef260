//! CLI configuration: a thin wrapper around `vouchly_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--backend,
//! --insecure, --timeout).

use std::time::Duration;

use vouchly_core::{ConsoleConfig, PaymentConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vouchly_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Pick the active profile and apply flag overrides.
///
/// Without a matching profile, `--backend` alone is enough to build an
/// ad-hoc one with default settings.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);

    let mut profile = match (config.profiles.get(&name), global.backend.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(backend)) => Profile::new(backend),
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref backend) = global.backend {
        profile.backend.clone_from(backend);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    Ok((name, profile))
}

/// Translate a resolved profile into a `ConsoleConfig`. The CLI never
/// refreshes in the background.
pub fn console_config(profile: &Profile, global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let mut config = vouchly_config::profile_to_console_config(profile)?;
    config.timeout = Duration::from_secs(global.timeout);
    config.refresh_interval_secs = 0;
    Ok(config)
}

pub fn payment_config(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<PaymentConfig, CliError> {
    let mut config = vouchly_config::profile_to_payment_config(profile, profile_name)?;
    config.timeout = Duration::from_secs(global.timeout);
    Ok(config)
}
