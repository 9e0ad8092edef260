//! Config subcommand handlers.

use std::str::FromStr;

use dialoguer::{Confirm, Input, Select};

use vouchly_core::{ApiLayout, ListingMode, UploadEncoding};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const SET_KEYS: &str = "backend, api_layout, listing, upload, username, password, token_store, \
    default_type, insecure, timeout, ca_cert, refresh_interval, payment.site, \
    payment.public_key, payment.amount_minor, payment.currency, payment.success_page, \
    payment.email, payment.email_domain, payment.voucher_type";

// ── Helpers ─────────────────────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value
        .parse()
        .map_err(|_| invalid(field, "must be 'true' or 'false'"))
}

fn parse_number(field: &str, value: &str) -> Result<u64, CliError> {
    value
        .parse()
        .map_err(|_| invalid(field, "must be a non-negative number"))
}

/// Check a choice parses, then store its canonical spelling.
fn parse_choice<T>(field: &str, value: &str) -> Result<String, CliError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    T::from_str(value)
        .map(|v| v.to_string())
        .map_err(|e| invalid(field, e.to_string()))
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<String, CliError> {
    let lowered = value.trim().to_ascii_lowercase();
    if allowed.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(invalid(field, format!("expected one of: {}", allowed.join(", "))))
    }
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let normalized = key.replace('-', "_");
    if let Some(sub) = normalized.strip_prefix("payment.") {
        return set_payment_key(profile, key, sub, value);
    }
    match normalized.as_str() {
        "backend" => {
            url::Url::parse(&value).map_err(|e| invalid("backend", format!("invalid URL: {e}")))?;
            profile.backend = value;
        }
        "api_layout" => profile.api_layout = parse_choice::<ApiLayout>("api_layout", &value)?,
        "listing" => profile.listing = parse_choice::<ListingMode>("listing", &value)?,
        "upload" => profile.upload = parse_choice::<UploadEncoding>("upload", &value)?,
        "username" => profile.username = Some(value),
        "password" => profile.password = Some(value),
        "token_store" => {
            profile.token_store = one_of("token_store", &value, &["keyring", "file", "memory"])?;
        }
        "default_type" => profile.default_type = Some(value.trim().to_uppercase()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "refresh_interval" => {
            profile.refresh_interval = Some(parse_number("refresh_interval", &value)?);
        }
        other => {
            return Err(invalid(
                other,
                format!("unknown config key '{other}'. Valid keys: {SET_KEYS}"),
            ));
        }
    }
    Ok(())
}

fn set_payment_key(profile: &mut Profile, key: &str, sub: &str, value: String) -> Result<(), CliError> {
    let payment = profile.payment.get_or_insert_with(Default::default);
    match sub {
        "site" => payment.site = Some(value),
        "public_key" => payment.public_key = value,
        "amount_minor" => {
            payment.amount_minor = Some(parse_number("payment.amount_minor", &value)?);
        }
        "currency" => payment.currency = Some(value.trim().to_uppercase()),
        "success_page" => payment.success_page = Some(value),
        "email" => {
            payment.email = Some(one_of("payment.email", &value, &["required", "generated"])?);
        }
        "email_domain" => payment.email_domain = Some(value),
        "voucher_type" => payment.voucher_type = Some(value.trim().to_uppercase()),
        other => {
            return Err(invalid(
                key,
                format!("unknown payment key '{other}'. Valid keys: {SET_KEYS}"),
            ));
        }
    }
    Ok(())
}

/// Copy of the config with plaintext passwords masked.
fn masked(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    for profile in shown.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    shown
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("vouchly configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let backend: String = Input::new()
        .with_prompt("Backend site URL")
        .default("https://vouchers.example.com".into())
        .interact_text()
        .map_err(prompt_err)?;
    url::Url::parse(&backend).map_err(|e| invalid("backend", format!("invalid URL: {e}")))?;

    let layouts = &["/admin/<resource>", "/admin/api/<resource>"];
    let layout = Select::new()
        .with_prompt("Admin route layout")
        .items(layouts)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Admin username (leave empty if the backend only asks for a password)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Admin password (empty to enter at login): ")
        .map_err(prompt_err)?;

    let mut profile = Profile::new(backend);
    profile.api_layout = if layout == 0 { "prefixed" } else { "namespaced" }.into();
    profile.username = Some(username).filter(|u| !u.trim().is_empty());

    let stores = &[
        "System keyring (recommended)",
        "File in the data directory",
        "Don't store sessions",
    ];
    let store = Select::new()
        .with_prompt("Where should login sessions be kept?")
        .items(stores)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    profile.token_store = match store {
        0 => "keyring",
        1 => "file",
        _ => "memory",
    }
    .into();

    if !password.is_empty() {
        let choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let choice = Select::new()
            .with_prompt("Where to store the password?")
            .items(choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        if choice == 0 {
            vouchly_config::store_password(&profile_name, &password)?;
            eprintln!("   ✓ Password stored in system keyring");
        } else {
            profile.password = Some(password);
        }
    }

    let sells = Confirm::new()
        .with_prompt("Configure buyer checkout (pay commands)?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    if sells {
        let public_key: String = Input::new()
            .with_prompt("Payment provider public key")
            .interact_text()
            .map_err(prompt_err)?;
        profile.payment = Some(vouchly_config::PaymentProfile {
            public_key,
            ..Default::default()
        });
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Next: vouchly login");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = masked(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{e}")),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(""));

            set_profile_key(profile, &key, value)?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: vouchly config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let secret = rpassword::prompt_password("Admin password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(invalid("password", "value cannot be empty"));
            }
            vouchly_config::store_password(&profile_name, &secret)?;
            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn choices_are_canonicalized() {
        let mut profile = Profile::new("https://v.example.com");
        set_profile_key(&mut profile, "api-layout", "Namespaced".into()).unwrap();
        set_profile_key(&mut profile, "token_store", "FILE".into()).unwrap();
        assert_eq!(profile.api_layout, "namespaced");
        assert_eq!(profile.token_store, "file");
    }

    #[test]
    fn payment_keys_create_section() {
        let mut profile = Profile::new("https://v.example.com");
        set_profile_key(&mut profile, "payment.public_key", "pk_1".into()).unwrap();
        set_profile_key(&mut profile, "payment.currency", "ghs".into()).unwrap();
        let payment = profile.payment.unwrap();
        assert_eq!(payment.public_key, "pk_1");
        assert_eq!(payment.currency.as_deref(), Some("GHS"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut profile = Profile::new("https://v.example.com");
        assert!(set_profile_key(&mut profile, "listing", "rss".into()).is_err());
        assert!(set_profile_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut profile, "backend", "nope".into()).is_err());
        assert!(set_profile_key(&mut profile, "colour", "red".into()).is_err());
        assert!(set_profile_key(&mut profile, "payment.tip", "1".into()).is_err());
    }

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("https://v.example.com");
        profile.password = Some("hunter2".into());
        cfg.profiles.insert("default".into(), profile);

        let shown = masked(&cfg);
        assert_eq!(
            shown.profiles["default"].password.as_deref(),
            Some("********")
        );
    }
}
