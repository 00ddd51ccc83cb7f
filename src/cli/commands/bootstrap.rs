use anyhow::Context;
use rand::Rng;
use rand::distr::Alphanumeric;
use sea_orm::Set;

use crate::config::Config;
use crate::entities::accounts;
use crate::services::password::hash_password_blocking;
use crate::services::validation::validate_password;
use crate::services::{AccountInfo, NewAccount};
use crate::state::SharedState;

const GENERATED_PASSWORD_LEN: usize = 20;

#[derive(Debug)]
pub enum BootstrapOutcome {
    Created {
        account: AccountInfo,
        generated_password: Option<String>,
    },
    PasswordReset {
        account: AccountInfo,
        generated_password: Option<String>,
    },
    AlreadyExists {
        account: AccountInfo,
    },
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Configured admin password, or a freshly generated one.
fn admin_password(config: &Config) -> anyhow::Result<(String, bool)> {
    match config.bootstrap.admin_password.as_deref() {
        Some(password) => {
            validate_password(password, config.security.min_password_length)
                .map_err(|e| anyhow::anyhow!("Administrator password rejected: {e}"))?;
            Ok((password.to_string(), false))
        }
        None => Ok((generate_password(), true)),
    }
}

/// Resets every setting to its default and makes sure the administrator exists.
///
/// With `force`, an existing administrator keeps its id (and with it any
/// protection) but gets a new password, is re-enabled and unlocked.
pub async fn bootstrap(state: &SharedState, force: bool) -> anyhow::Result<BootstrapOutcome> {
    let config = &state.config;

    let reset = state
        .settings_service
        .reset_to_default(None)
        .await
        .context("Failed to reset settings")?;
    tracing::info!(reset, "Settings restored to defaults");

    let username = config.bootstrap.admin_username.trim();
    let existing = state.store.accounts().get_by_username(username).await?;

    match existing {
        Some(account) if !force => Ok(BootstrapOutcome::AlreadyExists {
            account: AccountInfo::from(account),
        }),
        Some(account) => {
            let (password, generated) = admin_password(config)?;
            let hash = hash_password_blocking(&password, &config.security).await?;

            let mut active: accounts::ActiveModel = account.into();
            active.password_hash = Set(hash);
            active.failed_login_attempts = Set(0);
            active.locked_until = Set(None);
            active.is_active = Set(true);
            active.is_admin = Set(true);
            let updated = state.store.accounts().update(active).await?;

            tracing::warn!(username, "Administrator password reset");
            Ok(BootstrapOutcome::PasswordReset {
                account: AccountInfo::from(updated),
                generated_password: generated.then_some(password),
            })
        }
        None => {
            if state.store.accounts().count_total().await? > 0 {
                tracing::warn!(
                    username,
                    "Other accounts already exist; the new administrator will not be the protected account"
                );
            }

            let (password, generated) = admin_password(config)?;
            let account = state
                .account_service
                .create_account(NewAccount {
                    username: username.to_string(),
                    nickname: Some(config.bootstrap.admin_nickname.clone()),
                    email: Some(config.bootstrap.admin_email.clone()),
                    password: password.clone(),
                    is_admin: true,
                    is_active: true,
                    theme: config.bootstrap.theme,
                    notifications_enabled: config.bootstrap.notifications_enabled,
                    preferred_language: config.bootstrap.preferred_language,
                })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create administrator: {e}"))?;

            Ok(BootstrapOutcome::Created {
                account,
                generated_password: generated.then_some(password),
            })
        }
    }
}

pub async fn cmd_bootstrap(config: Config, force: bool) -> anyhow::Result<()> {
    println!("Database: {}", config.general.database_path);
    let state = SharedState::new(config).await?;

    match bootstrap(&state, force).await? {
        BootstrapOutcome::Created {
            account,
            generated_password,
        } => {
            println!(
                "✓ Created administrator '{}' [{}] (ID: {})",
                account.username,
                account.display_name(),
                account.id
            );
            print_generated(generated_password.as_deref());
        }
        BootstrapOutcome::PasswordReset {
            account,
            generated_password,
        } => {
            println!(
                "✓ Reset password for administrator '{}' (ID: {})",
                account.username, account.id
            );
            print_generated(generated_password.as_deref());
        }
        BootstrapOutcome::AlreadyExists { account } => {
            println!(
                "Administrator '{}' already exists (ID: {}); use --force to reset its password",
                account.username, account.id
            );
        }
    }

    println!("✓ Settings restored to defaults");
    Ok(())
}

fn print_generated(password: Option<&str>) {
    if let Some(password) = password {
        println!("  Generated password: {password}");
        println!("  Store it now; it will not be shown again.");
    }
}
