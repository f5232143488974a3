use chrono::Utc;
use clap::Parser;
use pdash_common::params::AuthSetupParams;
use pdash_db::{
    password::hash_password,
    storage::{SessionStore, SettingsStore},
};

#[derive(Clone, Parser)]
pub struct SetPasswordParams {
    #[clap(short, long)]
    pub password: String,
}

pub async fn reset_password(stg: &(impl SessionStore + SettingsStore)) -> anyhow::Result<()> {
    let mut settings = SettingsStore::get_settings(stg).await?;
    settings.password_hash = None;
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(stg, settings).await?;

    let revoked = SessionStore::delete_all_sessions(stg).await?;
    println!("Dashboard password removed, {revoked} session(s) ended");

    Ok(())
}

pub async fn set_password(
    stg: &(impl SessionStore + SettingsStore),
    SetPasswordParams { password }: SetPasswordParams,
) -> anyhow::Result<()> {
    AuthSetupParams {
        password: password.clone(),
    }
    .validate()?;

    let mut settings = SettingsStore::get_settings(stg).await?;
    settings.password_hash = Some(hash_password(&password)?);
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(stg, settings).await?;

    let revoked = SessionStore::delete_all_sessions(stg).await?;
    println!("Dashboard password set, {revoked} session(s) ended");

    Ok(())
}

pub async fn clear_sessions(stg: &impl SessionStore) -> anyhow::Result<()> {
    let revoked = SessionStore::delete_all_sessions(stg).await?;
    println!("{revoked} session(s) ended");

    Ok(())
}
