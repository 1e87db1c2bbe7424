//! Account CLI commands.

use anyhow::Result;
use console::style;
use dialoguer::Input;

use parley_core::identity::check_human_handle;
use parley_core::repository::AccountRepository;
use parley_infra::crypto::token::{generate_token, hash_token};
use parley_types::account::Account;

use crate::state::AppState;

/// Create a human account and issue its bearer token.
///
/// ```bash
/// parley account create --handle ana --name "Ana"
/// ```
pub async fn create_account(
    state: &AppState,
    handle: Option<String>,
    name: Option<String>,
    json: bool,
) -> Result<()> {
    let handle = match handle {
        Some(h) => h,
        None => Input::<String>::new().with_prompt("Handle").interact_text()?,
    };
    let handle = handle.trim().to_lowercase();
    check_human_handle(&handle)?;

    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .default(handle.clone())
            .interact_text()?,
    };

    if state.accounts.get_by_handle(&handle).await?.is_some() {
        anyhow::bail!("an account with handle '{handle}' already exists");
    }

    let account = state
        .accounts
        .create(&Account::new(handle, name.trim()))
        .await?;

    let token = generate_token();
    state
        .accounts
        .add_token(&account.id, &hash_token(&token))
        .await?;

    tracing::info!(account_id = %account.id, handle = %account.handle, "Account created");

    if json {
        let out = serde_json::json!({
            "account": account,
            "token": token,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} Account created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Handle:").bold(), style(&account.handle).cyan());
    println!("  {}    {}", style("Name:").bold(), &account.display_name);
    println!("  {}      {}", style("ID:").bold(), style(account.id.to_string()).dim());
    println!();
    println!(
        "  {} Bearer token (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();

    Ok(())
}
