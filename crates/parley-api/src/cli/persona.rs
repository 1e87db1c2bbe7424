//! Persona CLI commands: seed, create, list.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use parley_core::repository::{AccountRepository, PersonaRepository};
use parley_types::account::AccountId;
use parley_types::persona::{NewPersona, Persona, ResponseStyle};

use crate::state::AppState;

/// Provision every built-in catalog persona that does not exist yet.
pub async fn seed_personas(state: &AppState, json: bool) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Seeding built-in personas...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let owner = state.provisioner.ensure_system_account().await?;
    let created = state
        .provisioner
        .seed_builtins(&state.catalog, &owner.id)
        .await?;

    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    }

    println!();
    if created.is_empty() {
        println!(
            "  {} Built-in personas are already provisioned.",
            style("i").blue().bold()
        );
    } else {
        for persona in &created {
            println!(
                "  {} {} {}",
                style("✓").green().bold(),
                style(&persona.display_name).cyan(),
                style(format!("({})", persona.builtin_key.as_deref().unwrap_or_default())).dim()
            );
        }
    }
    println!();

    Ok(())
}

/// Fields for `parley persona create`, prompted for when not given as flags.
pub struct CreatePersonaArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub style: Option<String>,
    pub background: Option<String>,
    pub owner: Option<String>,
}

/// Author a new persona and provision its shadow identity.
///
/// ```bash
/// parley persona create --name "Nova" --description "A stargazer." \
///     --personality "Curious and gentle" --style calm
/// ```
pub async fn create_persona(state: &AppState, args: CreatePersonaArgs, json: bool) -> Result<()> {
    let name = prompt_if_missing(args.name, "Persona name", None)?;
    let description = prompt_if_missing(
        args.description,
        "Short description",
        Some(format!("A persona named {name}")),
    )?;
    let personality = prompt_if_missing(args.personality, "Personality", None)?;

    let response_style = match args.style {
        Some(s) => s.parse::<ResponseStyle>().map_err(|e| anyhow::anyhow!(e))?,
        None => ResponseStyle::default(),
    };

    let owner = resolve_owner(state, args.owner.as_deref()).await?;

    let (persona, shadow) = state
        .provisioner
        .provision(
            &owner,
            NewPersona {
                display_name: name,
                description,
                personality,
                background: args.background.unwrap_or_default(),
                response_style,
                ..Default::default()
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&persona)?);
        return Ok(());
    }

    println!();
    println!("  {} Persona created", style("✓").green().bold());
    println!();
    println!("  {}   {}", style("Name:").bold(), style(&persona.display_name).cyan());
    println!("  {}  {}", style("Style:").bold(), persona.response_style);
    println!("  {}     {}", style("ID:").bold(), style(persona.id.to_string()).dim());
    println!("  {} {}", style("Shadow:").bold(), style(&shadow.handle).dim());
    println!();
    println!(
        "  Start a chat with personaToken {}",
        style(persona.id.to_string()).yellow()
    );
    println!();

    Ok(())
}

/// List public personas in a table.
pub async fn list_personas(state: &AppState, json: bool) -> Result<()> {
    let personas = state.personas.list_public().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&personas)?);
        return Ok(());
    }

    if personas.is_empty() {
        println!();
        println!(
            "  {} No personas found. Seed the built-ins with: {}",
            style("i").blue().bold(),
            style("parley persona seed").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Token").fg(Color::White),
        Cell::new("Style").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for persona in &personas {
        table.add_row(vec![
            Cell::new(name_cell(persona)).fg(Color::Cyan),
            Cell::new(token_of(persona)).fg(Color::White),
            Cell::new(persona.response_style.to_string()),
            Cell::new(truncate(&persona.description, 50)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} persona{}",
        style(personas.len()).bold(),
        if personas.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn prompt_if_missing(value: Option<String>, prompt: &str, default: Option<String>) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        input = input.default(d);
    }
    Ok(input.interact_text()?)
}

/// The owning account: the named handle, or the system account.
async fn resolve_owner(state: &AppState, handle: Option<&str>) -> Result<AccountId> {
    match handle {
        Some(handle) => {
            let account = state
                .accounts
                .get_by_handle(&handle.trim().to_lowercase())
                .await?
                .ok_or_else(|| anyhow::anyhow!("no account with handle '{handle}'"))?;
            Ok(account.id)
        }
        None => Ok(state.provisioner.ensure_system_account().await?.id),
    }
}

fn name_cell(persona: &Persona) -> String {
    if persona.is_official {
        format!("★ {}", persona.display_name)
    } else {
        persona.display_name.clone()
    }
}

/// The value a client passes as `personaToken`.
fn token_of(persona: &Persona) -> String {
    persona
        .builtin_key
        .clone()
        .unwrap_or_else(|| persona.id.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 50), "short");
        let long = "é".repeat(60);
        let cut = truncate(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn builtin_personas_use_their_key_as_token() {
        let mut persona = Persona {
            id: parley_types::persona::PersonaId::new(),
            display_name: "Miku".into(),
            description: String::new(),
            personality: String::new(),
            background: String::new(),
            response_style: ResponseStyle::Energetic,
            system_prompt_override: None,
            builtin_key: Some("miku".into()),
            owner_account_id: AccountId::new(),
            is_official: true,
            is_public: true,
            tags: vec![],
            created_at: chrono::Utc::now(),
        };
        assert_eq!(token_of(&persona), "miku");
        assert_eq!(name_cell(&persona), "★ Miku");

        persona.builtin_key = None;
        assert_eq!(token_of(&persona), persona.id.to_string());
    }
}
