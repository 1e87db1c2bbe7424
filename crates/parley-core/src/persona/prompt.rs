//! System prompt composition for a persona turn.

use parley_types::persona::Persona;

use super::catalog::PersonaCatalog;

/// Compose the system prompt for `persona`.
///
/// Precedence: the persona's own override text, then the catalog template
/// for its built-in key, then a prompt rendered from the authored profile.
pub fn compose_system_prompt(persona: &Persona, catalog: &PersonaCatalog) -> String {
    if let Some(text) = persona
        .system_prompt_override
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return text.to_string();
    }

    if let Some(template) = persona
        .builtin_key
        .as_deref()
        .and_then(|key| catalog.template_for(key))
    {
        return template.to_string();
    }

    profile_prompt(persona)
}

/// Render the generic template from an authored profile.
pub fn profile_prompt(persona: &Persona) -> String {
    let name = &persona.display_name;
    let mut prompt = format!(
        "You are {name}. {}\n\nPersonality: {}\n\n{}",
        persona.description,
        persona.personality,
        persona.response_style.instruction()
    );

    if !persona.background.trim().is_empty() {
        prompt.push_str("\n\nBackground: ");
        prompt.push_str(&persona.background);
    }

    prompt.push_str(&format!(
        "\n\nStay in character and respond as {name} would. \
         Be consistent with your personality and background."
    ));
    prompt
}
