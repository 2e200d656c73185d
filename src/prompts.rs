pub const GAME_BASE: &str = include_str!("../data/prompts/game_base.txt");
pub const ILLUSTRATION: &str = include_str!("../data/prompts/illustration.txt");

/// Longest slice of a generated plan that is forwarded to the image model.
pub const ILLUSTRATION_SOURCE_LIMIT: usize = 800;

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Append the caller's instruction to the base template when one was given.
pub fn build_prompt(base: &str, instruction: Option<&str>) -> String {
    match instruction {
        Some(instruction) if !instruction.is_empty() => {
            format!("{}\nPlease also incorporate: {}", base, instruction)
        }
        _ => base.to_string(),
    }
}

/// Build the image prompt from the first [`ILLUSTRATION_SOURCE_LIMIT`] characters of a plan.
pub fn illustration_prompt(plan: &str) -> String {
    let excerpt: String = plan.chars().take(ILLUSTRATION_SOURCE_LIMIT).collect();
    render(ILLUSTRATION, &[("plan", &excerpt)])
}
