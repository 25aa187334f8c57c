use dialoguer::{theme::ColorfulTheme, FuzzySelect};
use tracing::info;

use crate::{
    discovery::{resource_choices, Discover},
    error::Error,
};

/// Single-choice prompt over the discovered resources.
pub trait Prompt {
    /// Returns the chosen index, or `None` if the user backed out.
    fn choose(&self, message: &str, choices: &[String]) -> Result<Option<usize>, Error>;
}

/// Interactive terminal prompt, filtered as the user types.
pub struct Terminal;

impl Prompt for Terminal {
    fn choose(&self, message: &str, choices: &[String]) -> Result<Option<usize>, Error> {
        Ok(FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact_opt()?)
    }
}

/// Picks the resource to watch. A preset identifier wins and nothing else is consulted.
pub async fn select_resource(
    preset: Option<&str>,
    discover: &impl Discover,
    prompt: &impl Prompt,
) -> Result<String, Error> {
    if let Some(target) = preset {
        return Ok(target.to_string());
    }

    let choices = resource_choices(&discover.resource_lists().await?);
    if choices.is_empty() {
        return Err(Error::NoResources);
    }
    info!("discovered {} resources", choices.len());

    let index = prompt
        .choose("Choose a resource:", &choices)?
        .ok_or(Error::NoSelection)?;

    choices.get(index).cloned().ok_or(Error::NoSelection)
}
