//! Interactive prompts for wizard mode.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, ensure};
use inquire::ui::RenderConfig;
use inquire::validator::Validation;
use inquire::{Confirm, PasswordDisplayMode, Select, Text};

use crate::secret::Password;
use crate::types::{Medium, Operation};

/// Interactive prompt handler.
pub struct Prompt {
    render_config: RenderConfig<'static>,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt {
    pub fn new() -> Self {
        Self { render_config: RenderConfig::default() }
    }

    pub fn select_operation(&self) -> Result<Operation> {
        self.select("What would you like to do?", Operation::ALL.to_vec())
    }

    pub fn select_medium(&self) -> Result<Medium> {
        self.select("Carrier type", Medium::ALL.to_vec())
    }

    /// Picks one of the discovered carriers.
    pub fn select_file(&self, files: &[PathBuf]) -> Result<PathBuf> {
        ensure!(!files.is_empty(), "no files available for selection");

        let names: Vec<String> = files.iter().map(|path| path.file_name().map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())).collect();

        let choice = Select::new("Select file", names).with_render_config(self.render_config).raw_prompt().map_err(|e| anyhow!("file selection failed: {e}"))?;

        Ok(files[choice.index].clone())
    }

    /// Message to hide. Must not be empty.
    pub fn message(&self) -> Result<String> {
        Text::new("Secret message")
            .with_render_config(self.render_config)
            .with_validator(|input: &str| if input.is_empty() { Ok(Validation::Invalid("message cannot be empty".into())) } else { Ok(Validation::Valid) })
            .prompt()
            .map_err(|e| anyhow!("message input failed: {e}"))
    }

    /// Encode password, entered twice.
    pub fn encode_password(&self) -> Result<Password> {
        self.password("Enter password", true)
    }

    /// Decode password, entered once. A wrong one costs an attempt.
    pub fn decode_password(&self) -> Result<Password> {
        self.password("Enter password", false)
    }

    pub fn confirm_overwrite(&self, path: &Path) -> Result<bool> {
        let name = path.file_name().map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        self.confirm(&format!("Output file {name} already exists. Overwrite?"))
    }

    /// Asked when the analysis flagged the message.
    pub fn confirm_sensitive(&self) -> Result<bool> {
        self.confirm("Hide this message anyway?")
    }

    pub fn confirm_retry(&self) -> Result<bool> {
        self.confirm("Try again?")
    }

    fn select<T: Display>(&self, prompt: &str, options: Vec<T>) -> Result<T> {
        Select::new(prompt, options).with_render_config(self.render_config).prompt().map_err(|e| anyhow!("selection failed: {e}"))
    }

    fn password(&self, prompt: &str, confirm: bool) -> Result<Password> {
        let mut input = inquire::Password::new(prompt)
            .with_render_config(self.render_config)
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(|input: &str| if input.trim().is_empty() { Ok(Validation::Invalid("password cannot be empty or whitespace only".into())) } else { Ok(Validation::Valid) });

        input = if confirm { input.with_custom_confirmation_message("Confirm password").with_custom_confirmation_error_message("passwords do not match") } else { input.without_confirmation() };

        input.prompt().map(Password::from_string).map_err(|e| anyhow!("password input failed: {e}"))
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::new(prompt).with_render_config(self.render_config).with_default(false).prompt().map_err(|e| anyhow!("confirmation failed: {e}"))
    }
}
