//! Command lookup built from the static command list.

use super::CommandHandler;
use crate::error::LoadError;
use discord_client::{CommandDeclaration, CommandOption};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_NAME_LEN: usize = 32;
const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_OPTIONS: usize = 25;

/// A named group of commands.
pub struct CommandCategory {
    name: &'static str,
    commands: Vec<Arc<dyn CommandHandler>>,
}

impl CommandCategory {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.commands.push(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

/// A validated command and its handler.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub declaration: CommandDeclaration,
    pub handler: Arc<dyn CommandHandler>,
}

/// Command name to handler map. Read-only once loaded.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    /// Build the registry category by category, in order.
    ///
    /// Declarations Discord would reject are logged and skipped. A name seen
    /// twice keeps the later handler.
    pub fn load(categories: Vec<CommandCategory>) -> Self {
        let mut commands = HashMap::new();

        for category in categories {
            debug!("Loading command category {}", category.name);

            for handler in category.commands {
                let declaration = handler.declaration();

                if let Err(e) = validate_declaration(&declaration) {
                    warn!("Skipping command in category {}: {}", category.name, e);
                    continue;
                }

                let name = declaration.name.clone();
                if commands
                    .insert(name.clone(), RegisteredCommand { declaration, handler })
                    .is_some()
                {
                    debug!("Command {} redefined, keeping the later definition", name);
                }
            }
        }

        info!("Loaded {} commands", commands.len());
        Self { commands }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(name)
    }

    /// All declarations, ordered by name.
    pub fn declarations(&self) -> Vec<CommandDeclaration> {
        let mut declarations: Vec<_> = self
            .commands
            .values()
            .map(|c| c.declaration.clone())
            .collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        declarations
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Check a declaration against Discord's shape rules.
pub fn validate_declaration(declaration: &CommandDeclaration) -> Result<(), LoadError> {
    let name = &declaration.name;

    if let Some(reason) = name_problem(name) {
        return Err(LoadError::InvalidName {
            name: name.clone(),
            reason,
        });
    }

    if !description_ok(&declaration.description) {
        return Err(LoadError::InvalidDescription { name: name.clone() });
    }

    if declaration.options.len() > MAX_OPTIONS {
        return Err(LoadError::TooManyOptions { name: name.clone() });
    }

    let mut seen: Vec<&str> = Vec::with_capacity(declaration.options.len());
    let mut optional_seen = false;
    for option in &declaration.options {
        let problem = option_problem(option)
            .or_else(|| seen.contains(&option.name.as_str()).then_some("is declared twice"))
            .or_else(|| {
                (option.required && optional_seen)
                    .then_some("is required but follows an optional option")
            });

        if let Some(reason) = problem {
            return Err(LoadError::InvalidOption {
                name: name.clone(),
                option: option.name.clone(),
                reason,
            });
        }

        optional_seen |= !option.required;
        seen.push(&option.name);
    }

    Ok(())
}

fn name_problem(name: &str) -> Option<&'static str> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        Some("must be 1-32 characters")
    } else if name.chars().any(char::is_uppercase) {
        Some("must be lowercase")
    } else if !name
        .chars()
        .all(|c| c == '-' || c == '_' || c.is_alphanumeric())
    {
        Some("may only contain letters, digits, '-' and '_'")
    } else {
        None
    }
}

fn description_ok(description: &str) -> bool {
    let len = description.chars().count();
    (1..=MAX_DESCRIPTION_LEN).contains(&len)
}

fn option_problem(option: &CommandOption) -> Option<&'static str> {
    if name_problem(&option.name).is_some() {
        Some("has an invalid name")
    } else if !description_ok(&option.description) {
        Some("needs a 1-100 character description")
    } else {
        None
    }
}
