//! Contexts command: list, switch, or delete contexts in the active
//! configuration. The interactive path drives the pure state machine in
//! [`crate::contexts`]; all I/O stays here at the edge.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use dialoguer::{Confirm, Select};

use crate::commit::write_atomic;
use crate::contexts::{ContextMenu, MenuAction, MenuCommand, MenuInput, MenuMode, MenuState};
use crate::document;
use crate::domain::{EntryKind, MergedConfig};
use crate::merge::merge_documents;

#[derive(Args)]
pub struct ContextsArgs {
    /// The active configuration file
    #[arg(short = 'a', long, value_name = "FILE")]
    pub active_path: PathBuf,

    /// List contexts and exit
    #[arg(long)]
    pub list: bool,

    /// Switch to this context without prompting
    #[arg(long = "use", value_name = "NAME")]
    pub use_context: Option<String>,

    /// Delete contexts interactively, or delete NAME directly
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    pub delete: Option<Option<String>>,
}

pub fn run(args: ContextsArgs) -> Result<()> {
    if !args.active_path.exists() {
        bail!("no active configuration at {}", args.active_path.display());
    }
    let doc = document::load(&args.active_path)
        .with_context(|| format!("failed to load {}", args.active_path.display()))?;
    let (merged, _) = merge_documents(Some(doc), Vec::new());

    if args.list {
        print_listing(&merged);
        return Ok(());
    }

    if let Some(name) = args.use_context {
        return apply(&args.active_path, &merged, MenuCommand::UseContext(name));
    }
    if let Some(Some(name)) = &args.delete {
        return apply(&args.active_path, &merged, MenuCommand::DeleteContext(name.clone()));
    }

    let mode = if args.delete.is_some() { MenuMode::Delete } else { MenuMode::Use };
    interactive(&args.active_path, merged, mode)
}

fn print_listing(merged: &MergedConfig) {
    let current = merged.current_context.as_deref();
    println!("{}", style("Contexts:").bold());
    for entry in merged.entries_of(EntryKind::Context) {
        let marker = if current == Some(entry.name.as_str()) { "*" } else { " " };
        println!("  {marker} {}", entry.name);
    }
}

fn interactive(active_path: &Path, merged: MergedConfig, mode: MenuMode) -> Result<()> {
    let menu = ContextMenu::from_merged(&merged, mode);
    if menu.contexts.is_empty() {
        println!("No contexts in {}", active_path.display());
        return Ok(());
    }
    print_listing(&merged);

    let mut state = MenuState::Listing;
    let mut pending = Some(MenuInput::Listed);
    let mut current = merged;

    while let Some(input) = pending.take() {
        let (next, action) = menu.step(state, input);
        state = next;
        match action {
            Some(MenuAction::PromptSelect) => {
                let choice = Select::new()
                    .with_prompt(match mode {
                        MenuMode::Use => "Switch to context",
                        MenuMode::Delete => "Delete context",
                    })
                    .items(&menu.contexts)
                    .default(0)
                    .interact_opt()?;
                pending = Some(match choice {
                    Some(index) => MenuInput::Picked(index),
                    None => MenuInput::Cancelled,
                });
            }
            Some(MenuAction::PromptConfirm(name)) => {
                let verb = match mode {
                    MenuMode::Use => "Switch to",
                    MenuMode::Delete => "Delete",
                };
                let yes = Confirm::new()
                    .with_prompt(format!("{verb} context '{name}'?"))
                    .default(mode == MenuMode::Use)
                    .interact()?;
                pending = Some(MenuInput::Confirmed(yes));
            }
            Some(MenuAction::Apply(command)) => {
                current = apply_to(current, command.clone());
                publish(active_path, &current)?;
                match &command {
                    MenuCommand::UseContext(name) => println!("Switched to '{name}'"),
                    MenuCommand::DeleteContext(name) => println!("Deleted '{name}'"),
                }
                pending = Some(MenuInput::Applied);
            }
            Some(MenuAction::Exit) | None => pending = None,
        }
    }
    Ok(())
}

fn apply(active_path: &Path, merged: &MergedConfig, command: MenuCommand) -> Result<()> {
    match &command {
        MenuCommand::UseContext(name) | MenuCommand::DeleteContext(name) => {
            if !merged.contains(EntryKind::Context, name) {
                bail!("no such context: {name}");
            }
        }
    }
    let updated = apply_to(merged.clone(), command.clone());
    publish(active_path, &updated)?;
    match command {
        MenuCommand::UseContext(name) => println!("Switched to '{name}'"),
        MenuCommand::DeleteContext(name) => println!("Deleted '{name}'"),
    }
    Ok(())
}

fn apply_to(mut merged: MergedConfig, command: MenuCommand) -> MergedConfig {
    match command {
        MenuCommand::UseContext(name) => {
            merged.current_context = Some(name);
        }
        MenuCommand::DeleteContext(name) => {
            merged.entries.remove(&(EntryKind::Context, name.clone()));
            if merged.current_context.as_deref() == Some(name.as_str()) {
                merged.current_context = None;
            }
        }
    }
    merged
}

fn publish(active_path: &Path, merged: &MergedConfig) -> Result<()> {
    let content = document::render(merged)?;
    write_atomic(active_path, &content)
        .with_context(|| format!("failed to update {}", active_path.display()))?;
    Ok(())
}
