//! Context management as a pure state machine.
//!
//! The machine owns no I/O: it maps (state, input) to (next state, action)
//! and the CLI edge performs the actions — printing the listing, prompting,
//! and rewriting the active document.

use crate::domain::{EntryKind, MergedConfig};

/// What the session is there to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuMode {
    /// Switch the preferred context.
    Use,
    /// Delete a context entry.
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    Listing,
    Selecting,
    Confirming { index: usize },
    Applying { index: usize },
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuInput {
    /// The listing was shown.
    Listed,
    /// The user picked the context at this index.
    Picked(usize),
    /// The user backed out of the selection.
    Cancelled,
    /// Answer to the confirmation prompt.
    Confirmed(bool),
    /// The command was applied.
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    UseContext(String),
    DeleteContext(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    PromptSelect,
    PromptConfirm(String),
    Apply(MenuCommand),
    Exit,
}

/// The fixed data a session runs over: context names in display order.
#[derive(Debug, Clone)]
pub struct ContextMenu {
    pub contexts: Vec<String>,
    pub mode: MenuMode,
}

impl ContextMenu {
    pub fn new(contexts: Vec<String>, mode: MenuMode) -> Self {
        Self { contexts, mode }
    }

    pub fn from_merged(merged: &MergedConfig, mode: MenuMode) -> Self {
        let contexts =
            merged.entries_of(EntryKind::Context).map(|e| e.name.clone()).collect();
        Self::new(contexts, mode)
    }

    fn command_for(&self, index: usize) -> Option<MenuCommand> {
        let name = self.contexts.get(index)?.clone();
        Some(match self.mode {
            MenuMode::Use => MenuCommand::UseContext(name),
            MenuMode::Delete => MenuCommand::DeleteContext(name),
        })
    }

    /// The decision function. Inputs that make no sense in the current
    /// state leave it unchanged with no action.
    pub fn step(&self, state: MenuState, input: MenuInput) -> (MenuState, Option<MenuAction>) {
        match (state, input) {
            (MenuState::Listing, MenuInput::Listed) => {
                if self.contexts.is_empty() {
                    (MenuState::Finished, Some(MenuAction::Exit))
                } else {
                    (MenuState::Selecting, Some(MenuAction::PromptSelect))
                }
            }
            (MenuState::Selecting, MenuInput::Picked(index)) => {
                match self.contexts.get(index) {
                    Some(name) => (
                        MenuState::Confirming { index },
                        Some(MenuAction::PromptConfirm(name.clone())),
                    ),
                    None => (MenuState::Selecting, Some(MenuAction::PromptSelect)),
                }
            }
            (MenuState::Selecting, MenuInput::Cancelled) => {
                (MenuState::Finished, Some(MenuAction::Exit))
            }
            (MenuState::Confirming { index }, MenuInput::Confirmed(true)) => {
                match self.command_for(index) {
                    Some(command) => {
                        (MenuState::Applying { index }, Some(MenuAction::Apply(command)))
                    }
                    None => (MenuState::Selecting, Some(MenuAction::PromptSelect)),
                }
            }
            (MenuState::Confirming { .. }, MenuInput::Confirmed(false)) => {
                (MenuState::Selecting, Some(MenuAction::PromptSelect))
            }
            (MenuState::Applying { .. }, MenuInput::Applied) => {
                (MenuState::Finished, Some(MenuAction::Exit))
            }
            (state, _) => (state, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(mode: MenuMode) -> ContextMenu {
        ContextMenu::new(vec!["dev".to_string(), "prod".to_string()], mode)
    }

    #[test]
    fn happy_path_use_context() {
        let menu = menu(MenuMode::Use);

        let (state, action) = menu.step(MenuState::Listing, MenuInput::Listed);
        assert_eq!(state, MenuState::Selecting);
        assert_eq!(action, Some(MenuAction::PromptSelect));

        let (state, action) = menu.step(state, MenuInput::Picked(1));
        assert_eq!(state, MenuState::Confirming { index: 1 });
        assert_eq!(action, Some(MenuAction::PromptConfirm("prod".to_string())));

        let (state, action) = menu.step(state, MenuInput::Confirmed(true));
        assert_eq!(state, MenuState::Applying { index: 1 });
        assert_eq!(
            action,
            Some(MenuAction::Apply(MenuCommand::UseContext("prod".to_string())))
        );

        let (state, action) = menu.step(state, MenuInput::Applied);
        assert_eq!(state, MenuState::Finished);
        assert_eq!(action, Some(MenuAction::Exit));
    }

    #[test]
    fn delete_mode_produces_delete_command() {
        let menu = menu(MenuMode::Delete);
        let (_, action) =
            menu.step(MenuState::Confirming { index: 0 }, MenuInput::Confirmed(true));
        assert_eq!(
            action,
            Some(MenuAction::Apply(MenuCommand::DeleteContext("dev".to_string())))
        );
    }

    #[test]
    fn declined_confirmation_returns_to_selection() {
        let menu = menu(MenuMode::Use);
        let (state, action) =
            menu.step(MenuState::Confirming { index: 0 }, MenuInput::Confirmed(false));
        assert_eq!(state, MenuState::Selecting);
        assert_eq!(action, Some(MenuAction::PromptSelect));
    }

    #[test]
    fn cancel_exits_cleanly() {
        let menu = menu(MenuMode::Use);
        let (state, action) = menu.step(MenuState::Selecting, MenuInput::Cancelled);
        assert_eq!(state, MenuState::Finished);
        assert_eq!(action, Some(MenuAction::Exit));
    }

    #[test]
    fn empty_listing_exits_immediately() {
        let menu = ContextMenu::new(Vec::new(), MenuMode::Use);
        let (state, action) = menu.step(MenuState::Listing, MenuInput::Listed);
        assert_eq!(state, MenuState::Finished);
        assert_eq!(action, Some(MenuAction::Exit));
    }

    #[test]
    fn out_of_range_pick_reprompts() {
        let menu = menu(MenuMode::Use);
        let (state, action) = menu.step(MenuState::Selecting, MenuInput::Picked(9));
        assert_eq!(state, MenuState::Selecting);
        assert_eq!(action, Some(MenuAction::PromptSelect));
    }

    #[test]
    fn nonsense_inputs_are_inert() {
        let menu = menu(MenuMode::Use);
        for state in [
            MenuState::Listing,
            MenuState::Selecting,
            MenuState::Confirming { index: 0 },
            MenuState::Applying { index: 0 },
            MenuState::Finished,
        ] {
            let (next, action) = menu.step(state.clone(), MenuInput::Applied);
            if state == (MenuState::Applying { index: 0 }) {
                continue;
            }
            assert_eq!(next, state);
            assert_eq!(action, None);
        }
    }
}
