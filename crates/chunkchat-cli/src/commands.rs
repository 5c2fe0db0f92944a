//! Slash commands available in the chat REPL.

/// A parsed REPL slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Reset,
    History,
    Stats,
    Model,
    Quit,
    Unknown(String),
}

/// Parse `input` as a slash command. Returns `None` for ordinary messages.
pub fn parse(input: &str) -> Option<SlashCommand> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }

    let cmd = input.split_whitespace().next().unwrap_or(input);
    let command = match cmd {
        "/help" | "/?" => SlashCommand::Help,
        "/reset" | "/clear" => SlashCommand::Reset,
        "/history" => SlashCommand::History,
        "/stats" | "/cost" => SlashCommand::Stats,
        "/model" => SlashCommand::Model,
        "/quit" | "/exit" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    };
    Some(command)
}

pub fn help_text() -> &'static str {
    "Available commands:\n\
     \x20 /help     Show this help\n\
     \x20 /reset    Clear the conversation, including the system prompt\n\
     \x20 /history  Show the conversation so far\n\
     \x20 /stats    Show session statistics and token usage\n\
     \x20 /model    Show the current model\n\
     \x20 /quit     Exit"
}
