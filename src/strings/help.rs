//! # Help Text
//!
//! Command names and the help message listing them.
//! Displayed to the user via the `help` command.

/// Every command the bot understands, in the order they are listed to users.
pub const COMMANDS: &[(&str, &str)] = &[
    ("help", "Show this message"),
    ("status", "Show this channel's topics, frequency, limit and language"),
    ("news", "Deliver news to this channel on the next sweep"),
];

pub fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|(name, _)| *name).collect()
}

pub fn main_help() -> String {
    let mut help = String::from(concat!(
        "*📰 Newsbot Help*\n",
        "Mention me or send me a direct message.\n",
        "\n",
    ));
    for (name, description) in COMMANDS {
        help.push_str(&format!("• `{name}`: {description}\n"));
    }
    help.push_str(concat!(
        "\n",
        "*⚙️ Channel purpose directives*\n",
        "• `topic: <text>` (repeatable)\n",
        "• `frequency: <minutes>`\n",
        "• `limit: <articles>`\n",
        "• `language: <two letter code>`\n",
    ));
    help
}
