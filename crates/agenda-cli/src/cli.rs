use agenda_core::View;
use clap::{Parser, Subcommand};

/// Personal agenda with desktop reminders.
#[derive(Debug, Parser)]
#[command(name = "agenda", version, about)]
pub struct Cli {
    /// Config file (defaults to $AGENDA_CONFIG, then ~/.agenda/agenda.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Schedule a new item.
    #[command(after_help = "Examples:\n  agenda add today 11:15:00 \"finish the project\"\n  \
                            agenda add tomorrow 14:30 \"meeting with team\"\n  \
                            agenda add 15/07/2025 09:00 \"doctor appointment\"")]
    Add {
        /// today, tomorrow, or DD/MM/YYYY
        date: String,
        /// HH:MM or HH:MM:SS
        time: String,
        description: String,
    },

    /// List items for a period.
    Get {
        #[arg(default_value_t = View::Today)]
        period: View,
        /// Print the items as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Poll for due items and show reminders until Ctrl-C.
    Serve,

    /// Show a single alert immediately and exit once it is gone.
    Alert {
        title: String,
        message: String,
        /// Time label shown on the alert.
        time: String,
    },

    /// Print the current eligibility window and what falls in it.
    Window,
}
