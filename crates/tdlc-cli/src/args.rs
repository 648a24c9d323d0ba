use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "tdlc",
    version,
    about = "10DLC compliance checks for SMS marketing copy"
)]
pub struct Args {
    /// Message text to check
    #[arg(conflicts_with = "message_file", required_unless_present_any = ["message_file", "dump_rules"])]
    pub message: Option<String>,

    /// Read the message from a file instead ("-" for stdin)
    #[arg(long)]
    pub message_file: Option<PathBuf>,

    /// JSON rules document to use instead of the bundled rules
    #[arg(long, env = "TDLC_RULES")]
    pub rules: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Caller mode, echoed in the response and used to tailor tips
    #[arg(long)]
    pub mode: Option<String>,

    /// Delivery channel
    #[arg(long, default_value = "sms")]
    pub channel: ChannelArg,

    /// Persist the check counter in this JSON file
    #[arg(long, env = "TDLC_COUNTER_FILE")]
    pub counter_file: Option<PathBuf>,

    /// Print the active rules document and exit
    #[arg(long)]
    pub dump_rules: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChannelArg {
    Sms,
    Mms,
}
