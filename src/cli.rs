use clap::{Parser, Subcommand};
use sensor_console::console::Action;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sensor-console", version)]
#[command(about = "Terminal control client for an ESP32 sensor station", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show live readings and accept commands on stdin (default)
    Monitor,
    /// Show the device page once
    Info,
    /// Upload a firmware image and wait for the reboot
    Update {
        /// Firmware image (.bin)
        files: Vec<PathBuf>,
    },
    /// Join a WiFi network as a station
    Connect {
        #[arg(long, default_value = "")]
        ssid: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Leave the current WiFi network
    Disconnect,
}

impl Commands {
    /// Actions a one-shot command feeds to the console
    pub fn actions(self) -> Vec<Action> {
        match self {
            Commands::Monitor | Commands::Info => vec![],
            Commands::Update { files } => vec![Action::UpdateFirmware { files }],
            Commands::Connect { ssid, password } => vec![Action::ConnectWifi { ssid, password }],
            Commands::Disconnect => vec![Action::DisconnectWifi],
        }
    }
}

/// A line typed at the monitor prompt
#[derive(Parser, Debug)]
#[command(name = "prompt", no_binary_name = true, disable_version_flag = true)]
struct Prompt {
    #[command(subcommand)]
    command: PromptCommand,
}

#[derive(Subcommand, Debug)]
enum PromptCommand {
    /// connect <ssid> <password>
    Connect {
        #[arg(default_value = "")]
        ssid: String,
        #[arg(default_value = "")]
        password: String,
    },
    /// Leave the current WiFi network
    Disconnect,
    /// update <file.bin>
    Update { files: Vec<PathBuf> },
    /// Ask the device for its firmware update status
    Status,
    /// Re-read the access point and connection details
    Info,
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

impl From<PromptCommand> for Action {
    fn from(command: PromptCommand) -> Self {
        match command {
            PromptCommand::Connect { ssid, password } => Action::ConnectWifi { ssid, password },
            PromptCommand::Disconnect => Action::DisconnectWifi,
            PromptCommand::Update { files } => Action::UpdateFirmware { files },
            PromptCommand::Status => Action::CheckFirmwareStatus,
            PromptCommand::Info => Action::RefreshInfo,
            PromptCommand::Quit => Action::Quit,
        }
    }
}

/// Parse one prompt line; blank lines yield `None`
pub fn parse_prompt_line(line: &str) -> Option<Result<Action, clap::Error>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    Some(Prompt::try_parse_from(words).map(|prompt| prompt.command.into()))
}
