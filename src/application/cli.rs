use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ConversationSummary;
use crate::domain::models::VoiceName;
use crate::domain::services::actions::help_text;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn format_conversation(conversation: &ConversationSummary) -> String {
    return format!(
        "- {} ({} messages) {}",
        conversation.date,
        conversation.message_count,
        conversation.preview_line()
    );
}

async fn print_history_list() -> Result<()> {
    let user_id = Config::get(ConfigKey::UserID);
    let conversations = BackendManager::get()?
        .conversations(&user_id)
        .await?
        .iter()
        .map(|conversation| {
            return format_conversation(conversation);
        })
        .collect::<Vec<String>>();

    if conversations.is_empty() {
        println!("There are no stored conversations yet. You should start your first one!");
    } else {
        println!("{}", conversations.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn require_user_id() -> Result<()> {
    if Config::get(ConfigKey::UserID).is_empty() {
        bail!("No user ID is configured. Pass --user-id, set LEDGERCHAT_USER_ID, or add user-id to your config file.");
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("ledgerchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(Command::new("history").about("List stored conversation summaries grouped by date."))
        .subcommand(Command::new("clear-history").about("Delete the stored conversation history for the configured user."))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("LEDGERCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiBaseURL.to_string())
                .long(ConfigKey::ApiBaseURL.to_string())
                .env("LEDGERCHAT_API_BASE_URL")
                .num_args(1)
                .help(format!("Base URL of the finance API server. [default: {}]", Config::default(ConfigKey::ApiBaseURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AuthToken.to_string())
                .long(ConfigKey::AuthToken.to_string())
                .env("LEDGERCHAT_AUTH_TOKEN")
                .num_args(1)
                .help("Bearer token used to authenticate API requests. Requests are sent unauthenticated when unset.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::UserID.to_string())
                .short('u')
                .long(ConfigKey::UserID.to_string())
                .env("LEDGERCHAT_USER_ID")
                .num_args(1)
                .help("User ID that scopes conversation history and transaction data on the server.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .long(ConfigKey::Username.to_string())
                .env("LEDGERCHAT_USERNAME")
                .num_args(1)
                .help("Display name used for your own messages. Defaults to $USER.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::MonitorInterval.to_string())
                .long(ConfigKey::MonitorInterval.to_string())
                .env("LEDGERCHAT_MONITOR_INTERVAL")
                .num_args(1)
                .help(format!("Seconds between proactive financial health checks. [default: {}]", Config::default(ConfigKey::MonitorInterval)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StreamIdleTimeout.to_string())
                .long(ConfigKey::StreamIdleTimeout.to_string())
                .env("LEDGERCHAT_STREAM_IDLE_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the next chunk of a streamed reply before giving up. [default: {}]", Config::default(ConfigKey::StreamIdleTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SttCommand.to_string())
                .long(ConfigKey::SttCommand.to_string())
                .env("LEDGERCHAT_STT_COMMAND")
                .num_args(1)
                .help("Shell command that captures one spoken prompt and prints the transcript to stdout.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::TtsCommand.to_string())
                .long(ConfigKey::TtsCommand.to_string())
                .env("LEDGERCHAT_TTS_COMMAND")
                .num_args(1)
                .help("Shell command that reads text from stdin and speaks it aloud.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Voice.to_string())
                .long(ConfigKey::Voice.to_string())
                .env("LEDGERCHAT_VOICE")
                .num_args(1)
                .help(format!("Preferred system voice, passed to the speech commands through the environment. [default: {}]", Config::default(ConfigKey::Voice)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::VoiceBackend.to_string())
                .long(ConfigKey::VoiceBackend.to_string())
                .env("LEDGERCHAT_VOICE_BACKEND")
                .num_args(1)
                .help(format!("The speech integration to use for /voice and /speak. [default: {}]", Config::default(ConfigKey::VoiceBackend)))
                .value_parser(PossibleValuesParser::new(VoiceName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::VoiceOutput.to_string())
                .long(ConfigKey::VoiceOutput.to_string())
                .env("LEDGERCHAT_VOICE_OUTPUT")
                .num_args(1)
                .help(format!("Whether assistant replies are read aloud. [default: {}]", Config::default(ConfigKey::VoiceOutput)))
                .value_parser(PossibleValuesParser::new(["true", "false"]))
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("history", _)) => {
            Config::load(build(), vec![&matches]).await?;
            require_user_id()?;
            print_history_list().await?;
            return Ok(false);
        }
        Some(("clear-history", _)) => {
            Config::load(build(), vec![&matches]).await?;
            require_user_id()?;
            let user_id = Config::get(ConfigKey::UserID);
            BackendManager::get()?.clear_history(&user_id).await?;
            println!("Cleared conversation history for {user_id}");
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
            require_user_id()?;
        }
    }

    return Ok(true);
}
