use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Arg;
use clap::Command;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;

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

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
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

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("MUESLI_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting a model to connect to. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("MUESLI_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        );
}

fn arg_backend_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendTimeout.to_string())
        .long(ConfigKey::BackendTimeout.to_string())
        .env("MUESLI_BACKEND_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before giving up on an in-flight generation request. [default: {}]", Config::default(ConfigKey::BackendTimeout)),
        );
}

fn arg_config_file() -> Arg {
    return Arg::new(ConfigKey::ConfigFile.to_string())
        .short('c')
        .long(ConfigKey::ConfigFile.to_string())
        .env("MUESLI_CONFIG_FILE")
        .num_args(1)
        .help(format!(
            "Path to configuration file. [default: {}]",
            Config::default(ConfigKey::ConfigFile)
        ));
}

fn arg_gemini_token() -> Arg {
    return Arg::new(ConfigKey::GeminiToken.to_string())
        .long(ConfigKey::GeminiToken.to_string())
        .env("GEMINI_API_KEY")
        .num_args(1)
        .help("The API key used to authenticate against the Gemini API.");
}

fn arg_gemini_url() -> Arg {
    return Arg::new(ConfigKey::GeminiURL.to_string())
        .long(ConfigKey::GeminiURL.to_string())
        .env("MUESLI_GEMINI_URL")
        .num_args(1)
        .help(format!(
            "The base URL of the Gemini API. [default: {}]",
            Config::default(ConfigKey::GeminiURL)
        ));
}

fn arg_host() -> Arg {
    return Arg::new(ConfigKey::Host.to_string())
        .long(ConfigKey::Host.to_string())
        .env("MUESLI_HOST")
        .num_args(1)
        .help(format!(
            "The address the websocket listener binds to. [default: {}]",
            Config::default(ConfigKey::Host)
        ));
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("MUESLI_MODEL")
        .num_args(1)
        .help(format!(
            "The model on the backend to consume. [default: {}]",
            Config::default(ConfigKey::Model)
        ));
}

fn arg_port() -> Arg {
    return Arg::new(ConfigKey::Port.to_string())
        .short('p')
        .long(ConfigKey::Port.to_string())
        .env("MUESLI_PORT")
        .num_args(1)
        .help(format!(
            "The port the websocket listener binds to. [default: {}]",
            Config::default(ConfigKey::Port)
        ));
}

fn arg_system_prompt() -> Arg {
    return Arg::new(ConfigKey::SystemPrompt.to_string())
        .long(ConfigKey::SystemPrompt.to_string())
        .env("MUESLI_SYSTEM_PROMPT")
        .num_args(1)
        .help("System prompt text sent to the backend with every generation request.");
}

pub fn build() -> Command {
    return Command::new("muesli")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_backend_timeout())
        .arg(arg_config_file())
        .arg(arg_gemini_token())
        .arg(arg_gemini_url())
        .arg(arg_host())
        .arg(arg_model())
        .arg(arg_port())
        .arg(arg_system_prompt())
        .subcommand(subcommand_config());
}

/// Returns true when the process should continue in to serving, false when a
/// subcommand handled the invocation entirely.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    if let Some(("config", subcmd_matches)) = matches.subcommand() {
        match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                bail!("Unknown config subcommand. Run 'muesli config --help' for options.");
            }
        }

        return Ok(false);
    }

    Config::load(build(), vec![&matches]).await?;

    if Config::get(ConfigKey::GeminiToken).is_empty() {
        tracing::warn!("no Gemini API key configured, generation requests will fail");
    }

    return Ok(true);
}
