use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use purelink::tools;
use purelink::update::{update_client, DEFAULT_UPDATE_URL};
use purelink::{BlocklistStore, Cleaner, CleaningOptions, Config};
use std::env;
use std::io::Read;

/// Clean links and paths the way the clipboard watcher does.
#[derive(Debug, Parser)]
#[command(name = "purelink")]
#[command(about = "Strip tracking from links and fix up Windows paths", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Clean TEXT, or stdin when TEXT is omitted, and print the result.
    Clean {
        text: Option<String>,

        /// Resolve short links, whatever the config says.
        #[arg(long)]
        unshorten: bool,

        /// Map drive paths to /mnt/<drive>, whatever the config says.
        #[arg(long)]
        wsl: bool,

        /// Leave Dropbox and Google Drive links alone.
        #[arg(long)]
        no_direct_link: bool,
    },

    /// Download the latest tracking rules and save them.
    Update {
        #[arg(long, default_value = DEFAULT_UPDATE_URL)]
        url: String,
    },

    /// Show the cleaned counter and the recent history.
    History,

    /// Print a new random UUID.
    Uuid,

    /// Base64 encode TEXT, or stdin when TEXT is omitted.
    Base64 {
        text: Option<String>,

        /// Decode instead of encode.
        #[arg(short, long)]
        decode: bool,
    },

    /// Build a WhatsApp link from a phone number including its country code.
    Whatsapp { number: Option<String> },

    /// Build a Telegram link from a username.
    Telegram { username: Option<String> },
}

/// `text` itself, or stdin without its trailing line break.
fn read_text(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("read text from stdin")?;
    buffer.truncate(buffer.trim_end_matches(['\r', '\n']).len());
    Ok(buffer)
}

/// Flags can only switch features on, except direct links which they can
/// only switch off.
fn merge_options(
    cfg: &Config,
    unshorten: bool,
    wsl: bool,
    no_direct_link: bool,
) -> CleaningOptions {
    let base = cfg.options();
    CleaningOptions {
        unshorten: base.unshorten || unshorten,
        posix_path_mode: base.posix_path_mode || wsl,
        cloud_boost: base.cloud_boost && !no_direct_link,
    }
}

pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config_path = env::var("PURELINK_CONFIG").unwrap_or(String::from("./purelink.toml"));
    let rules_path = env::var("PURELINK_RULES").unwrap_or(String::from("./rules.json"));
    let mut cfg = Config::load(&config_path);

    match cli.command {
        CliCommand::Clean {
            text,
            unshorten,
            wsl,
            no_direct_link,
        } => {
            let text = read_text(text)?;

            let cleaner = Cleaner::from_file(&rules_path)?;
            info!("Loaded URL rules: {}", cleaner.amount());

            let options = merge_options(&cfg, unshorten, wsl, no_direct_link);
            let cleaned = cleaner.clean(&text, options).await;
            if cleaned != text {
                cfg.record(&cleaned);
                if let Err(e) = cfg.save(&config_path) {
                    warn!("fail to save config {}: {}", config_path, e);
                }
                if cfg.sound {
                    eprint!("\x07");
                }
            }
            println!("{cleaned}");
        }
        CliCommand::Update { url } => {
            let store = BlocklistStore::default();
            if let Err(e) = store.load_or_init(&rules_path) {
                warn!("{}", e);
            }

            let client = update_client().context("build HTTP client")?;
            match store.update_from_remote(&client, &url).await {
                Ok(amount) => {
                    store
                        .snapshot()
                        .save(&rules_path)
                        .context("failed to save rules")?;
                    println!("Filters updated successfully! {amount} rules active.");
                }
                Err(e) => bail!("Update failed: {e}"),
            }
        }
        CliCommand::History => {
            println!("Cleaned: {} items", cfg.total_cleaned);
            for item in &cfg.history {
                println!("  {item}");
            }
        }
        CliCommand::Uuid => println!("{}", tools::generate_uuid()),
        CliCommand::Base64 { text, decode } => {
            let text = read_text(text)?;
            if decode {
                println!("{}", tools::decode_base64(&text)?);
            } else {
                println!("{}", tools::encode_base64(&text));
            }
        }
        CliCommand::Whatsapp { number } => {
            println!("{}", tools::whatsapp_link(&read_text(number)?)?);
        }
        CliCommand::Telegram { username } => {
            println!("{}", tools::telegram_link(&read_text(username)?)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from(["purelink", "clean", "https://a.com", "--wsl"]).unwrap();
        match cli.command {
            CliCommand::Clean {
                text,
                unshorten,
                wsl,
                no_direct_link,
            } => {
                assert_eq!(text.as_deref(), Some("https://a.com"));
                assert!(!unshorten);
                assert!(wsl);
                assert!(!no_direct_link);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_default_url() {
        let cli = Cli::try_parse_from(["purelink", "update"]).unwrap();
        match cli.command {
            CliCommand::Update { url } => assert_eq!(url, DEFAULT_UPDATE_URL),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_tools() {
        let cli = Cli::try_parse_from(["purelink", "base64", "-d", "cHVyZWxpbms="]).unwrap();
        match cli.command {
            CliCommand::Base64 { text, decode } => {
                assert_eq!(text.as_deref(), Some("cHVyZWxpbms="));
                assert!(decode);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["purelink", "telegram", "@durov"]).unwrap();
        assert!(matches!(
            cli.command,
            CliCommand::Telegram { username: Some(name) } if name == "@durov"
        ));
        assert!(matches!(
            Cli::try_parse_from(["purelink", "uuid"]).unwrap().command,
            CliCommand::Uuid
        ));
    }

    #[test]
    fn test_read_text_prefers_argument() {
        assert_eq!(read_text(Some("abc".to_string())).unwrap(), "abc");
    }

    #[test]
    fn test_merge_options() {
        let cfg = Config::default();
        assert_eq!(merge_options(&cfg, false, false, false), cfg.options());

        let opts = merge_options(&cfg, true, true, true);
        assert!(opts.unshorten);
        assert!(opts.posix_path_mode);
        assert!(!opts.cloud_boost);

        let cfg = Config {
            unshorten: true,
            ..Config::default()
        };
        assert!(merge_options(&cfg, false, false, false).unshorten);
    }
}
