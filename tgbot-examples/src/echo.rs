//! Echo bot: repeats every text message back to its chat.
//!
//! Config from env (BOT_TOKEN, TELEGRAM_API_URL, POLL_TIMEOUT_SECS, LOG_FILE, ...); `--token`
//! overrides BOT_TOKEN.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tgbot_api::ApiClient;
use tgbot_core::{init_tracing, Update, UpdateKind};
use tgbot_runtime::{Action, Bot, BotConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "echo-bot", about = "Echoes text messages back", version)]
struct Cli {
    /// Bot token; overrides BOT_TOKEN.
    #[arg(short, long)]
    token: Option<String>,
}

fn echo(update: Update) -> Action {
    match &update.kind {
        UpdateKind::Message(message) => match message.text() {
            Some(text) => {
                info!(
                    user_id = message.sender_id().unwrap_or(0),
                    chat_id = message.chat_id(),
                    message_content = %text,
                    "Echoing message"
                );
                Action::send_text(message.chat_id(), format!("Echo: {text}"))
            }
            None => Action::Nothing,
        },
        _ => Action::Nothing,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = BotConfig::from_env(cli.token)?;
    let log_file = config.log_file.clone().unwrap_or_else(|| "logs/echo-bot.log".to_string());
    init_tracing(Some(&log_file))?;

    let client = ApiClient::new(config.api.clone())?;
    let mut bot = Bot::builder(client).with_config(&config).build();
    info!(
        start_time = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        log_file = %log_file,
        "Echo Bot started"
    );

    bot.run_with(echo).await;
    Ok(())
}
