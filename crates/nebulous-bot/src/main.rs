mod config;

use anyhow::Result;
use config::BotConfig;
use nebulous_client::{AccountClient, Client, ClientCallbacks, Ticket};
use nebulous_protocol::{ClanChatMessage, GameChatMessage, GameData, GameEvent};
use std::path::Path;
use tracing::info;

/// Logs what the session sees; a headless observer.
struct LogCallbacks;

impl ClientCallbacks for LogCallbacks {
    fn on_game_data(&mut self, packet: &mut GameData) -> Result<()> {
        info!(
            players = packet.players.len(),
            dots = packet.dots.len(),
            ejects = packet.ejects.len(),
            items = packet.items.len(),
            map_size = packet.map_size,
            "World snapshot"
        );
        Ok(())
    }

    fn on_game_event(&mut self, event: &mut GameEvent) -> Result<()> {
        info!(event = ?event, "Game event");
        Ok(())
    }

    fn on_game_chat_message(&mut self, message: &mut GameChatMessage) -> Result<()> {
        info!("[lobby] {}: {}", message.alias, message.message);
        Ok(())
    }

    fn on_clan_chat_message(&mut self, message: &mut ClanChatMessage) -> Result<()> {
        info!("[clan] {}: {}", message.alias, message.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting nebulous bot...");

    let bot_config = BotConfig::load(Path::new("config/bot.toml"))?;
    let ticket = Ticket::parse(&bot_config.ticket)?;
    info!(
        region = bot_config.region.as_str(),
        anonymous = ticket.is_anonymous(),
        "Requesting secure ticket"
    );

    let mut account = AccountClient::new(ticket.clone(), bot_config.client.game_version);
    if let Some(api_url) = &bot_config.account_api_url {
        account = account.with_api_url(api_url.clone());
    }
    let credentials = account.secure_ticket(bot_config.region).await?;
    info!(server_ip = %credentials.server_ip, "Region server resolved");

    let mut client = Client::new(
        bot_config.client,
        credentials,
        ticket,
        Box::new(LogCallbacks),
    );
    client.connect().await?;

    tokio::select! {
        result = client.wait() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            client.stop().await?;
        }
    }

    Ok(())
}
