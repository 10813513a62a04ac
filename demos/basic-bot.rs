use herald::prelude::*;
use rand::Rng;
use regex::Regex;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{Intents, Shard, ShardId};
use twilight_http::Client;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;

#[tokio::main]
async fn main() -> Result<(), DefaultError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let token = env::var("DISCORD_TOKEN")?;
    let owner = env::var("DISCORD_OWNER_ID")?.parse::<u64>()?;

    let http_client = Arc::new(Client::new(token.clone()));
    let bot_id = http_client.current_user().await?.model().await?.id;
    let application_id = http_client.current_user_application().await?.model().await?.id;

    let framework = Arc::new(
        Framework::builder(TwilightClient::new(Arc::clone(&http_client), application_id), bot_id, ())
            .prefix("!")
            .owners([Id::new(owner)])
            .group(Group::new("util").name("Utility").description("Small helpers"))
            .command(
                Command::new(ping)
                    .name("ping")
                    .description("Checks the bot is alive")
                    .group("util", "ping")
                    .throttling(2, Duration::from_secs(10)),
            )
            .command(
                Command::new(echo)
                    .name("echo")
                    .aliases(&["say"])
                    .description("Repeats the given text")
                    .group("util", "echo"),
            )
            .command(
                Command::new(roll)
                    .name("roll")
                    .description("Rolls a die, as in `roll 2d6`")
                    .default_handling(false)
                    .pattern(Regex::new(r"(?i)^roll (\d+)d(\d+)$")?),
            )
            .build()?,
    );

    let intents = Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES | Intents::MESSAGE_CONTENT;
    let mut shard = Shard::new(ShardId::ONE, token, intents);
    let mut events = framework.subscribe();

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("Framework event: {:?}", event);
        }
    });

    loop {
        let event = match shard.next_event().await {
            Ok(event) => event,
            Err(source) => {
                warn!("Error receiving event: {}", source);
                if source.is_fatal() {
                    break;
                }
                continue;
            }
        };

        if let Event::Ready(_) = event {
            info!("Connected as [{}]", bot_id);
        }

        let framework = Arc::clone(&framework);
        tokio::spawn(async move {
            framework.process(&event).await;
        });
    }

    Ok(())
}

fn ping<'a>(ctx: &'a CommandContext<'a, ()>, _: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
    Box::pin(async move {
        ctx.reply("Pong!").await?;
        Ok(())
    })
}

fn echo<'a>(ctx: &'a CommandContext<'a, ()>, args: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
    Box::pin(async move {
        let CommandArgs::Single(text) = args else {
            return Ok(());
        };

        if text.is_empty() {
            return Err(FriendlyError::new("Give me something to repeat.").into());
        }

        ctx.reply(&text).await?;
        Ok(())
    })
}

fn roll<'a>(ctx: &'a CommandContext<'a, ()>, args: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
    Box::pin(async move {
        let CommandArgs::Pattern(captures) = args else {
            return Ok(());
        };

        let mut numbers = captures.iter().flatten().map(|n| n.parse::<u64>());
        let (Some(Ok(dice)), Some(Ok(sides))) = (numbers.next(), numbers.next()) else {
            return Err(FriendlyError::new("That's not a roll I understand.").into());
        };

        if dice == 0 || sides == 0 || dice > 100 {
            return Err(FriendlyError::new("Roll between 1 and 100 dice with at least one side.").into());
        }

        let total = (0..dice).map(|_| rand::thread_rng().gen_range(1..=sides)).sum::<u64>();
        ctx.reply(&format!("You rolled {dice}d{sides} and got {total}.")).await?;
        Ok(())
    })
}
