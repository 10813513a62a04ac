use async_trait::async_trait;
use herald::prelude::*;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{Intents, Shard, ShardId};
use twilight_http::Client;

#[derive(Default)]
struct Stats {
    orders: AtomicU64,
}

/// Accepts colors written as `#rrggbb`.
struct ColorType;

#[async_trait]
impl ArgumentType<Stats> for ColorType {
    fn id(&self) -> &str {
        "color"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, Stats>, _: &Argument<Stats>) -> Validation {
        match value.strip_prefix('#') {
            Some(hex) if hex.len() == 6 && u32::from_str_radix(hex, 16).is_ok() => Validation::Valid,
            _ => Validation::Rejected("Colors look like `#ff8800`.".to_string()),
        }
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, Stats>, _: &Argument<Stats>) -> ArgumentValue {
        ArgumentValue::String(value.to_lowercase())
    }
}

fn not_the_bot<'a>(
    value: &'a str,
    ctx: &'a CommandContext<'a, Stats>,
    _: &'a Argument<Stats>,
) -> BoxFuture<'a, Validation> {
    Box::pin(async move { (!value.contains(&ctx.bot_id.to_string())).into() })
}

#[tokio::main]
async fn main() -> Result<(), DefaultError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let token = env::var("DISCORD_TOKEN")?;

    let http_client = Arc::new(Client::new(token.clone()));
    let bot_id = http_client.current_user().await?.model().await?.id;
    let application_id = http_client.current_user_application().await?.model().await?.id;

    let framework = Arc::new(
        Framework::builder(
            TwilightClient::new(Arc::clone(&http_client), application_id),
            bot_id,
            Stats::default(),
        )
        .prefix("?")
        .settings(MemorySettings::new())
        .argument_type(ColorType)
        .command(
            Command::new(order)
                .name("order")
                .description("Orders some pizza for a friend")
                .guild_only()
                .add_argument(
                    ArgumentInfo::new("friend", "Who is the pizza for?")
                        .kind("user")
                        .validator(not_the_bot)
                        .error("I don't eat pizza."),
                )
                .add_argument(
                    ArgumentInfo::new("amount", "How many pizzas?")
                        .kind("integer")
                        .min(1.0)
                        .max(10.0),
                )
                .add_argument(
                    ArgumentInfo::new("size", "Which size?")
                        .kind("string")
                        .one_of(["small", "medium", "large"])
                        .default("medium"),
                )
                .add_argument(
                    ArgumentInfo::new("toppings", "What toppings? Send one per message.")
                        .kind("string")
                        .infinite(true)
                        .wait(60),
                ),
        )
        .command(
            Command::new(paint)
                .name("paint")
                .description("Shows a color")
                .add_argument(ArgumentInfo::new("color", "Which color?").kind("color")),
        )
        .build()?,
    );

    let intents = Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES | Intents::MESSAGE_CONTENT;
    let mut shard = Shard::new(ShardId::ONE, token, intents);

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

        let framework = Arc::clone(&framework);
        tokio::spawn(async move {
            if let ProcessResult::Cancelled(reason) = framework.process(&event).await {
                info!("Command cancelled: {:?}", reason);
            }
        });
    }

    Ok(())
}

fn order<'a>(ctx: &'a CommandContext<'a, Stats>, args: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
    Box::pin(async move {
        let Some(values) = args.values() else {
            return Ok(());
        };

        let friend = values.get::<UserInfo>("friend").map(|user| user.name).unwrap_or_default();
        let amount = values.get::<i64>("amount").unwrap_or(1);
        let size = values.get::<String>("size").unwrap_or_default();
        let toppings = values.get::<Vec<String>>("toppings").unwrap_or_default();

        let total = ctx.data.orders.fetch_add(1, Ordering::Relaxed) + 1;
        ctx.reply(&format!(
            "Ordered {amount} {size} pizza(s) with {} for {friend}. That's order number {total}.",
            toppings.join(", ")
        ))
        .await?;

        Ok(())
    })
}

fn paint<'a>(ctx: &'a CommandContext<'a, Stats>, args: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
    Box::pin(async move {
        let color = args
            .values()
            .and_then(|values| values.get::<String>("color"))
            .unwrap_or_default();

        ctx.reply(&format!("Here's your color: `{color}`")).await?;
        Ok(())
    })
}
