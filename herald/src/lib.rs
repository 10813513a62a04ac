#![doc = "A prompting message and slash command framework meant to be used with twilight."]

mod parse_impl;

pub mod argument;
pub mod builder;
pub mod client;
pub mod collector;
pub mod command;
pub mod context;
pub mod error;
pub mod framework;
pub mod group;
pub mod hook;
pub mod iter;
pub mod message;
pub mod parsers;
pub mod registry;
pub mod settings;
pub mod throttle;
pub mod types;
pub mod value;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Useful exports to get started quickly
pub mod prelude {
    pub use crate::{
        argument::{Argument, ArgumentDefault, ArgumentInfo, ArgumentResult, CancelReason, RawInput},
        builder::{FrameworkBuilder, WrappedClient},
        client::{ChannelInfo, ChatClient, TwilightClient, UserInfo},
        collector::{ArgumentCollector, CollectorResult},
        command::{ArgsKind, Command, CommandArgs, ExecutionState, Throttling},
        context::{CommandContext, Trigger},
        error::{ClientError, CommandFailure, FriendlyError},
        framework::{
            BlockReason, CommandErrorKind, DefaultCommandResult, DefaultError, Framework, FrameworkEvent,
            ProcessResult,
        },
        group::Group,
        hook::{Inhibition, InhibitorHook},
        message::{Incoming, IncomingInteraction, IncomingMessage},
        registry::{Registry, TypeRegistry},
        settings::{GuildSettings, MemorySettings},
        throttle::Throttles,
        types::{ArgumentType, Validation},
        value::{ArgumentValue, ArgumentValues},
        BoxFuture,
    };
    pub use async_trait::async_trait;
}

pub mod twilight_exports {
    pub use twilight_http::Client;
    pub use twilight_model::{
        application::interaction::{
            application_command::{CommandData, CommandDataOption, CommandOptionValue},
            Interaction, InteractionData, InteractionType,
        },
        channel::{Channel, ChannelType, Message},
        gateway::{
            event::Event,
            payload::incoming::{InteractionCreate, MessageCreate, MessageUpdate},
        },
        guild::Permissions,
        http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
        id::{
            marker::{
                ApplicationMarker, ChannelMarker, GuildMarker, InteractionMarker, MessageMarker,
                RoleMarker, UserMarker,
            },
            Id,
        },
    };
}
