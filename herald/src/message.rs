//! Framework-side views of the gateway events the dispatcher consumes.
//!
//! These types are built from twilight's models instead of wrapping them, so the dispatcher and
//! the argument collector only depend on the handful of fields they actually read.

use crate::iter::OptionIterator;
use crate::twilight_exports::*;

/// The author of an [incoming message](IncomingMessage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Id<UserMarker>,
    pub bot: bool,
}

/// A chat message that may invoke a command or answer a prompt.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub author: Author,
    pub content: String,
}

impl IncomingMessage {
    /// Builds the message from a `MESSAGE_UPDATE` payload, returning `None` when the update does
    /// not carry the author or the content, as happens with embed-only updates.
    pub fn from_update(update: &MessageUpdate) -> Option<Self> {
        let author = update.author.as_ref()?;
        let content = update.content.clone()?;

        Some(Self {
            id: update.id,
            channel_id: update.channel_id,
            guild_id: update.guild_id,
            author: Author {
                id: author.id,
                bot: author.bot,
            },
            content,
        })
    }
}

impl From<&Message> for IncomingMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            guild_id: message.guild_id,
            author: Author {
                id: message.author.id,
                bot: message.author.bot,
            },
            content: message.content.clone(),
        }
    }
}

/// An application command interaction, with its options already flattened to raw values.
#[derive(Debug, Clone)]
pub struct IncomingInteraction {
    pub id: Id<InteractionMarker>,
    pub token: String,
    pub channel_id: Id<ChannelMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub user_id: Id<UserMarker>,
    /// Whether the invoking user is a bot.
    pub bot: bool,
    /// The declared name of the invoked command.
    pub name: String,
    /// Option name and its raw value, in the order the platform delivered them.
    pub options: Vec<(String, String)>,
    /// Permissions of the invoking member in the channel, only present inside guilds.
    pub member_permissions: Option<Permissions>,
    /// Permissions of the application in the channel.
    pub app_permissions: Option<Permissions>,
}

impl IncomingInteraction {
    /// Builds the interaction out of a twilight one, returning `None` if it is not an
    /// application command or is missing the channel or the user.
    pub fn from_interaction(interaction: &Interaction) -> Option<Self> {
        if interaction.kind != InteractionType::ApplicationCommand {
            return None;
        }

        let Some(InteractionData::ApplicationCommand(data)) = &interaction.data else {
            return None;
        };

        let user = interaction
            .member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(interaction.user.as_ref())?;

        Some(Self {
            id: interaction.id,
            token: interaction.token.clone(),
            channel_id: interaction.channel.as_ref()?.id,
            guild_id: interaction.guild_id,
            user_id: user.id,
            bot: user.bot,
            name: data.name.clone(),
            options: OptionIterator::new(&data.options).raw_values(),
            member_permissions: interaction.member.as_ref().and_then(|member| member.permissions),
            app_permissions: interaction.app_permissions,
        })
    }

    /// Gets the raw value of the option with the given name.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(option, _)| option == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An inbound event the [framework](crate::framework::Framework) knows how to dispatch.
#[derive(Debug, Clone)]
pub enum Incoming {
    MessageCreate(IncomingMessage),
    MessageUpdate(IncomingMessage),
    Interaction(IncomingInteraction),
}

impl Incoming {
    /// Converts a gateway event, returning `None` for events the framework does not handle.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::MessageCreate(message) => Some(Self::MessageCreate(IncomingMessage::from(&message.0))),
            Event::MessageUpdate(update) => IncomingMessage::from_update(update).map(Self::MessageUpdate),
            Event::InteractionCreate(interaction) => {
                IncomingInteraction::from_interaction(&interaction.0).map(Self::Interaction)
            }
            _ => None,
        }
    }
}
