//! The chat platform surface used by the framework.

use crate::builder::WrappedClient;
use crate::error::ClientError;
use crate::message::IncomingInteraction;
use crate::twilight_exports::*;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_http::error::ErrorType;
use twilight_util::permission_calculator::PermissionCalculator;

/// Information about a channel relevant to command policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Whether the channel is a direct message channel.
    pub direct: bool,
    /// Whether the channel is marked as NSFW.
    pub nsfw: bool,
}

/// A user looked up through the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Id<UserMarker>,
    pub name: String,
    pub bot: bool,
}

/// The operations the framework needs from the chat platform.
///
/// [`TwilightClient`] implements it over twilight's http client, tests can provide their own.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends a message to the given channel, optionally replying to another message.
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        reply_to: Option<Id<MessageMarker>>,
    ) -> Result<Id<MessageMarker>, ClientError>;

    async fn edit_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        content: &str,
    ) -> Result<(), ClientError>;

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ClientError>;

    /// Responds to an interaction, creating a followup message if it was already responded.
    async fn respond(
        &self,
        interaction: &IncomingInteraction,
        content: &str,
        followup: bool,
    ) -> Result<(), ClientError>;

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, ClientError>;

    async fn guild_owner(&self, guild_id: Id<GuildMarker>) -> Result<Id<UserMarker>, ClientError>;

    /// Computes the permissions the given user has in a guild channel.
    async fn permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Permissions, ClientError>;

    /// Looks up a user, returning `None` if it does not exist.
    async fn user(&self, user_id: Id<UserMarker>) -> Result<Option<UserInfo>, ClientError>;
}

#[async_trait]
impl<T: ChatClient + ?Sized> ChatClient for Arc<T> {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        reply_to: Option<Id<MessageMarker>>,
    ) -> Result<Id<MessageMarker>, ClientError> {
        (**self).send_message(channel_id, content, reply_to).await
    }

    async fn edit_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        content: &str,
    ) -> Result<(), ClientError> {
        (**self).edit_message(channel_id, message_id, content).await
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ClientError> {
        (**self).delete_message(channel_id, message_id).await
    }

    async fn respond(
        &self,
        interaction: &IncomingInteraction,
        content: &str,
        followup: bool,
    ) -> Result<(), ClientError> {
        (**self).respond(interaction, content, followup).await
    }

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, ClientError> {
        (**self).channel(channel_id).await
    }

    async fn guild_owner(&self, guild_id: Id<GuildMarker>) -> Result<Id<UserMarker>, ClientError> {
        (**self).guild_owner(guild_id).await
    }

    async fn permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Permissions, ClientError> {
        (**self).permissions(guild_id, channel_id, user_id).await
    }

    async fn user(&self, user_id: Id<UserMarker>) -> Result<Option<UserInfo>, ClientError> {
        (**self).user(user_id).await
    }
}

/// A [chat client](ChatClient) backed by twilight's http client.
pub struct TwilightClient {
    http: WrappedClient,
    application_id: Id<ApplicationMarker>,
}

impl TwilightClient {
    pub fn new(http: impl Into<WrappedClient>, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            http: http.into(),
            application_id,
        }
    }

    /// Gets the http client used by this client.
    pub fn http_client(&self) -> &Client {
        self.http.inner()
    }
}

fn is_not_found(error: &twilight_http::Error) -> bool {
    matches!(error.kind(), ErrorType::Response { status, .. } if status.get() == 404)
}

#[async_trait]
impl ChatClient for TwilightClient {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        reply_to: Option<Id<MessageMarker>>,
    ) -> Result<Id<MessageMarker>, ClientError> {
        let mut request = self.http_client().create_message(channel_id).content(content)?;

        if let Some(id) = reply_to {
            request = request.reply(id).fail_if_not_exists(false);
        }

        Ok(request.await?.model().await?.id)
    }

    async fn edit_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        content: &str,
    ) -> Result<(), ClientError> {
        self.http_client()
            .update_message(channel_id, message_id)
            .content(Some(content))?
            .await?;

        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ClientError> {
        self.http_client().delete_message(channel_id, message_id).await?;
        Ok(())
    }

    async fn respond(
        &self,
        interaction: &IncomingInteraction,
        content: &str,
        followup: bool,
    ) -> Result<(), ClientError> {
        let client = self.http_client().interaction(self.application_id);

        if followup {
            client.create_followup(&interaction.token).content(content)?.await?;
        } else {
            client
                .create_response(
                    interaction.id,
                    &interaction.token,
                    &InteractionResponse {
                        kind: InteractionResponseType::ChannelMessageWithSource,
                        data: Some(InteractionResponseData {
                            content: Some(content.to_string()),
                            ..Default::default()
                        }),
                    },
                )
                .await?;
        }

        Ok(())
    }

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, ClientError> {
        let channel = self.http_client().channel(channel_id).await?.model().await?;

        Ok(ChannelInfo {
            direct: matches!(channel.kind, ChannelType::Private | ChannelType::Group),
            nsfw: channel.nsfw.unwrap_or(false),
        })
    }

    async fn guild_owner(&self, guild_id: Id<GuildMarker>) -> Result<Id<UserMarker>, ClientError> {
        Ok(self.http_client().guild(guild_id).await?.model().await?.owner_id)
    }

    async fn permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Permissions, ClientError> {
        let guild = self.http_client().guild(guild_id).await?.model().await?;
        let member = self.http_client().guild_member(guild_id, user_id).await?.model().await?;
        let channel = self.http_client().channel(channel_id).await?.model().await?;

        let everyone = guild
            .roles
            .iter()
            .find(|role| role.id == guild_id.cast())
            .map(|role| role.permissions)
            .unwrap_or_else(Permissions::empty);

        let member_roles = guild
            .roles
            .iter()
            .filter(|role| member.roles.contains(&role.id))
            .map(|role| (role.id, role.permissions))
            .collect::<Vec<_>>();

        let overwrites = channel.permission_overwrites.unwrap_or_default();

        Ok(PermissionCalculator::new(guild_id, user_id, everyone, &member_roles)
            .owner_id(guild.owner_id)
            .in_channel(channel.kind, &overwrites))
    }

    async fn user(&self, user_id: Id<UserMarker>) -> Result<Option<UserInfo>, ClientError> {
        match self.http_client().user(user_id).await {
            Ok(response) => {
                let user = response.model().await?;
                Ok(Some(UserInfo {
                    id: user.id,
                    name: user.name,
                    bot: user.bot,
                }))
            }
            Err(why) if is_not_found(&why) => Ok(None),
            Err(why) => Err(why.into()),
        }
    }
}
