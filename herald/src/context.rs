use crate::client::ChatClient;
use crate::error::ClientError;
use crate::message::{IncomingInteraction, IncomingMessage};
use crate::twilight_exports::*;
use crate::wait::{MessageWaiter, Waiters};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::timeout;

/// What caused a command to run.
#[derive(Debug, Clone)]
pub enum Trigger {
    Message(IncomingMessage),
    Interaction(IncomingInteraction),
}

#[derive(Default)]
struct Responses {
    /// Responses of a previous run of the same message, reused in order when replying.
    previous: VecDeque<Id<MessageMarker>>,
    /// Responses sent during this run.
    sent: Vec<Id<MessageMarker>>,
    /// Whether the interaction was already responded.
    responded: bool,
}

/// Framework context given to all command functions, this struct contains all the necessary
/// items to respond to the invoker, prompt for arguments and access shared data.
pub struct CommandContext<'a, D> {
    /// The chat client used by the framework.
    pub client: &'a dyn ChatClient,
    /// The data shared across the framework.
    pub data: &'a D,
    /// The id of the bot user.
    pub bot_id: Id<UserMarker>,
    /// The users considered owners of the bot.
    pub owners: &'a HashSet<Id<UserMarker>>,
    /// Messages waiting to be answered.
    pub waiters: &'a Waiters,
    /// The message or interaction that invoked the command.
    pub trigger: Trigger,
    /// The prefix in effect where the command was invoked, `None` if mention only.
    pub prefix: Option<String>,
    responses: Mutex<Responses>,
}

impl<'a, D> CommandContext<'a, D> {
    /// Creates a new context.
    pub(crate) fn new(
        client: &'a dyn ChatClient,
        data: &'a D,
        bot_id: Id<UserMarker>,
        owners: &'a HashSet<Id<UserMarker>>,
        waiters: &'a Waiters,
        trigger: Trigger,
    ) -> Self {
        Self {
            client,
            data,
            bot_id,
            owners,
            waiters,
            trigger,
            prefix: None,
            responses: Mutex::new(Responses::default()),
        }
    }

    /// Sets responses of an earlier run of the triggering message, edited instead of sending
    /// new messages.
    pub(crate) fn with_previous_responses(self, previous: Vec<Id<MessageMarker>>) -> Self {
        self.responses.lock().previous = previous.into();
        self
    }

    pub(crate) fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Takes the responses sent during this run and the previous ones that were not reused.
    pub(crate) fn take_responses(&self) -> (Vec<Id<MessageMarker>>, Vec<Id<MessageMarker>>) {
        let mut lock = self.responses.lock();
        let sent = std::mem::take(&mut lock.sent);
        let leftover = lock.previous.drain(..).collect();
        (sent, leftover)
    }

    /// The id of the user that invoked the command.
    pub fn user_id(&self) -> Id<UserMarker> {
        match &self.trigger {
            Trigger::Message(message) => message.author.id,
            Trigger::Interaction(interaction) => interaction.user_id,
        }
    }

    pub fn channel_id(&self) -> Id<ChannelMarker> {
        match &self.trigger {
            Trigger::Message(message) => message.channel_id,
            Trigger::Interaction(interaction) => interaction.channel_id,
        }
    }

    /// The guild where the command was invoked, `None` in direct messages.
    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        match &self.trigger {
            Trigger::Message(message) => message.guild_id,
            Trigger::Interaction(interaction) => interaction.guild_id,
        }
    }

    pub fn message(&self) -> Option<&IncomingMessage> {
        match &self.trigger {
            Trigger::Message(message) => Some(message),
            Trigger::Interaction(_) => None,
        }
    }

    pub fn interaction(&self) -> Option<&IncomingInteraction> {
        match &self.trigger {
            Trigger::Interaction(interaction) => Some(interaction),
            Trigger::Message(_) => None,
        }
    }

    /// Whether the given user is one of the bot owners.
    pub fn is_owner(&self, user_id: Id<UserMarker>) -> bool {
        self.owners.contains(&user_id)
    }

    /// Replies to the invoker.
    ///
    /// When the triggering message was edited, responses of the previous run are edited in order
    /// before sending new ones.
    pub async fn reply(&self, content: &str) -> Result<(), ClientError> {
        self.respond(content, true).await
    }

    /// Sends a message to the invocation channel without referencing the invoker.
    pub async fn say(&self, content: &str) -> Result<(), ClientError> {
        self.respond(content, false).await
    }

    async fn respond(&self, content: &str, reference: bool) -> Result<(), ClientError> {
        match &self.trigger {
            Trigger::Message(message) => {
                let previous = self.responses.lock().previous.pop_front();

                let id = match previous {
                    Some(id) => {
                        self.client.edit_message(message.channel_id, id, content).await?;
                        id
                    }
                    None => {
                        let reply_to = reference.then_some(message.id);
                        self.client.send_message(message.channel_id, content, reply_to).await?
                    }
                };

                self.responses.lock().sent.push(id);
            }
            Trigger::Interaction(interaction) => {
                let followup = std::mem::replace(&mut self.responses.lock().responded, true);
                self.client.respond(interaction, content, followup).await?;
            }
        }

        Ok(())
    }

    /// Sends an argument prompt to the invocation channel.
    pub async fn send_prompt(&self, content: &str) -> Result<Id<MessageMarker>, ClientError> {
        let reply_to = self.message().map(|message| message.id);
        self.client.send_message(self.channel_id(), content, reply_to).await
    }

    /// Returns a waiter resolving with the next message of the invoker in the invocation
    /// channel.
    pub fn wait_for_message(&self) -> MessageWaiter {
        let user_id = self.user_id();
        let channel_id = self.channel_id();

        self.waiters
            .wait_for(move |message| message.author.id == user_id && message.channel_id == channel_id)
    }

    /// Waits for the next message of the invoker for the given amount of seconds, `0` waits
    /// forever.
    pub async fn wait_for_reply(&self, seconds: u64) -> Option<IncomingMessage> {
        let waiter = self.wait_for_message();

        if seconds == 0 {
            return waiter.await.ok();
        }

        timeout(Duration::from_secs(seconds), waiter).await.ok()?.ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{Harness, CHANNEL};
    use crate::twilight_exports::Id;

    #[tokio::test]
    async fn replies_reuse_previous_responses() {
        let harness = Harness::new();
        let ctx = harness
            .context("!echo hi")
            .with_previous_responses(vec![Id::new(40), Id::new(41)]);

        ctx.reply("first").await.unwrap();
        let (sent, leftover) = ctx.take_responses();

        assert_eq!(sent, vec![Id::new(40)]);
        assert_eq!(leftover, vec![Id::new(41)]);
        assert_eq!(harness.client.edits(), vec![(Id::new(40), "first".to_string())]);
        assert!(harness.client.sent().is_empty());
    }

    #[tokio::test]
    async fn replies_are_tracked() {
        let harness = Harness::new();
        let ctx = harness.context("!echo hi");

        ctx.reply("one").await.unwrap();
        ctx.say("two").await.unwrap();

        let (sent, leftover) = ctx.take_responses();
        assert_eq!(sent.len(), 2);
        assert!(leftover.is_empty());
        assert_eq!(harness.client.sent(), vec!["one", "two"]);
        assert_eq!(ctx.channel_id(), Id::new(CHANNEL));
    }

    #[tokio::test]
    async fn interaction_replies_become_followups() {
        let harness = Harness::new();
        let ctx = harness.interaction_context("echo", &[("text", "hi")]);

        ctx.reply("one").await.unwrap();
        ctx.reply("two").await.unwrap();

        assert_eq!(harness.client.interaction_responses(), vec![("one".to_string(), false), ("two".to_string(), true)]);
    }
}
