//! In-memory chat client and helpers shared by the unit tests.

use crate::client::{ChannelInfo, ChatClient, UserInfo};
use crate::context::{CommandContext, Trigger};
use crate::error::ClientError;
use crate::message::{Author, IncomingInteraction, IncomingMessage};
use crate::registry::TypeRegistry;
use crate::twilight_exports::*;
use crate::wait::Waiters;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const BOT: u64 = 10;
pub const OWNER: u64 = 1;
pub const USER: u64 = 2;
pub const GUILD_OWNER: u64 = 3;
pub const CHANNEL: u64 = 100;
pub const GUILD: u64 = 1000;

/// A message sent by the owner in the test guild channel.
pub fn message_from(id: u64, content: impl Into<String>) -> IncomingMessage {
    IncomingMessage {
        id: Id::new(id),
        channel_id: Id::new(CHANNEL),
        guild_id: Some(Id::new(GUILD)),
        author: Author {
            id: Id::new(OWNER),
            bot: false,
        },
        content: content.into(),
    }
}

/// A message sent by the given user in the test guild channel.
pub fn message_by(user: u64, id: u64, content: impl Into<String>) -> IncomingMessage {
    let mut message = message_from(id, content);
    message.author.id = Id::new(user);
    message
}

pub fn interaction(user: u64, name: &str, options: &[(&str, &str)]) -> IncomingInteraction {
    IncomingInteraction {
        id: Id::new(77),
        token: "token".into(),
        channel_id: Id::new(CHANNEL),
        guild_id: Some(Id::new(GUILD)),
        user_id: Id::new(user),
        bot: false,
        name: name.into(),
        options: options
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        member_permissions: None,
        app_permissions: None,
    }
}

/// A [chat client](ChatClient) recording every outbound call.
pub struct FakeClient {
    waiters: Mutex<Arc<Waiters>>,
    next_id: AtomicU64,
    sent: Mutex<Vec<String>>,
    edits: Mutex<Vec<(Id<MessageMarker>, String)>>,
    deleted: Mutex<Vec<Id<MessageMarker>>>,
    interaction_responses: Mutex<Vec<(String, bool)>>,
    pub channels: Mutex<HashMap<Id<ChannelMarker>, ChannelInfo>>,
    pub permissions: Mutex<HashMap<Id<UserMarker>, Permissions>>,
    pub missing_users: Mutex<HashSet<Id<UserMarker>>>,
    pub user_lookups: AtomicUsize,
    pub fail_sends: AtomicBool,
}

impl FakeClient {
    pub fn new(waiters: Arc<Waiters>) -> Self {
        Self {
            waiters: Mutex::new(waiters),
            next_id: AtomicU64::new(5000),
            sent: Default::default(),
            edits: Default::default(),
            deleted: Default::default(),
            interaction_responses: Default::default(),
            channels: Default::default(),
            permissions: Default::default(),
            missing_users: Default::default(),
            user_lookups: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Delivers replies to prompts to the given waiters instead.
    pub fn attach(&self, waiters: Arc<Waiters>) {
        *self.waiters.lock() = waiters;
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Answers the next prompts of the owner with the given replies, in order.
    pub fn queue_replies<I, S>(&self, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let waiters = self.waiters.lock().clone();
        let messages = replies
            .into_iter()
            .map(|reply| message_from(self.next_id(), reply))
            .collect::<Vec<_>>();

        tokio::spawn(async move {
            for message in messages {
                while !waiters.wake(&message) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });
    }

    pub fn set_channel(&self, channel_id: u64, info: ChannelInfo) {
        self.channels.lock().insert(Id::new(channel_id), info);
    }

    pub fn set_permissions(&self, user_id: u64, permissions: Permissions) {
        self.permissions.lock().insert(Id::new(user_id), permissions);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn edits(&self) -> Vec<(Id<MessageMarker>, String)> {
        self.edits.lock().clone()
    }

    pub fn deleted(&self) -> Vec<Id<MessageMarker>> {
        self.deleted.lock().clone()
    }

    pub fn interaction_responses(&self) -> Vec<(String, bool)> {
        self.interaction_responses.lock().clone()
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    async fn send_message(
        &self,
        _channel_id: Id<ChannelMarker>,
        content: &str,
        _reply_to: Option<Id<MessageMarker>>,
    ) -> Result<Id<MessageMarker>, ClientError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ClientError::Other("sending is broken".into()));
        }

        self.sent.lock().push(content.to_string());
        Ok(Id::new(self.next_id()))
    }

    async fn edit_message(
        &self,
        _channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        content: &str,
    ) -> Result<(), ClientError> {
        self.edits.lock().push((message_id, content.to_string()));
        Ok(())
    }

    async fn delete_message(
        &self,
        _channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ClientError> {
        self.deleted.lock().push(message_id);
        Ok(())
    }

    async fn respond(
        &self,
        _interaction: &IncomingInteraction,
        content: &str,
        followup: bool,
    ) -> Result<(), ClientError> {
        self.interaction_responses.lock().push((content.to_string(), followup));
        Ok(())
    }

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, ClientError> {
        Ok(self.channels.lock().get(&channel_id).copied().unwrap_or(ChannelInfo {
            direct: false,
            nsfw: false,
        }))
    }

    async fn guild_owner(&self, _guild_id: Id<GuildMarker>) -> Result<Id<UserMarker>, ClientError> {
        Ok(Id::new(GUILD_OWNER))
    }

    async fn permissions(
        &self,
        _guild_id: Id<GuildMarker>,
        _channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Permissions, ClientError> {
        let default = if user_id == Id::new(BOT) {
            Permissions::all()
        } else {
            Permissions::empty()
        };

        Ok(self.permissions.lock().get(&user_id).copied().unwrap_or(default))
    }

    async fn user(&self, user_id: Id<UserMarker>) -> Result<Option<UserInfo>, ClientError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);

        if self.missing_users.lock().contains(&user_id) {
            return Ok(None);
        }

        Ok(Some(UserInfo {
            id: user_id,
            name: format!("user{user_id}"),
            bot: false,
        }))
    }
}

/// Owns everything a [command context](CommandContext) borrows.
pub struct Harness {
    pub client: Arc<FakeClient>,
    pub waiters: Arc<Waiters>,
    pub owners: HashSet<Id<UserMarker>>,
}

impl Harness {
    pub fn new() -> Self {
        let waiters = Arc::new(Waiters::new());

        Self {
            client: Arc::new(FakeClient::new(waiters.clone())),
            waiters,
            owners: HashSet::from([Id::new(OWNER)]),
        }
    }

    pub fn types(&self) -> TypeRegistry<()> {
        TypeRegistry::with_defaults()
    }

    /// A context triggered by a message of the owner with the given content.
    pub fn context(&self, content: &str) -> CommandContext<'_, ()> {
        self.context_for(Trigger::Message(message_from(1, content)))
    }

    pub fn interaction_context(&self, name: &str, options: &[(&str, &str)]) -> CommandContext<'_, ()> {
        self.context_for(Trigger::Interaction(interaction(OWNER, name, options)))
    }

    fn context_for(&self, trigger: Trigger) -> CommandContext<'_, ()> {
        CommandContext::new(&*self.client, &(), Id::new(BOT), &self.owners, &self.waiters, trigger)
    }
}
