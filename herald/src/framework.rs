use crate::{
    argument::CancelReason,
    builder::FrameworkBuilder,
    client::ChatClient,
    collector::ArgumentCollector,
    command::{ArgsKind, Command, CommandArgs, ExecutionState},
    context::{CommandContext, Trigger},
    error::{ClientError, CommandFailure},
    hook::{InhibitorFn, InhibitorHook},
    message::{Incoming, IncomingInteraction, IncomingMessage},
    parsers::{parse_args, strip_quotes},
    registry::Registry,
    settings::GuildSettings,
    throttle::Throttles,
    twilight_exports::{ChannelMarker, Event, GuildMarker, Id, MessageMarker, Permissions, UserMarker},
    wait::Waiters,
};
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The default error used by the framework.
pub type DefaultError = Box<dyn std::error::Error + Send + Sync>;

/// A generic return type for commands provided by the framework.
pub type DefaultCommandResult = Result<(), DefaultError>;

const EVENT_CAPACITY: usize = 64;

lazy_static! {
    static ref BARE_COMMAND: Regex = Regex::new(r"^\s*([^\s]+)").unwrap();
}

const PERMISSION_NAMES: &[(Permissions, &str)] = &[
    (Permissions::CREATE_INVITE, "Create Instant Invite"),
    (Permissions::KICK_MEMBERS, "Kick Members"),
    (Permissions::BAN_MEMBERS, "Ban Members"),
    (Permissions::ADMINISTRATOR, "Administrator"),
    (Permissions::MANAGE_CHANNELS, "Manage Channels"),
    (Permissions::MANAGE_GUILD, "Manage Server"),
    (Permissions::ADD_REACTIONS, "Add Reactions"),
    (Permissions::VIEW_AUDIT_LOG, "View Audit Log"),
    (Permissions::PRIORITY_SPEAKER, "Priority Speaker"),
    (Permissions::STREAM, "Video"),
    (Permissions::VIEW_CHANNEL, "Read Messages"),
    (Permissions::SEND_MESSAGES, "Send Messages"),
    (Permissions::SEND_TTS_MESSAGES, "Send TTS Messages"),
    (Permissions::MANAGE_MESSAGES, "Manage Messages"),
    (Permissions::EMBED_LINKS, "Embed Links"),
    (Permissions::ATTACH_FILES, "Attach Files"),
    (Permissions::READ_MESSAGE_HISTORY, "Read Message History"),
    (Permissions::MENTION_EVERYONE, "Mention Everyone"),
    (Permissions::USE_EXTERNAL_EMOJIS, "Use External Emojis"),
    (Permissions::CONNECT, "Connect"),
    (Permissions::SPEAK, "Speak"),
    (Permissions::MUTE_MEMBERS, "Mute Members"),
    (Permissions::DEAFEN_MEMBERS, "Deafen Members"),
    (Permissions::MOVE_MEMBERS, "Move Members"),
    (Permissions::USE_VAD, "Use Voice Activity"),
    (Permissions::CHANGE_NICKNAME, "Change Nickname"),
    (Permissions::MANAGE_NICKNAMES, "Manage Nicknames"),
    (Permissions::MANAGE_ROLES, "Manage Roles"),
    (Permissions::MANAGE_WEBHOOKS, "Manage Webhooks"),
    (Permissions::MODERATE_MEMBERS, "Timeout Members"),
];

/// Display names of the given permissions.
pub fn permission_names(permissions: Permissions) -> Vec<&'static str> {
    PERMISSION_NAMES
        .iter()
        .filter(|(permission, _)| permissions.contains(*permission))
        .map(|(_, name)| *name)
        .collect()
}

/// Why a command was not allowed to run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    /// The command or its group is disabled in the guild.
    Disabled,
    /// An inhibitor blocked the command with the given reason.
    Inhibited(String),
    /// The bot can't send messages in the channel.
    CannotSend,
    /// The command can't be used as a slash command.
    InteractionsDisabled,
    DmOnly,
    GuildOnly,
    GuildOwnerOnly,
    Nsfw,
    /// The invoker lacks the given permissions, empty for owner only commands.
    Permission { missing: Permissions },
    Moderator,
    /// The bot lacks the given permissions.
    ClientPermissions { missing: Permissions },
    /// The invoker used the command too often, `remaining` seconds are left in the window.
    Throttling { remaining: f64 },
}

impl BlockReason {
    /// The message replied to the invoker of the given command when blocked for this reason.
    pub fn response(&self, command: &str) -> Option<String> {
        let response = match self {
            Self::Disabled => format!("The `{command}` command is disabled."),
            Self::Inhibited(_) | Self::CannotSend => return None,
            Self::InteractionsDisabled => format!("The `{command}` command can't be used as a slash command."),
            Self::DmOnly => format!("The `{command}` command can only be used in direct messages."),
            Self::GuildOnly => format!("The `{command}` command must be used in a server channel."),
            Self::GuildOwnerOnly => format!("The `{command}` command can only be used by the server's owner."),
            Self::Nsfw => format!("The `{command}` command can only be used in NSFW channels."),
            Self::Permission { missing } if missing.is_empty() => {
                format!("The `{command}` command can only be used by the bot owner.")
            }
            Self::Permission { missing } => match permission_names(*missing).as_slice() {
                [] => format!("You do not have permission to use the `{command}` command."),
                [name] => format!("The `{command}` command requires you to have the \"{name}\" permission."),
                names => format!(
                    "The `{command}` command requires you to have the following permissions: {}",
                    names.join(", ")
                ),
            },
            Self::Moderator => format!("The `{command}` command can only be used by moderators."),
            Self::ClientPermissions { missing } => match permission_names(*missing).as_slice() {
                [name] => format!("I need the \"{name}\" permission for the `{command}` command to work."),
                names => format!(
                    "I need the following permissions for the `{command}` command to work: {}",
                    names.join(", ")
                ),
            },
            Self::Throttling { remaining } => {
                format!("You may not use the `{command}` command again for another {remaining:.1} seconds.")
            }
        };

        Some(response)
    }
}

/// The kind of a [command error](FrameworkEvent::CommandError).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandErrorKind {
    /// The arguments were not given properly.
    Usage,
    /// The command returned a [friendly error](crate::error::FriendlyError).
    Friendly,
    /// The command failed, or the chat platform did while running it.
    Unexpected,
}

/// Lifecycle events of dispatched commands, see [subscribe](Framework::subscribe).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum FrameworkEvent {
    /// A message used a prefix but no command has the given name.
    CommandUnknown {
        name: String,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    },
    CommandBlocked {
        command: &'static str,
        reason: BlockReason,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    },
    CommandCancelled {
        command: &'static str,
        reason: CancelReason,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    },
    CommandRun {
        command: &'static str,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    },
    CommandError {
        command: &'static str,
        kind: CommandErrorKind,
        message: String,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    },
}

/// The outcome of dispatching an inbound event.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    /// The event did not invoke any command.
    NotCommand,
    /// The message answered a prompt.
    ReplyDelivered,
    /// The message used a prefix but no command matched.
    Unknown,
    Blocked(BlockReason),
    Cancelled(CancelReason),
    Executed(ExecutionState),
}

/// What invoked a command, besides its name.
enum Input {
    /// The argument string following the command name.
    Text(String),
    /// Captures of the pattern that matched.
    Pattern(Vec<Option<String>>),
    /// The options of the interaction.
    Options,
}

enum Resolution<D, E> {
    Command(Arc<Command<D, E>>, Input),
    Unknown(String),
    None,
}

/// Responses of a command, kept so they can be edited when its message is.
struct EditableResponses {
    channel_id: Id<ChannelMarker>,
    content: String,
    responses: Vec<Id<MessageMarker>>,
    expires: Instant,
}

/// The framework used to dispatch commands.
pub struct Framework<D, E = DefaultError> {
    client: Box<dyn ChatClient>,
    /// Data shared across all command and hook invocations.
    pub data: D,
    bot_id: Id<UserMarker>,
    prefix: Option<String>,
    owners: HashSet<Id<UserMarker>>,
    moderator_permissions: Permissions,
    command_editable_duration: Duration,
    settings: Option<Box<dyn GuildSettings>>,
    registry: RwLock<Registry<D, E>>,
    inhibitors: RwLock<Vec<InhibitorHook<D>>>,
    waiters: Arc<Waiters>,
    throttles: Throttles,
    patterns: Mutex<HashMap<Option<String>, Regex>>,
    responses: Mutex<HashMap<Id<MessageMarker>, EditableResponses>>,
    events: broadcast::Sender<FrameworkEvent>,
}

impl<D, E> Framework<D, E>
where
    D: Send + Sync + 'static,
    E: CommandFailure,
{
    pub(crate) fn from_builder(builder: FrameworkBuilder<D, E>, registry: Registry<D, E>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            client: builder.client,
            data: builder.data,
            bot_id: builder.bot_id,
            prefix: builder.prefix,
            owners: builder.owners,
            moderator_permissions: builder.moderator_permissions,
            command_editable_duration: builder.command_editable_duration,
            settings: builder.settings,
            registry: RwLock::new(registry),
            inhibitors: RwLock::new(builder.inhibitors),
            waiters: Arc::new(Waiters::new()),
            throttles: Throttles::new(),
            patterns: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Creates a new framework builder, this is a shortcut to FrameworkBuilder.
    /// [new](crate::builder::FrameworkBuilder::new)
    pub fn builder(client: impl ChatClient + 'static, bot_id: Id<UserMarker>, data: D) -> FrameworkBuilder<D, E> {
        FrameworkBuilder::new(client, bot_id, data)
    }

    /// Gets the chat client used by the framework.
    pub fn client(&self) -> &dyn ChatClient {
        &*self.client
    }

    pub fn bot_id(&self) -> Id<UserMarker> {
        self.bot_id
    }

    /// The default prefix, `None` if commands are only invoked by mentioning the bot.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn owners(&self) -> &HashSet<Id<UserMarker>> {
        &self.owners
    }

    /// Locks the registry for reading. The lock must not be held across awaits.
    pub fn registry(&self) -> RwLockReadGuard<'_, Registry<D, E>> {
        self.registry.read()
    }

    /// Locks the registry for writing, allowing to register items after the framework was built.
    pub fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry<D, E>> {
        self.registry.write()
    }

    /// Messages waiting to be answered, and the users answering prompts.
    pub fn waiters(&self) -> &Arc<Waiters> {
        &self.waiters
    }

    pub fn throttles(&self) -> &Throttles {
        &self.throttles
    }

    /// Registers an inhibitor, executed after the ones already registered.
    pub fn register_inhibitor(&self, fun: InhibitorFn<D>) {
        self.inhibitors.write().push(InhibitorHook(fun));
    }

    /// Subscribes to the lifecycle events of dispatched commands.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameworkEvent> {
        self.events.subscribe()
    }

    /// Processes the given gateway event, dispatching commands or waking waiters if necessary.
    pub async fn process(&self, event: &Event) -> ProcessResult {
        match Incoming::from_event(event) {
            Some(incoming) => self.dispatch(incoming).await,
            None => ProcessResult::NotCommand,
        }
    }

    /// Dispatches the given event.
    pub async fn dispatch(&self, incoming: Incoming) -> ProcessResult {
        match incoming {
            Incoming::MessageCreate(message) => self.handle_message(message, false).await,
            Incoming::MessageUpdate(message) => self.handle_message(message, true).await,
            Incoming::Interaction(interaction) => self.handle_interaction(interaction).await,
        }
    }

    fn emit(&self, event: FrameworkEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn context(&self, trigger: Trigger) -> CommandContext<'_, D> {
        CommandContext::new(&*self.client, &self.data, self.bot_id, &self.owners, &self.waiters, trigger)
    }

    async fn handle_message(&self, message: IncomingMessage, edited: bool) -> ProcessResult {
        if message.author.id == self.bot_id || message.author.bot {
            return ProcessResult::NotCommand;
        }

        if !edited && self.waiters.wake(&message) {
            debug!("Message [{}] delivered to a waiter", message.id);
            return ProcessResult::ReplyDelivered;
        }

        if self.waiters.is_awaiting(message.author.id, message.channel_id) {
            return ProcessResult::NotCommand;
        }

        let previous = if edited {
            match self.take_editable(&message) {
                Some(previous) => previous,
                None => return ProcessResult::NotCommand,
            }
        } else {
            Vec::new()
        };

        let prefix = self.prefix_for(message.guild_id).await;

        let (command, input) = match self.resolve_message(&message, prefix.as_deref()) {
            Resolution::Command(command, input) => (command, input),
            Resolution::Unknown(name) => {
                debug!("Unknown command [{}]", name);
                self.delete_responses(message.channel_id, previous).await;
                self.emit(FrameworkEvent::CommandUnknown {
                    name,
                    user_id: message.author.id,
                    channel_id: message.channel_id,
                });
                return ProcessResult::Unknown;
            }
            Resolution::None => {
                self.delete_responses(message.channel_id, previous).await;
                return ProcessResult::NotCommand;
            }
        };

        let message_id = message.id;
        let channel_id = message.channel_id;
        let content = message.content.clone();

        let ctx = self
            .context(Trigger::Message(message))
            .with_prefix(prefix)
            .with_previous_responses(previous);

        let result = self.run(&ctx, command, input).await;

        let (sent, leftover) = ctx.take_responses();
        self.delete_responses(channel_id, leftover).await;

        if !self.command_editable_duration.is_zero() {
            let now = Instant::now();
            let mut lock = self.responses.lock();
            lock.retain(|_, entry| entry.expires > now);
            lock.insert(
                message_id,
                EditableResponses {
                    channel_id,
                    content,
                    responses: sent,
                    expires: now + self.command_editable_duration,
                },
            );
        }

        result
    }

    async fn handle_interaction(&self, interaction: IncomingInteraction) -> ProcessResult {
        if interaction.bot {
            return ProcessResult::NotCommand;
        }

        let command = self.registry.read().find_commands(&interaction.name, true).into_iter().next();

        let Some(command) = command else {
            debug!("Unknown interaction command [{}]", interaction.name);
            self.emit(FrameworkEvent::CommandUnknown {
                name: interaction.name,
                user_id: interaction.user_id,
                channel_id: interaction.channel_id,
            });
            return ProcessResult::Unknown;
        };

        let ctx = self.context(Trigger::Interaction(interaction));
        self.run(&ctx, command, Input::Options).await
    }

    /// Takes the responses of an earlier run of the message, if it is still editable and its
    /// content changed.
    fn take_editable(&self, message: &IncomingMessage) -> Option<Vec<Id<MessageMarker>>> {
        let now = Instant::now();
        let mut lock = self.responses.lock();
        lock.retain(|_, entry| entry.expires > now);

        if lock.get(&message.id)?.content == message.content {
            return None;
        }

        lock.remove(&message.id).map(|entry| entry.responses)
    }

    async fn delete_responses(&self, channel_id: Id<ChannelMarker>, responses: Vec<Id<MessageMarker>>) {
        for id in responses {
            if let Err(why) = self.client.delete_message(channel_id, id).await {
                warn!("Failed to delete stale response [{}]: {}", id, why);
            }
        }
    }

    /// The prefix in effect in the guild, `None` if only mentions invoke commands.
    async fn prefix_for(&self, guild_id: Option<Id<GuildMarker>>) -> Option<String> {
        let prefix = match (guild_id, &self.settings) {
            (Some(guild_id), Some(settings)) => settings.prefix(guild_id).await.or_else(|| self.prefix.clone()),
            _ => self.prefix.clone(),
        };

        prefix.filter(|prefix| !prefix.is_empty())
    }

    /// Gets the pattern matching invocations with the given prefix, building it if needed.
    fn command_pattern(&self, prefix: Option<&str>) -> Option<Regex> {
        let key = prefix.map(str::to_string);
        let mut lock = self.patterns.lock();

        if let Some(pattern) = lock.get(&key) {
            return Some(pattern.clone());
        }

        let source = match prefix {
            Some(prefix) => format!(
                r"(?i)^(<@!?{bot}>\s+(?:{prefix}\s*)?|{prefix}\s*)([^\s]+)",
                bot = self.bot_id,
                prefix = regex::escape(prefix)
            ),
            None => format!(r"(?i)^(<@!?{}>\s+)([^\s]+)", self.bot_id),
        };

        match Regex::new(&source) {
            Ok(pattern) => {
                lock.insert(key, pattern.clone());
                Some(pattern)
            }
            Err(why) => {
                warn!("Failed to build the command pattern for prefix {:?}: {}", prefix, why);
                None
            }
        }
    }

    /// Splits the content into the command name, taken from the given capture group, and the
    /// argument string following the match.
    fn split_invocation(pattern: &Regex, content: &str, group: usize) -> Option<(String, String)> {
        let captures = pattern.captures(content)?;
        let name = captures.get(group)?.as_str().to_string();
        let rest = content[captures.get(0)?.end()..].to_string();
        Some((name, rest))
    }

    fn resolve_message(&self, message: &IncomingMessage, prefix: Option<&str>) -> Resolution<D, E> {
        if let Some((command, captures)) = self.registry.read().match_pattern(&message.content) {
            return Resolution::Command(command, Input::Pattern(captures));
        }

        let invocation = self
            .command_pattern(prefix)
            .and_then(|pattern| Self::split_invocation(&pattern, &message.content, 2))
            .or_else(|| {
                if message.guild_id.is_none() {
                    Self::split_invocation(&BARE_COMMAND, &message.content, 1)
                } else {
                    None
                }
            });

        let Some((name, args)) = invocation else {
            return Resolution::None;
        };

        let registry = self.registry.read();
        let command = registry
            .find_commands(&name, true)
            .into_iter()
            .find(|command| command.default_handling)
            .or_else(|| registry.unknown_command());

        match command {
            Some(command) => Resolution::Command(command, Input::Text(args)),
            None => Resolution::Unknown(name),
        }
    }

    /// Runs the checks, resolves the arguments and executes the command.
    async fn run(&self, ctx: &CommandContext<'_, D>, command: Arc<Command<D, E>>, input: Input) -> ProcessResult {
        match self.check(ctx, &command).await {
            Ok(None) => (),
            Ok(Some((reason, response))) => return self.block(ctx, &command, reason, response).await,
            Err(why) => return self.fail(ctx, &command, CommandErrorKind::Unexpected, why.to_string()),
        }

        if command.deprecated {
            let notice = match command.replaced_by {
                Some(replacement) => format!(
                    "The `{}` command has been deprecated, and will be removed in a future update. Please use the `{replacement}` command instead.",
                    command.name
                ),
                None => format!(
                    "The `{}` command has been deprecated, and will be removed in a future update.",
                    command.name
                ),
            };

            if let Err(why) = ctx.reply(&notice).await {
                warn!("Command [{}] failed to send the deprecation notice: {}", command.name, why);
            }
        }

        let args = match self.resolve_args(ctx, &command, input).await {
            Ok(args) => args,
            Err(result) => return result,
        };

        if let Some(throttling) = &command.throttling {
            if !ctx.is_owner(ctx.user_id()) {
                self.throttles.record(command.name, ctx.user_id(), throttling);
            }
        }

        debug!("Running command [{}]", command.name);

        match (command.fun)(ctx, args).await {
            Ok(()) => {
                self.emit(FrameworkEvent::CommandRun {
                    command: command.name,
                    user_id: ctx.user_id(),
                    channel_id: ctx.channel_id(),
                });
                ProcessResult::Executed(ExecutionState::CommandFinished)
            }
            Err(error) => {
                info!("Command [{}] raised an error: {}", command.name, error);

                let kind = match error.friendly() {
                    Some(_) => CommandErrorKind::Friendly,
                    None => CommandErrorKind::Unexpected,
                };
                self.emit(FrameworkEvent::CommandError {
                    command: command.name,
                    kind,
                    message: error.to_string(),
                    user_id: ctx.user_id(),
                    channel_id: ctx.channel_id(),
                });

                let response = match (&command.error_handler, error.friendly()) {
                    (Some(_), _) => None,
                    (None, Some(friendly)) => Some(friendly.to_string()),
                    (None, None) if command.reply_on_error => Some(format!(
                        "An error occurred while running the `{}` command: `{error}`",
                        command.name
                    )),
                    (None, None) => None,
                };

                if let Some(handler) = &command.error_handler {
                    (handler.0)(ctx, error).await;
                } else if let Some(response) = response {
                    if let Err(why) = ctx.reply(&response).await {
                        warn!("Command [{}] failed to report its error: {}", command.name, why);
                    }
                }

                ProcessResult::Executed(ExecutionState::CommandErrored)
            }
        }
    }

    /// Checks whether the command may run, returning why not and the reply to send.
    async fn check(
        &self,
        ctx: &CommandContext<'_, D>,
        command: &Command<D, E>,
    ) -> Result<Option<(BlockReason, Option<String>)>, ClientError> {
        if !self.is_enabled(ctx, command).await {
            return Ok(Some((BlockReason::Disabled, BlockReason::Disabled.response(command.name))));
        }

        let inhibitors = self.inhibitors.read().iter().map(|hook| hook.0).collect::<Vec<_>>();

        for inhibitor in inhibitors {
            if let Some(inhibition) = inhibitor(ctx, command.name).await {
                return Ok(Some((BlockReason::Inhibited(inhibition.reason), inhibition.response)));
            }
        }

        Ok(self.check_policies(ctx, command).await?.map(|reason| {
            let response = reason.response(command.name);
            (reason, response)
        }))
    }

    async fn is_enabled(&self, ctx: &CommandContext<'_, D>, command: &Command<D, E>) -> bool {
        let (Some(guild_id), Some(settings)) = (ctx.guild_id(), &self.settings) else {
            return true;
        };

        if command.guarded {
            return true;
        }

        if !settings.command_enabled(guild_id, command.name).await {
            return false;
        }

        let group = command.group.and_then(|id| self.registry.read().group(id).cloned());

        match group {
            Some(group) if !group.guarded => settings.group_enabled(guild_id, group.id).await,
            _ => true,
        }
    }

    async fn check_policies(
        &self,
        ctx: &CommandContext<'_, D>,
        command: &Command<D, E>,
    ) -> Result<Option<BlockReason>, ClientError> {
        let user_id = ctx.user_id();
        let is_owner = ctx.is_owner(user_id);
        let guild_id = ctx.guild_id();
        let mut bot_permissions = None;

        if let (Some(guild_id), Some(_)) = (guild_id, ctx.message()) {
            let permissions = self.client.permissions(guild_id, ctx.channel_id(), self.bot_id).await?;

            if !permissions.contains(Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL) {
                return Ok(Some(BlockReason::CannotSend));
            }

            bot_permissions = Some(permissions);
        }

        if ctx.interaction().is_some() && !command.interactions {
            return Ok(Some(BlockReason::InteractionsDisabled));
        }

        if command.dm_only && guild_id.is_some() {
            return Ok(Some(BlockReason::DmOnly));
        }

        if command.guild_only && guild_id.is_none() {
            return Ok(Some(BlockReason::GuildOnly));
        }

        if command.guild_owner_only {
            let guild_owner = match guild_id {
                Some(guild_id) => Some(self.client.guild_owner(guild_id).await?),
                None => None,
            };

            if guild_owner != Some(user_id) {
                return Ok(Some(BlockReason::GuildOwnerOnly));
            }
        }

        if command.nsfw && !self.client.channel(ctx.channel_id()).await?.nsfw {
            return Ok(Some(BlockReason::Nsfw));
        }

        if !is_owner {
            if command.owner_only {
                return Ok(Some(BlockReason::Permission {
                    missing: Permissions::empty(),
                }));
            }

            let needs_member = command.user_permissions.is_some() || command.moderator_only;
            let member_permissions = match guild_id {
                Some(guild_id) if needs_member => Some(self.member_permissions(ctx, guild_id).await?),
                _ => None,
            };

            if let (Some(required), Some(permissions)) = (command.user_permissions, member_permissions) {
                let missing = required.difference(permissions);
                if !missing.is_empty() {
                    return Ok(Some(BlockReason::Permission { missing }));
                }
            }

            if command.moderator_only {
                let moderator = member_permissions.map_or(false, |permissions| {
                    permissions.contains(Permissions::ADMINISTRATOR)
                        || permissions.intersects(self.moderator_permissions)
                });

                if !moderator {
                    return Ok(Some(BlockReason::Moderator));
                }
            }
        }

        if let (Some(required), Some(guild_id)) = (command.client_permissions, guild_id) {
            let permissions = match (bot_permissions, ctx.interaction().and_then(|i| i.app_permissions)) {
                (Some(permissions), _) | (None, Some(permissions)) => permissions,
                (None, None) => self.client.permissions(guild_id, ctx.channel_id(), self.bot_id).await?,
            };

            let missing = required.difference(permissions);
            if !missing.is_empty() {
                return Ok(Some(BlockReason::ClientPermissions { missing }));
            }
        }

        if let Some(throttling) = &command.throttling {
            if !is_owner {
                if let Some(remaining) = self.throttles.check(command.name, user_id, throttling) {
                    return Ok(Some(BlockReason::Throttling { remaining }));
                }
            }
        }

        Ok(None)
    }

    /// Permissions of the invoker in the invocation channel.
    async fn member_permissions(
        &self,
        ctx: &CommandContext<'_, D>,
        guild_id: Id<GuildMarker>,
    ) -> Result<Permissions, ClientError> {
        if let Some(permissions) = ctx.interaction().and_then(|i| i.member_permissions) {
            return Ok(permissions);
        }

        self.client.permissions(guild_id, ctx.channel_id(), ctx.user_id()).await
    }

    async fn block(
        &self,
        ctx: &CommandContext<'_, D>,
        command: &Command<D, E>,
        reason: BlockReason,
        response: Option<String>,
    ) -> ProcessResult {
        debug!("Command [{}] blocked: {:?}", command.name, reason);

        if let Some(response) = response {
            if let Err(why) = ctx.reply(&response).await {
                warn!("Command [{}] failed to reply why it was blocked: {}", command.name, why);
            }
        }

        self.emit(FrameworkEvent::CommandBlocked {
            command: command.name,
            reason: reason.clone(),
            user_id: ctx.user_id(),
            channel_id: ctx.channel_id(),
        });

        ProcessResult::Blocked(reason)
    }

    fn fail(
        &self,
        ctx: &CommandContext<'_, D>,
        command: &Command<D, E>,
        kind: CommandErrorKind,
        message: String,
    ) -> ProcessResult {
        warn!("Command [{}] failed: {}", command.name, message);

        self.emit(FrameworkEvent::CommandError {
            command: command.name,
            kind,
            message,
            user_id: ctx.user_id(),
            channel_id: ctx.channel_id(),
        });

        ProcessResult::Executed(ExecutionState::CommandErrored)
    }

    /// Resolves the arguments of the command, returning the outcome of the dispatch instead if
    /// they could not be obtained.
    async fn resolve_args(
        &self,
        ctx: &CommandContext<'_, D>,
        command: &Command<D, E>,
        input: Input,
    ) -> Result<CommandArgs, ProcessResult> {
        let single_quotes = command.args_single_quotes;

        let Some(collector) = &command.collector else {
            return Ok(Self::free_form_args(ctx, command, input));
        };

        let (provided, prompt_limit) = match input {
            Input::Pattern(captures) => return Ok(CommandArgs::Pattern(captures)),
            Input::Text(text) => (
                parse_args(text.trim(), collector.arg_count(), single_quotes),
                collector.prompt_limit,
            ),
            Input::Options => (Self::option_values(ctx, collector, single_quotes), Some(0)),
        };

        let result = match collector.obtain_with_limit(ctx, &provided, prompt_limit).await {
            Ok(result) => result,
            Err(why) => return Err(self.fail(ctx, command, CommandErrorKind::Unexpected, why.to_string())),
        };

        if let Some(values) = result.values {
            return Ok(CommandArgs::Values(values));
        }

        let reason = result.cancelled.unwrap_or(CancelReason::User);

        if result.prompts.is_empty() || reason == CancelReason::PromptLimit {
            let prefix = match &ctx.trigger {
                Trigger::Message(_) => ctx.prefix.as_deref(),
                Trigger::Interaction(_) => Some("/"),
            };
            let response = format!(
                "Invalid command usage. The `{}` command's accepted format is: {}.",
                command.name,
                command.usage(prefix)
            );

            if let Err(why) = ctx.reply(&response).await {
                warn!("Command [{}] failed to reply its usage: {}", command.name, why);
            }

            self.emit(FrameworkEvent::CommandError {
                command: command.name,
                kind: CommandErrorKind::Usage,
                message: response,
                user_id: ctx.user_id(),
                channel_id: ctx.channel_id(),
            });

            return Err(ProcessResult::Executed(ExecutionState::InvalidUsage));
        }

        debug!("Command [{}] cancelled: {}", command.name, reason);

        if let Err(why) = ctx.reply("Cancelled command.").await {
            warn!("Command [{}] failed to reply its cancellation: {}", command.name, why);
        }

        self.emit(FrameworkEvent::CommandCancelled {
            command: command.name,
            reason,
            user_id: ctx.user_id(),
            channel_id: ctx.channel_id(),
        });

        Err(ProcessResult::Cancelled(reason))
    }

    /// Values of the interaction options, one per argument. Infinite arguments take every token
    /// of their option.
    fn option_values(ctx: &CommandContext<'_, D>, collector: &ArgumentCollector<D>, single_quotes: bool) -> Vec<String> {
        let Some(interaction) = ctx.interaction() else {
            return Vec::new();
        };

        let mut provided = Vec::new();

        for argument in &collector.arguments {
            let value = interaction.option(argument.key).unwrap_or_default();

            if argument.infinite {
                provided.extend(parse_args(value, 0, single_quotes));
            } else {
                provided.push(value.to_string());
            }
        }

        provided
    }

    fn free_form_args(ctx: &CommandContext<'_, D>, command: &Command<D, E>, input: Input) -> CommandArgs {
        let single_quotes = command.args_single_quotes;

        let text = match input {
            Input::Pattern(captures) => return CommandArgs::Pattern(captures),
            Input::Text(text) => text,
            Input::Options => ctx
                .interaction()
                .map(|interaction| {
                    interaction
                        .options
                        .iter()
                        .map(|(_, value)| value.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default(),
        };

        match command.args_kind {
            ArgsKind::Single => CommandArgs::Single(strip_quotes(text.trim(), single_quotes).to_string()),
            ArgsKind::Multiple { count } => CommandArgs::Multiple(parse_args(text.trim(), count, single_quotes)),
        }
    }
}
