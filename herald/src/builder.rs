use crate::{
    client::ChatClient,
    command::Command,
    error::{CommandFailure, RegistryError},
    framework::{DefaultError, Framework},
    group::Group,
    hook::{InhibitorFn, InhibitorHook},
    registry::Registry,
    settings::GuildSettings,
    twilight_exports::{Client, Id, Permissions, UserMarker},
    types::ArgumentType,
};
use std::collections::HashSet;
use std::{ops::Deref, sync::Arc, time::Duration};

/// How long responses of a command stay editable by editing its message, unless configured.
const DEFAULT_EDITABLE_DURATION: Duration = Duration::from_secs(30);

/// A wrapper around twilight's http client allowing the user to decide how to provide it to the framework.
#[allow(clippy::large_enum_variant)]
pub enum WrappedClient {
    Arc(Arc<Client>),
    Raw(Client),
    Boxed(Box<dyn Deref<Target = Client> + Send + Sync>),
}

impl WrappedClient {
    /// Returns the underlying http client.
    pub fn inner(&self) -> &Client {
        match self {
            Self::Arc(c) => c,
            Self::Raw(c) => c,
            Self::Boxed(b) => b,
        }
    }
}

impl From<Client> for WrappedClient {
    fn from(c: Client) -> Self {
        WrappedClient::Raw(c)
    }
}

impl From<Arc<Client>> for WrappedClient {
    fn from(c: Arc<Client>) -> Self {
        WrappedClient::Arc(c)
    }
}

impl From<Box<dyn Deref<Target = Client> + Send + Sync>> for WrappedClient {
    fn from(c: Box<dyn Deref<Target = Client> + Send + Sync>) -> Self {
        Self::Boxed(c)
    }
}

/// A builder used to set all options before framework initialization.
pub struct FrameworkBuilder<D, E = DefaultError> {
    /// The chat client used by the framework.
    pub client: Box<dyn ChatClient>,
    /// The id of the bot user, used to ignore its own messages and to match mentions.
    pub bot_id: Id<UserMarker>,
    /// Data that will be available to all commands.
    pub data: D,
    /// The default prefix, `None` to only allow mentions.
    pub prefix: Option<String>,
    pub owners: HashSet<Id<UserMarker>>,
    /// Permissions granting access to moderator only commands, besides administrator.
    pub moderator_permissions: Permissions,
    /// How long editing a message re-runs its command over the previous responses.
    pub command_editable_duration: Duration,
    pub settings: Option<Box<dyn GuildSettings>>,
    pub groups: Vec<Group>,
    pub commands: Vec<Command<D, E>>,
    pub types: Vec<Arc<dyn ArgumentType<D>>>,
    /// Hooks executed before the usage checks of every command, in order.
    pub inhibitors: Vec<InhibitorHook<D>>,
}

impl<D, E> FrameworkBuilder<D, E>
where
    D: Send + Sync + 'static,
    E: CommandFailure,
{
    /// Creates a new [Builder](self::FrameworkBuilder).
    pub fn new(client: impl ChatClient + 'static, bot_id: Id<UserMarker>, data: D) -> Self {
        Self {
            client: Box::new(client),
            bot_id,
            data,
            prefix: None,
            owners: HashSet::new(),
            moderator_permissions: Permissions::empty(),
            command_editable_duration: DEFAULT_EDITABLE_DURATION,
            settings: None,
            groups: Vec::new(),
            commands: Vec::new(),
            types: Vec::new(),
            inhibitors: Vec::new(),
        }
    }

    /// Sets the default prefix. An empty prefix only allows mentions.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds the given users to the bot owners, which bypass permission checks and throttling.
    pub fn owners(mut self, owners: impl IntoIterator<Item = Id<UserMarker>>) -> Self {
        self.owners.extend(owners);
        self
    }

    pub fn moderator_permissions(mut self, permissions: Permissions) -> Self {
        self.moderator_permissions = permissions;
        self
    }

    /// Sets for how long responses stay editable, zero disables re-running edited commands.
    pub fn command_editable_duration(mut self, duration: Duration) -> Self {
        self.command_editable_duration = duration;
        self
    }

    /// Sets the store consulted for guild prefixes and disabled commands.
    pub fn settings(mut self, settings: impl GuildSettings + 'static) -> Self {
        self.settings = Some(Box::new(settings));
        self
    }

    /// Registers a new group of commands.
    pub fn group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Registers a new command in the framework.
    pub fn command(mut self, command: Command<D, E>) -> Self {
        self.commands.push(command);
        self
    }

    /// Registers a custom argument type.
    pub fn argument_type(mut self, kind: impl ArgumentType<D> + 'static) -> Self {
        self.types.push(Arc::new(kind));
        self
    }

    /// Adds a hook executed before the usage checks of every command.
    pub fn inhibitor(mut self, fun: InhibitorFn<D>) -> Self {
        self.inhibitors.push(InhibitorHook(fun));
        self
    }

    /// Builds the framework, registering argument types, groups and commands in that order.
    pub fn build(mut self) -> Result<Framework<D, E>, RegistryError> {
        let mut registry = Registry::new();

        for kind in std::mem::take(&mut self.types) {
            registry.register_type(kind)?;
        }

        for group in std::mem::take(&mut self.groups) {
            registry.register_group(group)?;
        }

        for command in std::mem::take(&mut self.commands) {
            registry.register_command(command)?;
        }

        Ok(Framework::from_builder(self, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandArgs;
    use crate::context::CommandContext;
    use crate::framework::DefaultCommandResult;
    use crate::testing::{Harness, BOT};
    use crate::BoxFuture;

    fn noop<'a>(_: &'a CommandContext<'a, ()>, _: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
        Box::pin(async move { Ok(()) })
    }

    #[test]
    fn registers_everything_on_build() {
        let harness = Harness::new();
        let framework = FrameworkBuilder::<(), DefaultError>::new(harness.client.clone(), Id::new(BOT), ())
            .prefix("!")
            .owners([Id::new(1), Id::new(1)])
            .group(Group::new("util"))
            .command(Command::new(noop).name("ping").group("util", "ping"))
            .build()
            .unwrap();

        assert_eq!(framework.prefix(), Some("!"));
        assert_eq!(framework.owners().len(), 1);
        assert_eq!(framework.registry().commands().len(), 1);
        assert!(framework.registry().group("util").is_some());
    }

    #[test]
    fn duplicates_fail_the_build() {
        let harness = Harness::new();
        let result = FrameworkBuilder::<(), DefaultError>::new(harness.client.clone(), Id::new(BOT), ())
            .command(Command::new(noop).name("ping"))
            .command(Command::new(noop).name("pong").aliases(&["PING"]))
            .build();

        assert!(matches!(result, Err(RegistryError::DuplicateCommand(name)) if name == "PING"));
    }
}
