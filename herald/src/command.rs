use crate::argument::ArgumentInfo;
use crate::collector::ArgumentCollector;
use crate::context::CommandContext;
use crate::hook::{ErrorHandlerFn, ErrorHandlerHook};
use crate::twilight_exports::Permissions;
use crate::value::ArgumentValues;
use crate::BoxFuture;
use regex::Regex;
use std::time::Duration;

/// A pointer to a command function.
pub(crate) type CommandFn<D, E> =
    for<'a> fn(&'a CommandContext<'a, D>, CommandArgs) -> BoxFuture<'a, Result<(), E>>;

/// The arguments given to a command function.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArgs {
    /// Values obtained through the command argument schema.
    Values(ArgumentValues),
    /// The whole argument string, for commands without a schema using [ArgsKind::Single].
    Single(String),
    /// The split argument string, for commands without a schema using [ArgsKind::Multiple].
    Multiple(Vec<String>),
    /// Capture groups of the pattern that triggered the command.
    Pattern(Vec<Option<String>>),
}

impl CommandArgs {
    /// Gets the schema values, if the command has an argument schema.
    pub fn values(&self) -> Option<&ArgumentValues> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }
}

/// How the argument string is handed to commands without an argument schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgsKind {
    /// The whole string, trimmed and without wrapping quotes.
    #[default]
    Single,
    /// The string split into tokens, see [parse_args](crate::parsers::parse_args).
    Multiple {
        /// Maximum amount of tokens, `0` for no limit.
        count: usize,
    },
}

/// How often a user may use a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttling {
    /// Maximum amount of usages within the window.
    pub usages: u32,
    /// Length of the window, starting at the first usage.
    pub duration: Duration,
}

impl Throttling {
    pub fn new(usages: u32, duration: Duration) -> Self {
        Self { usages, duration }
    }
}

/// How the execution of a command ended.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionState {
    /// The command finished executing without errors.
    CommandFinished,
    /// The command returned an error or its arguments could not be obtained.
    CommandErrored,
    /// The arguments were not given properly and the user was not prompted for them.
    InvalidUsage,
}

/// A command executed by the framework.
pub struct Command<D, E> {
    /// The name of the command.
    pub name: &'static str,
    /// Alternative names of the command.
    pub aliases: Vec<&'static str>,
    /// The id of the group the command belongs to.
    pub group: Option<&'static str>,
    /// The name of the command within its group, defaults to the name.
    pub member_name: &'static str,
    /// The description of the command. Not used by the framework, kept for help listings
    /// built by consumers.
    pub description: &'static str,
    /// The accepted format of the arguments, derived from the arguments when not set.
    pub format: Option<&'static str>,
    /// Extra help text, metadata for consumers like `description`.
    pub details: Option<&'static str>,
    /// Example invocations, metadata for consumers like `description`.
    pub examples: Vec<&'static str>,
    pub guild_only: bool,
    pub dm_only: bool,
    pub owner_only: bool,
    pub guild_owner_only: bool,
    pub moderator_only: bool,
    pub nsfw: bool,
    /// Whether the command can be used as a slash command.
    pub interactions: bool,
    /// Permissions the invoker needs in guilds.
    pub user_permissions: Option<Permissions>,
    /// Permissions the bot needs in guilds.
    pub client_permissions: Option<Permissions>,
    pub throttling: Option<Throttling>,
    /// Whether the dispatcher invokes this command by name and alias.
    pub default_handling: bool,
    /// Arguments declared by the command, resolved into the collector on registration.
    pub arguments: Vec<ArgumentInfo<D>>,
    /// The collector of the argument schema, present once registered with arguments.
    pub collector: Option<ArgumentCollector<D>>,
    pub args_kind: ArgsKind,
    /// Whether single quotes group tokens when splitting the argument string.
    pub args_single_quotes: bool,
    /// Maximum amount of prompts per argument, `None` for no limit.
    pub args_prompt_limit: Option<usize>,
    /// Patterns triggering the command regardless of prefix.
    pub patterns: Vec<Regex>,
    /// Whether the command can't be disabled.
    pub guarded: bool,
    /// Whether help listings built by consumers should leave the command out.
    pub hidden: bool,
    /// Whether the command runs when no other command matches.
    pub unknown: bool,
    pub deprecated: bool,
    /// The name of the command replacing this one.
    pub replaced_by: Option<&'static str>,
    /// Whether a generic message is replied when the command fails unexpectedly.
    pub reply_on_error: bool,
    /// A pointer to this command function.
    pub fun: CommandFn<D, E>,
    pub error_handler: Option<ErrorHandlerHook<D, E>>,
}

impl<D, E> Command<D, E> {
    /// Creates a new command.
    pub fn new(fun: CommandFn<D, E>) -> Self {
        Self {
            name: Default::default(),
            aliases: Default::default(),
            group: None,
            member_name: Default::default(),
            description: Default::default(),
            format: None,
            details: None,
            examples: Default::default(),
            guild_only: false,
            dm_only: false,
            owner_only: false,
            guild_owner_only: false,
            moderator_only: false,
            nsfw: false,
            interactions: true,
            user_permissions: None,
            client_permissions: None,
            throttling: None,
            default_handling: true,
            arguments: Default::default(),
            collector: None,
            args_kind: ArgsKind::default(),
            args_single_quotes: true,
            args_prompt_limit: None,
            patterns: Default::default(),
            guarded: false,
            hidden: false,
            unknown: false,
            deprecated: false,
            replaced_by: None,
            reply_on_error: false,
            fun,
            error_handler: None,
        }
    }

    /// Sets the command name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn aliases(mut self, aliases: &[&'static str]) -> Self {
        self.aliases.extend_from_slice(aliases);
        self
    }

    /// Sets the group of the command and its name within it.
    pub fn group(mut self, group: &'static str, member_name: &'static str) -> Self {
        self.group = Some(group);
        self.member_name = member_name;
        self
    }

    /// Sets the command description.
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    pub fn details(mut self, details: &'static str) -> Self {
        self.details = Some(details);
        self
    }

    pub fn examples(mut self, examples: &[&'static str]) -> Self {
        self.examples.extend_from_slice(examples);
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn dm_only(mut self) -> Self {
        self.dm_only = true;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn guild_owner_only(mut self) -> Self {
        self.guild_owner_only = true;
        self
    }

    pub fn moderator_only(mut self) -> Self {
        self.moderator_only = true;
        self
    }

    pub fn nsfw(mut self) -> Self {
        self.nsfw = true;
        self
    }

    /// Sets whether the command can be used as a slash command.
    pub fn interactions(mut self, enabled: bool) -> Self {
        self.interactions = enabled;
        self
    }

    pub fn user_permissions(mut self, permissions: Permissions) -> Self {
        self.user_permissions = Some(permissions);
        self
    }

    pub fn client_permissions(mut self, permissions: Permissions) -> Self {
        self.client_permissions = Some(permissions);
        self
    }

    pub fn throttling(mut self, usages: u32, duration: Duration) -> Self {
        self.throttling = Some(Throttling::new(usages, duration));
        self
    }

    /// Sets whether the command is invoked by name and alias, pattern triggers are not affected.
    pub fn default_handling(mut self, enabled: bool) -> Self {
        self.default_handling = enabled;
        self
    }

    /// Adds an argument to the command.
    pub fn add_argument(mut self, arg: ArgumentInfo<D>) -> Self {
        self.arguments.push(arg);
        self
    }

    /// Sets how the argument string is handed to the command when it has no arguments.
    pub fn args_kind(mut self, kind: ArgsKind) -> Self {
        self.args_kind = kind;
        self
    }

    pub fn args_single_quotes(mut self, enabled: bool) -> Self {
        self.args_single_quotes = enabled;
        self
    }

    pub fn args_prompt_limit(mut self, limit: usize) -> Self {
        self.args_prompt_limit = Some(limit);
        self
    }

    /// Adds a pattern triggering the command.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks the command as the one to run when no other command matches.
    pub fn unknown(mut self) -> Self {
        self.unknown = true;
        self.hidden = true;
        self
    }

    /// Marks the command as deprecated, optionally naming its replacement.
    pub fn deprecated(mut self, replaced_by: Option<&'static str>) -> Self {
        self.deprecated = true;
        self.replaced_by = replaced_by;
        self
    }

    pub fn reply_on_error(mut self, enabled: bool) -> Self {
        self.reply_on_error = enabled;
        self
    }

    pub fn error_handler(mut self, fun: ErrorHandlerFn<D, E>) -> Self {
        self.error_handler = Some(ErrorHandlerHook(fun));
        self
    }

    /// The name of the command prefixed by its group, as in `group:member`.
    pub fn qualified_name(&self) -> Option<String> {
        self.group.map(|group| format!("{group}:{}", self.member_name))
    }

    /// Whether the given name equals the `group:member` name of this command.
    pub fn is_qualified_name(&self, name: &str) -> bool {
        self.qualified_name()
            .map_or(false, |qualified| qualified.eq_ignore_ascii_case(name))
    }

    /// Whether the given name is the name or an alias of this command.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    /// The accepted format of the arguments.
    pub fn arguments_format(&self) -> String {
        if let Some(format) = self.format {
            return format.to_string();
        }

        let Some(collector) = &self.collector else {
            return String::new();
        };

        collector
            .arguments
            .iter()
            .map(|arg| {
                let (left, right) = if arg.required() { ('<', '>') } else { ('[', ']') };
                let dots = if arg.infinite { "..." } else { "" };
                format!("{left}{}{dots}{right}", arg.label)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the usage string of the command, as in `` `!name <argument>` ``.
    pub fn usage(&self, prefix: Option<&str>) -> String {
        let format = self.arguments_format();
        let command = if format.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {format}", self.name)
        };

        match prefix {
            Some(prefix) if prefix.chars().count() > 1 && !prefix.ends_with(' ') => {
                format!("`{prefix} {command}`")
            }
            Some(prefix) => format!("`{prefix}{command}`"),
            None => format!("`{command}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::DefaultCommandResult;
    use crate::testing::Harness;

    fn noop<'a>(_: &'a CommandContext<'a, ()>, _: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
        Box::pin(async move { Ok(()) })
    }

    #[test]
    fn usage_is_derived_from_arguments() {
        let harness = Harness::new();
        let mut command = Command::new(noop)
            .name("give")
            .add_argument(ArgumentInfo::new("user", "Who?").kind("user"))
            .add_argument(ArgumentInfo::new("items", "What?").label("item").kind("string").infinite(true).default("nothing"));

        let infos = std::mem::take(&mut command.arguments);
        command.collector = Some(ArgumentCollector::from_infos(infos, &harness.types(), None).unwrap());

        assert_eq!(command.arguments_format(), "<user> [item...]");
        assert_eq!(command.usage(Some("!")), "`!give <user> [item...]`");
        assert_eq!(command.usage(Some("bot")), "`bot give <user> [item...]`");
        assert_eq!(command.usage(None), "`give <user> [item...]`");
    }

    #[test]
    fn names_and_aliases() {
        let command = Command::<(), _>::new(noop).name("echo").aliases(&["say"]).group("util", "echo");

        assert!(command.is_named("ECHO"));
        assert!(command.is_named("say"));
        assert!(!command.is_named("ech"));
        assert_eq!(command.qualified_name().as_deref(), Some("util:echo"));
        assert_eq!(Command::<(), _>::new(noop).name("x").format("<text>").usage(Some("!")), "`!x <text>`");
    }

    #[test]
    fn help_metadata_is_kept_for_consumers() {
        let command = Command::<(), _>::new(noop)
            .name("echo")
            .description("Repeats text")
            .details("Quotes keep spaces.")
            .examples(&["echo hi", "echo \"hello there\""]);

        assert_eq!(command.description, "Repeats text");
        assert_eq!(command.details, Some("Quotes keep spaces."));
        assert_eq!(command.examples.len(), 2);
        assert!(!command.hidden);
        assert!(Command::<(), _>::new(noop).name("huh").unknown().hidden);
    }
}
