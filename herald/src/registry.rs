use crate::collector::ArgumentCollector;
use crate::command::Command;
use crate::error::RegistryError;
use crate::group::Group;
use crate::parse_impl::default_types;
use crate::types::{ArgumentType, UnionType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Argument types keyed by id.
pub struct TypeRegistry<D> {
    types: HashMap<String, Arc<dyn ArgumentType<D>>>,
}

impl<D> Default for TypeRegistry<D> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
        }
    }
}

impl<D: Send + Sync + 'static> TypeRegistry<D> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for kind in default_types() {
            registry.types.insert(kind.id().to_string(), kind);
        }

        registry
    }

    /// Registers a type, failing if its id is already taken.
    pub fn register(&mut self, kind: Arc<dyn ArgumentType<D>>) -> Result<(), RegistryError> {
        let id = kind.id().to_string();

        if id.contains('|') || self.types.contains_key(&id) {
            return Err(RegistryError::DuplicateType(id));
        }

        debug!("Registered argument type [{}]", id);
        self.types.insert(id, kind);
        Ok(())
    }

    /// Gets the type with the given id. Ids made of several ids joined by `|` give a
    /// [union](UnionType) of those types.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ArgumentType<D>>> {
        if !id.contains('|') {
            return self.types.get(id).cloned();
        }

        let types = id
            .split('|')
            .map(|part| self.types.get(part.trim()).cloned())
            .collect::<Option<Vec<_>>>()?;

        Some(Arc::new(UnionType::new(id, types)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// Every command, group and argument type known by the framework.
pub struct Registry<D, E> {
    pub types: TypeRegistry<D>,
    commands: Vec<Arc<Command<D, E>>>,
    groups: Vec<Group>,
}

impl<D: Send + Sync + 'static, E> Registry<D, E> {
    /// Creates a registry holding the built-in argument types.
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::with_defaults(),
            commands: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn register_type(&mut self, kind: Arc<dyn ArgumentType<D>>) -> Result<(), RegistryError> {
        self.types.register(kind)
    }

    pub fn register_group(&mut self, group: Group) -> Result<(), RegistryError> {
        if self.groups.iter().any(|g| g.id.eq_ignore_ascii_case(group.id)) {
            return Err(RegistryError::DuplicateGroup(group.id.to_string()));
        }

        debug!("Registered group [{}]", group.id);
        self.groups.push(group);
        Ok(())
    }

    /// Registers a command, resolving its arguments against the registered types.
    pub fn register_command(&mut self, mut command: Command<D, E>) -> Result<Arc<Command<D, E>>, RegistryError> {
        if let Some(group) = command.group {
            if self.group(group).is_none() {
                return Err(RegistryError::UnknownGroup {
                    command: command.name.to_string(),
                    group: group.to_string(),
                });
            }
        }

        for name in std::iter::once(&command.name).chain(&command.aliases) {
            if self.commands.iter().any(|c| c.is_named(name)) {
                return Err(RegistryError::DuplicateCommand(name.to_string()));
            }
        }

        if command.unknown {
            if let Some(existing) = self.unknown_command() {
                return Err(RegistryError::DuplicateUnknownCommand(existing.name.to_string()));
            }
        }

        if command.member_name.is_empty() {
            command.member_name = command.name;
        }

        if !command.arguments.is_empty() {
            let infos = std::mem::take(&mut command.arguments);
            let collector = ArgumentCollector::from_infos(infos, &self.types, command.args_prompt_limit)
                .map_err(|source| RegistryError::Arguments {
                    command: command.name.to_string(),
                    source,
                })?;
            command.collector = Some(collector);
        }

        debug!("Registered command [{}]", command.name);
        let command = Arc::new(command);
        self.commands.push(Arc::clone(&command));
        Ok(command)
    }

    /// Removes the command with the given name.
    pub fn unregister_command(&mut self, name: &str) -> Option<Arc<Command<D, E>>> {
        let position = self.commands.iter().position(|c| c.name.eq_ignore_ascii_case(name))?;
        Some(self.commands.remove(position))
    }
}

impl<D, E> Registry<D, E> {
    pub fn commands(&self) -> &[Arc<Command<D, E>>] {
        &self.commands
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id.eq_ignore_ascii_case(id))
    }

    /// The command to run when no other command matches, if any.
    pub fn unknown_command(&self) -> Option<Arc<Command<D, E>>> {
        self.commands.iter().find(|c| c.unknown).cloned()
    }

    /// Finds commands by name, alias or `group:member`.
    ///
    /// Inexact searches match names and aliases containing the search, unless one of them equals
    /// it, in which case only that command is returned.
    pub fn find_commands(&self, search: &str, exact: bool) -> Vec<Arc<Command<D, E>>> {
        let search = search.to_lowercase();

        if exact {
            return self
                .commands
                .iter()
                .filter(|c| c.is_named(&search) || c.is_qualified_name(&search))
                .cloned()
                .collect();
        }

        let matched = self
            .commands
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&search)
                    || c.aliases.iter().any(|alias| alias.to_lowercase().contains(&search))
                    || c.is_qualified_name(&search)
            })
            .cloned()
            .collect::<Vec<_>>();

        match matched.iter().find(|c| c.is_named(&search)) {
            Some(command) => vec![Arc::clone(command)],
            None => matched,
        }
    }

    /// Finds groups by id or name, preferring an exact match over partial ones.
    pub fn find_groups(&self, search: &str, exact: bool) -> Vec<&Group> {
        if exact {
            return self.groups.iter().filter(|g| g.matches_exact(search)).collect();
        }

        let matched = self.groups.iter().filter(|g| g.matches(search)).collect::<Vec<_>>();

        match matched.iter().find(|g| g.matches_exact(search)) {
            Some(group) => vec![*group],
            None => matched,
        }
    }

    /// Finds the first command with a pattern matching the content, returning its captures.
    pub fn match_pattern(&self, content: &str) -> Option<(Arc<Command<D, E>>, Vec<Option<String>>)> {
        self.commands.iter().find_map(|command| {
            let captures = command.patterns.iter().find_map(|pattern| pattern.captures(content))?;
            let groups = captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect();

            Some((Arc::clone(command), groups))
        })
    }
}

impl<D: Send + Sync + 'static, E> Default for Registry<D, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentInfo;
    use crate::command::CommandArgs;
    use crate::context::CommandContext;
    use crate::error::ArgumentError;
    use crate::framework::DefaultCommandResult;
    use crate::BoxFuture;
    use regex::Regex;

    fn noop<'a>(_: &'a CommandContext<'a, ()>, _: CommandArgs) -> BoxFuture<'a, DefaultCommandResult> {
        Box::pin(async move { Ok(()) })
    }

    fn registry() -> Registry<(), crate::framework::DefaultError> {
        let mut registry = Registry::new();
        registry.register_group(Group::new("util").name("Utility")).unwrap();
        registry
            .register_command(Command::new(noop).name("echo").aliases(&["say"]).group("util", "echo"))
            .unwrap();
        registry
            .register_command(Command::new(noop).name("echoall").group("util", "echoall"))
            .unwrap();
        registry.register_command(Command::new(noop).name("ping")).unwrap();
        registry
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut registry = registry();

        assert!(matches!(
            registry.register_command(Command::new(noop).name("SAY")),
            Err(RegistryError::DuplicateCommand(name)) if name == "SAY"
        ));
        assert!(matches!(
            registry.register_command(Command::new(noop).name("pong").aliases(&["ping"])),
            Err(RegistryError::DuplicateCommand(_))
        ));
        assert!(matches!(
            registry.register_group(Group::new("UTIL")),
            Err(RegistryError::DuplicateGroup(_))
        ));
        assert!(matches!(
            registry.register_command(Command::new(noop).name("x").group("nope", "x")),
            Err(RegistryError::UnknownGroup { .. })
        ));

        registry.register_command(Command::new(noop).name("huh").unknown()).unwrap();
        assert!(matches!(
            registry.register_command(Command::new(noop).name("what").unknown()),
            Err(RegistryError::DuplicateUnknownCommand(name)) if name == "huh"
        ));
    }

    #[test]
    fn invalid_arguments_fail_registration() {
        let mut registry = registry();
        let result = registry.register_command(
            Command::new(noop)
                .name("bad")
                .add_argument(ArgumentInfo::new("a", "A?").kind("nonexistent")),
        );

        match result {
            Err(RegistryError::Arguments { command, source }) => {
                assert_eq!(command, "bad");
                assert!(matches!(source, ArgumentError::UnknownType { .. }));
            }
            _ => panic!("expected an argument error"),
        }
    }

    #[test]
    fn exact_name_wins_over_partial_matches() {
        let registry = registry();

        let found = registry.find_commands("echo", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "echo");

        let found = registry.find_commands("ech", false);
        assert_eq!(found.len(), 2);

        let found = registry.find_commands("util:echoall", true);
        assert_eq!(found[0].name, "echoall");
        assert_eq!(registry.find_commands("say", true)[0].name, "echo");
        assert!(registry.find_commands("ech", true).is_empty());

        assert_eq!(registry.find_groups("utility", false).len(), 1);
        assert_eq!(registry.find_groups("UTIL", true)[0].id, "util");
    }

    #[test]
    fn union_ids_require_every_member() {
        let types = TypeRegistry::<()>::with_defaults();

        assert!(types.contains("integer|string"));
        assert!(!types.contains("integer|nope"));
        assert_eq!(types.get("integer|string").map(|t| t.id().to_string()).as_deref(), Some("integer|string"));
    }

    #[test]
    fn patterns_give_captures() {
        let mut registry = registry();
        registry
            .register_command(
                Command::new(noop)
                    .name("roll")
                    .pattern(Regex::new(r"^roll (\d+)d(\d+)?").unwrap()),
            )
            .unwrap();

        let (command, captures) = registry.match_pattern("roll 2d").unwrap();
        assert_eq!(command.name, "roll");
        assert_eq!(captures, vec![Some("2".to_string()), None]);
        assert!(registry.match_pattern("hello").is_none());
    }
}
