use crate::twilight_exports::{GuildMarker, Id};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Per guild configuration consulted by the framework while dispatching.
#[async_trait]
pub trait GuildSettings: Send + Sync {
    /// The prefix of the guild, `None` to use the default one. An empty prefix only allows
    /// invoking commands by mentioning the bot.
    async fn prefix(&self, guild_id: Id<GuildMarker>) -> Option<String>;

    /// Whether the command with the given name is enabled in the guild.
    async fn command_enabled(&self, guild_id: Id<GuildMarker>, command: &str) -> bool;

    /// Whether the group with the given id is enabled in the guild.
    async fn group_enabled(&self, guild_id: Id<GuildMarker>, group: &str) -> bool;
}

#[derive(Debug, Default)]
struct GuildEntry {
    prefix: Option<String>,
    disabled_commands: HashSet<String>,
    disabled_groups: HashSet<String>,
}

/// [Guild settings](GuildSettings) kept in memory.
#[derive(Debug, Default)]
pub struct MemorySettings {
    guilds: RwLock<HashMap<Id<GuildMarker>, GuildEntry>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix of the guild, `None` to go back to the default one.
    pub fn set_prefix(&self, guild_id: Id<GuildMarker>, prefix: Option<String>) {
        self.guilds.write().entry(guild_id).or_default().prefix = prefix;
    }

    pub fn set_command_enabled(&self, guild_id: Id<GuildMarker>, command: &str, enabled: bool) {
        let mut lock = self.guilds.write();
        let disabled = &mut lock.entry(guild_id).or_default().disabled_commands;

        if enabled {
            disabled.remove(command);
        } else {
            disabled.insert(command.to_string());
        }
    }

    pub fn set_group_enabled(&self, guild_id: Id<GuildMarker>, group: &str, enabled: bool) {
        let mut lock = self.guilds.write();
        let disabled = &mut lock.entry(guild_id).or_default().disabled_groups;

        if enabled {
            disabled.remove(group);
        } else {
            disabled.insert(group.to_string());
        }
    }
}

#[async_trait]
impl GuildSettings for MemorySettings {
    async fn prefix(&self, guild_id: Id<GuildMarker>) -> Option<String> {
        self.guilds.read().get(&guild_id).and_then(|entry| entry.prefix.clone())
    }

    async fn command_enabled(&self, guild_id: Id<GuildMarker>, command: &str) -> bool {
        self.guilds
            .read()
            .get(&guild_id)
            .map_or(true, |entry| !entry.disabled_commands.contains(command))
    }

    async fn group_enabled(&self, guild_id: Id<GuildMarker>, group: &str) -> bool {
        self.guilds
            .read()
            .get(&guild_id)
            .map_or(true, |entry| !entry.disabled_groups.contains(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggles_commands_and_groups() {
        let settings = MemorySettings::new();
        let guild = Id::new(1);

        assert!(settings.command_enabled(guild, "ping").await);
        settings.set_command_enabled(guild, "ping", false);
        assert!(!settings.command_enabled(guild, "ping").await);
        assert!(settings.command_enabled(Id::new(2), "ping").await);
        settings.set_command_enabled(guild, "ping", true);
        assert!(settings.command_enabled(guild, "ping").await);

        settings.set_group_enabled(guild, "fun", false);
        assert!(!settings.group_enabled(guild, "fun").await);

        assert_eq!(settings.prefix(guild).await, None);
        settings.set_prefix(guild, Some("?".into()));
        assert_eq!(settings.prefix(guild).await.as_deref(), Some("?"));
    }
}
