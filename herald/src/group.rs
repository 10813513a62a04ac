/// A group of commands, used to categorize them and to enable or disable them together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The id of the group, used to reference it from commands.
    pub id: &'static str,
    /// The name of the group shown to users.
    pub name: &'static str,
    /// The description of this group.
    pub description: &'static str,
    /// Whether the group can't be disabled.
    pub guarded: bool,
}

impl Group {
    /// Creates a new group, using the id as its name.
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            name: id,
            description: Default::default(),
            guarded: false,
        }
    }

    /// Sets the name of this group.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the description of this group.
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    /// Whether the group id or name equals the search, ignoring case.
    pub(crate) fn matches_exact(&self, search: &str) -> bool {
        self.id.eq_ignore_ascii_case(search) || self.name.eq_ignore_ascii_case(search)
    }

    pub(crate) fn matches(&self, search: &str) -> bool {
        let search = search.to_lowercase();
        self.id.to_lowercase().contains(&search) || self.name.to_lowercase().contains(&search)
    }
}
