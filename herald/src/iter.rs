use crate::twilight_exports::{CommandDataOption, CommandOptionValue};

/// An iterator used to walk through slash command options, descending into the options of the
/// invoked subcommand or subcommand group.
pub struct OptionIterator<'a> {
    src: Vec<&'a CommandDataOption>,
}

impl<'a> OptionIterator<'a> {
    /// Creates a new [iterator](self::OptionIterator) at the given source.
    pub fn new(options: &'a [CommandDataOption]) -> Self {
        Self {
            src: Self::get_data(options),
        }
    }

    /// Gets and removes the first option which satisfies the given predicate.
    pub fn get<F>(&mut self, predicate: F) -> Option<&'a CommandDataOption>
    where
        F: Fn(&CommandDataOption) -> bool,
    {
        let index = self.src.iter().position(|option| predicate(option))?;
        Some(self.src.remove(index))
    }

    /// Consumes the iterator, returning every remaining option as a name and raw value pair.
    pub fn raw_values(self) -> Vec<(String, String)> {
        self.src
            .into_iter()
            .filter_map(|option| Some((option.name.clone(), raw_value(&option.value)?)))
            .collect()
    }

    fn get_data(options: &'a [CommandDataOption]) -> Vec<&'a CommandDataOption> {
        let nested = options.iter().find_map(|item| match &item.value {
            CommandOptionValue::SubCommandGroup(inner) | CommandOptionValue::SubCommand(inner) => Some(inner),
            _ => None,
        });

        match nested {
            Some(inner) => Self::get_data(inner),
            None => options.iter().collect(),
        }
    }
}

impl<'a> Iterator for OptionIterator<'a> {
    type Item = &'a CommandDataOption;

    fn next(&mut self) -> Option<Self::Item> {
        if self.src.is_empty() {
            None
        } else {
            Some(self.src.remove(0))
        }
    }
}

/// Renders an option value the way a user would type it, so argument types can validate slash
/// command options exactly like message arguments.
pub fn raw_value(value: &CommandOptionValue) -> Option<String> {
    let raw = match value {
        CommandOptionValue::String(s) => s.clone(),
        CommandOptionValue::Integer(i) => i.to_string(),
        CommandOptionValue::Number(n) => n.to_string(),
        CommandOptionValue::Boolean(b) => b.to_string(),
        CommandOptionValue::User(id) => id.to_string(),
        CommandOptionValue::Channel(id) => id.to_string(),
        CommandOptionValue::Role(id) => id.to_string(),
        CommandOptionValue::Mentionable(id) => id.to_string(),
        CommandOptionValue::Attachment(id) => id.to_string(),
        CommandOptionValue::Focused(input, _) => input.clone(),
        CommandOptionValue::SubCommand(_) | CommandOptionValue::SubCommandGroup(_) => return None,
    };

    Some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twilight_exports::Id;

    fn option(name: &str, value: CommandOptionValue) -> CommandDataOption {
        CommandDataOption {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn flattens_subcommands() {
        let options = vec![option(
            "add",
            CommandOptionValue::SubCommand(vec![
                option("amount", CommandOptionValue::Integer(3)),
                option("target", CommandOptionValue::User(Id::new(42))),
            ]),
        )];

        let values = OptionIterator::new(&options).raw_values();
        assert_eq!(
            values,
            vec![
                ("amount".to_string(), "3".to_string()),
                ("target".to_string(), "42".to_string())
            ]
        );
    }

    #[test]
    fn get_removes_matching_option() {
        let options = vec![
            option("first", CommandOptionValue::Boolean(true)),
            option("second", CommandOptionValue::String("hi".into())),
        ];

        let mut iter = OptionIterator::new(&options);
        assert_eq!(iter.get(|o| o.name == "second").map(|o| o.name.as_str()), Some("second"));
        assert!(iter.get(|o| o.name == "second").is_none());
        assert_eq!(iter.next().map(|o| o.name.as_str()), Some("first"));
        assert!(iter.next().is_none());
    }
}
