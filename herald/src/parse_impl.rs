use crate::argument::Argument;
use crate::client::UserInfo;
use crate::context::CommandContext;
use crate::twilight_exports::{ChannelMarker, Id, RoleMarker};
use crate::types::{ArgumentType, Validation};
use crate::value::ArgumentValue;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "enable", "enabled", "1", "+"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "disable", "disabled", "0", "-"];

/// Every built-in argument type.
pub(crate) fn default_types<D: Send + Sync>() -> Vec<Arc<dyn ArgumentType<D>>> {
    let types: [Arc<dyn ArgumentType<D>>; 7] = [
        Arc::new(StringType),
        Arc::new(IntegerType),
        Arc::new(FloatType),
        Arc::new(BooleanType),
        Arc::new(UserType::default()),
        Arc::new(ChannelType),
        Arc::new(RoleType),
    ];

    types.into()
}

fn check_choices<D>(value: &str, argument: &Argument<D>) -> Option<Validation> {
    let choices = argument.one_of.as_ref()?;

    if choices.iter().any(|choice| choice == &value.to_lowercase()) {
        None
    } else {
        Some(Validation::Rejected(format!(
            "Please enter one of the following options: {}",
            choices.join(" | ")
        )))
    }
}

fn check_range<D>(number: f64, argument: &Argument<D>) -> Validation {
    match (argument.min, argument.max) {
        (Some(min), _) if number < min => {
            Validation::Rejected(format!("Please enter a number above or exactly {min}."))
        }
        (_, Some(max)) if number > max => {
            Validation::Rejected(format!("Please enter a number below or exactly {max}."))
        }
        _ => Validation::Valid,
    }
}

/// Extracts the id out of a mention using one of the given prefixes, or out of a bare id.
fn mention_id<T>(value: &str, prefixes: &[&str]) -> Option<Id<T>> {
    let inner = prefixes
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix)?.strip_suffix('>'))
        .unwrap_or(value);

    Id::new_checked(inner.parse().ok()?)
}

struct StringType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for StringType {
    fn id(&self) -> &str {
        "string"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, argument: &Argument<D>) -> Validation {
        if let Some(rejection) = check_choices(value, argument) {
            return rejection;
        }

        let length = value.chars().count() as f64;
        match (argument.min, argument.max) {
            (Some(min), _) if length < min => Validation::Rejected(format!(
                "Please keep the {} above or exactly {min} characters.",
                argument.label
            )),
            (_, Some(max)) if length > max => Validation::Rejected(format!(
                "Please keep the {} below or exactly {max} characters.",
                argument.label
            )),
            _ => Validation::Valid,
        }
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        ArgumentValue::String(value.to_string())
    }
}

struct IntegerType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for IntegerType {
    fn id(&self) -> &str {
        "integer"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, argument: &Argument<D>) -> Validation {
        let Ok(number) = value.parse::<i64>() else {
            return Validation::Invalid;
        };

        check_choices(value, argument).unwrap_or_else(|| check_range(number as f64, argument))
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        ArgumentValue::Integer(value.parse().unwrap_or_default())
    }
}

struct FloatType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for FloatType {
    fn id(&self) -> &str {
        "float"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, argument: &Argument<D>) -> Validation {
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => {
                check_choices(value, argument).unwrap_or_else(|| check_range(number, argument))
            }
            _ => Validation::Invalid,
        }
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        ArgumentValue::Float(value.parse().unwrap_or_default())
    }
}

struct BooleanType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for BooleanType {
    fn id(&self) -> &str {
        "boolean"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> Validation {
        let value = value.to_lowercase();
        Validation::from(TRUTHY.contains(&value.as_str()) || FALSY.contains(&value.as_str()))
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        ArgumentValue::Boolean(TRUTHY.contains(&value.to_lowercase().as_str()))
    }
}

/// Looks users up through the chat client, keeping the fetched user between validation and
/// parsing.
#[derive(Default)]
struct UserType {
    fetched: Mutex<HashMap<String, UserInfo>>,
}

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for UserType {
    fn id(&self) -> &str {
        "user"
    }

    async fn validate(&self, value: &str, ctx: &CommandContext<'_, D>, _: &Argument<D>) -> Validation {
        let Some(id) = mention_id(value, &["<@!", "<@"]) else {
            return Validation::Invalid;
        };

        match ctx.client.user(id).await {
            Ok(Some(user)) => {
                self.fetched.lock().insert(value.to_string(), user);
                Validation::Valid
            }
            Ok(None) => Validation::Invalid,
            Err(why) => {
                warn!("Failed to look up user {}: {}", id, why);
                Validation::Invalid
            }
        }
    }

    async fn parse(&self, value: &str, ctx: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        let cached = self.fetched.lock().remove(value);
        if let Some(user) = cached {
            return ArgumentValue::User(user);
        }

        let Some(id) = mention_id(value, &["<@!", "<@"]) else {
            return ArgumentValue::String(value.to_string());
        };

        match ctx.client.user(id).await {
            Ok(Some(user)) => ArgumentValue::User(user),
            _ => ArgumentValue::User(UserInfo {
                id,
                name: String::new(),
                bot: false,
            }),
        }
    }
}

struct ChannelType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for ChannelType {
    fn id(&self) -> &str {
        "channel"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> Validation {
        Validation::from(mention_id::<ChannelMarker>(value, &["<#"]).is_some())
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        match mention_id(value, &["<#"]) {
            Some(id) => ArgumentValue::Channel(id),
            None => ArgumentValue::String(value.to_string()),
        }
    }
}

struct RoleType;

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for RoleType {
    fn id(&self) -> &str {
        "role"
    }

    async fn validate(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> Validation {
        Validation::from(mention_id::<RoleMarker>(value, &["<@&"]).is_some())
    }

    async fn parse(&self, value: &str, _: &CommandContext<'_, D>, _: &Argument<D>) -> ArgumentValue {
        match mention_id(value, &["<@&"]) {
            Some(id) => ArgumentValue::Role(id),
            None => ArgumentValue::String(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{ArgumentInfo, RawInput};
    use crate::testing::Harness;
    use crate::twilight_exports::UserMarker;
    use std::sync::atomic::Ordering;

    fn argument(harness: &Harness, info: ArgumentInfo<()>) -> Argument<()> {
        Argument::new(info, &harness.types()).unwrap()
    }

    #[test]
    fn mentions_are_parsed() {
        assert_eq!(mention_id::<UserMarker>("<@12>", &["<@!", "<@"]), Some(Id::new(12)));
        assert_eq!(mention_id::<UserMarker>("<@!12>", &["<@!", "<@"]), Some(Id::new(12)));
        assert_eq!(mention_id::<UserMarker>("12", &["<@!", "<@"]), Some(Id::new(12)));
        assert_eq!(mention_id::<UserMarker>("<@&12>", &["<@!", "<@"]), None);
        assert_eq!(mention_id::<UserMarker>("0", &["<@!", "<@"]), None);
        assert_eq!(mention_id::<ChannelMarker>("<#5>", &["<#"]), Some(Id::new(5)));
        assert_eq!(mention_id::<RoleMarker>("<@&7>", &["<@&"]), Some(Id::new(7)));
    }

    #[tokio::test]
    async fn integers_are_strict() {
        let harness = Harness::new();
        let ctx = harness.context("!n");
        let arg = argument(&harness, ArgumentInfo::new("n", "N?").kind("integer").min(1.0).max(10.0));

        assert!(arg.validate("5", &ctx).await.is_valid());
        assert_eq!(arg.validate("5.5", &ctx).await, Validation::Invalid);
        assert_eq!(arg.validate("abc", &ctx).await, Validation::Invalid);
        assert_eq!(
            arg.validate("0", &ctx).await,
            Validation::Rejected("Please enter a number above or exactly 1.".into())
        );
        assert_eq!(
            arg.validate("11", &ctx).await,
            Validation::Rejected("Please enter a number below or exactly 10.".into())
        );
        assert_eq!(arg.parse("-3", &ctx).await, ArgumentValue::Integer(-3));
    }

    #[tokio::test]
    async fn floats_reject_non_finite_values() {
        let harness = Harness::new();
        let ctx = harness.context("!f");
        let arg = argument(&harness, ArgumentInfo::new("f", "F?").kind("float"));

        assert!(arg.validate("2.5", &ctx).await.is_valid());
        assert!(!arg.validate("inf", &ctx).await.is_valid());
        assert!(!arg.validate("NaN", &ctx).await.is_valid());
        assert_eq!(arg.parse("2.5", &ctx).await, ArgumentValue::Float(2.5));
    }

    #[tokio::test]
    async fn booleans_accept_known_words() {
        let harness = Harness::new();
        let ctx = harness.context("!b");
        let arg = argument(&harness, ArgumentInfo::new("b", "B?").kind("boolean"));

        for value in ["yes", "ON", "enabled", "+", "1"] {
            assert!(arg.validate(value, &ctx).await.is_valid());
            assert_eq!(arg.parse(value, &ctx).await, ArgumentValue::Boolean(true));
        }

        for value in ["No", "off", "-", "0"] {
            assert_eq!(arg.parse(value, &ctx).await, ArgumentValue::Boolean(false));
        }

        assert!(!arg.validate("maybe", &ctx).await.is_valid());
    }

    #[tokio::test]
    async fn strings_check_length_and_choices() {
        let harness = Harness::new();
        let ctx = harness.context("!s");
        let arg = argument(&harness, ArgumentInfo::new("name", "Name?").kind("string").min(2.0).max(4.0));

        assert!(arg.validate("abc", &ctx).await.is_valid());
        assert_eq!(
            arg.validate("a", &ctx).await,
            Validation::Rejected("Please keep the name above or exactly 2 characters.".into())
        );
        assert!(!arg.validate("abcde", &ctx).await.is_valid());

        let choice = argument(&harness, ArgumentInfo::new("c", "C?").kind("string").one_of(["Red", "Blue"]));
        assert!(choice.validate("blue", &ctx).await.is_valid());
        assert_eq!(
            choice.validate("green", &ctx).await,
            Validation::Rejected("Please enter one of the following options: red | blue".into())
        );
    }

    #[tokio::test]
    async fn users_are_fetched_once() {
        let harness = Harness::new();
        let ctx = harness.context("!u");
        let arg = argument(&harness, ArgumentInfo::new("u", "U?").kind("user"));
        harness.client.missing_users.lock().insert(Id::new(99));

        assert!(arg.validate("<@!42>", &ctx).await.is_valid());
        let value = arg.parse("<@!42>", &ctx).await;
        assert_eq!(value.get::<Id<UserMarker>>(), Some(Id::new(42)));
        assert_eq!(harness.client.user_lookups.load(Ordering::SeqCst), 1);

        assert!(!arg.validate("<@99>", &ctx).await.is_valid());
        assert!(!arg.validate("someone", &ctx).await.is_valid());
    }

    #[tokio::test]
    async fn union_tries_members_in_order() {
        let harness = Harness::new();
        let ctx = harness.context("!x");
        let arg = argument(&harness, ArgumentInfo::new("x", "X?").kind("integer|string"));

        assert_eq!(arg.parse("12", &ctx).await, ArgumentValue::Integer(12));
        assert_eq!(arg.parse("twelve", &ctx).await, ArgumentValue::String("twelve".into()));

        let strict = argument(&harness, ArgumentInfo::new("y", "Y?").kind("integer|boolean").max(5.0));
        assert_eq!(
            strict.validate("9", &ctx).await,
            Validation::Rejected("Please enter a number below or exactly 5.".into())
        );
        assert_eq!(strict.validate("what", &ctx).await, Validation::Invalid);
        assert!(strict.is_empty(&RawInput::Single(Some("")), &ctx));
        assert!(!strict.is_empty(&RawInput::Single(Some("0")), &ctx));
    }

    #[tokio::test]
    async fn channels_and_roles() {
        let harness = Harness::new();
        let ctx = harness.context("!c");
        let channel = argument(&harness, ArgumentInfo::new("c", "C?").kind("channel"));
        let role = argument(&harness, ArgumentInfo::new("r", "R?").kind("role"));

        assert_eq!(channel.parse("<#5>", &ctx).await, ArgumentValue::Channel(Id::new(5)));
        assert!(!channel.validate("<@5>", &ctx).await.is_valid());
        assert_eq!(role.parse("<@&6>", &ctx).await, ArgumentValue::Role(Id::new(6)));
        assert!(!role.validate("<#6>", &ctx).await.is_valid());
    }
}
