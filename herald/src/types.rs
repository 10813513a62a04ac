use crate::argument::{Argument, RawInput};
use crate::context::CommandContext;
use crate::value::ArgumentValue;
use async_trait::async_trait;
use std::sync::Arc;

/// The outcome of validating a raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The value is accepted and can be parsed.
    Valid,
    /// The value is rejected, the user is shown a generic message built from the argument label.
    Invalid,
    /// The value is rejected, the user is shown the given message.
    Rejected(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for Validation {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

/// The core trait of the argument engine, it describes how a raw value is validated and parsed
/// into an [argument value](ArgumentValue).
///
/// Types are registered once in the [registry](crate::registry::Registry) and shared by every
/// argument bound to them.
#[async_trait]
pub trait ArgumentType<D>: Send + Sync {
    /// The id of the type, unique across the registry.
    fn id(&self) -> &str;

    /// Validates the raw value.
    async fn validate(&self, value: &str, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> Validation;

    /// Parses the raw value. Only called after [validate](Self::validate) returned
    /// [valid](Validation::Valid) for the same value.
    async fn parse(&self, value: &str, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> ArgumentValue;

    /// Whether the raw input counts as not provided.
    fn is_empty(&self, value: &RawInput<'_>, _ctx: &CommandContext<'_, D>, _argument: &Argument<D>) -> bool {
        value.is_blank()
    }
}

/// A type made out of several types, tried in the declared order.
///
/// Created by the registry when an argument uses an id like `integer|string`.
pub struct UnionType<D> {
    id: String,
    types: Vec<Arc<dyn ArgumentType<D>>>,
}

impl<D: Send + Sync> UnionType<D> {
    pub fn new(id: impl Into<String>, types: Vec<Arc<dyn ArgumentType<D>>>) -> Self {
        Self { id: id.into(), types }
    }
}

#[async_trait]
impl<D: Send + Sync> ArgumentType<D> for UnionType<D> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn validate(&self, value: &str, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> Validation {
        let single = RawInput::Single(Some(value));
        let mut errors = Vec::new();

        for kind in &self.types {
            if kind.is_empty(&single, ctx, argument) {
                continue;
            }

            match kind.validate(value, ctx, argument).await {
                Validation::Valid => return Validation::Valid,
                Validation::Rejected(why) => errors.push(why),
                Validation::Invalid => (),
            }
        }

        if errors.is_empty() {
            Validation::Invalid
        } else {
            Validation::Rejected(errors.join("\n"))
        }
    }

    async fn parse(&self, value: &str, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> ArgumentValue {
        for kind in &self.types {
            if kind.validate(value, ctx, argument).await.is_valid() {
                return kind.parse(value, ctx, argument).await;
            }
        }

        // Only reached if external state changed after validation.
        ArgumentValue::String(value.to_string())
    }

    fn is_empty(&self, value: &RawInput<'_>, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> bool {
        self.types.iter().all(|kind| kind.is_empty(value, ctx, argument))
    }
}
