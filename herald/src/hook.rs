use crate::argument::{Argument, RawInput};
use crate::context::CommandContext;
use crate::types::Validation;
use crate::value::ArgumentValue;
use crate::BoxFuture;

/// A pointer to a function used to validate an argument instead of its type.
pub type ValidatorFn<D> =
    for<'a> fn(&'a str, &'a CommandContext<'a, D>, &'a Argument<D>) -> BoxFuture<'a, Validation>;

/// A pointer to a function used to parse an argument instead of its type.
pub type ParserFn<D> =
    for<'a> fn(&'a str, &'a CommandContext<'a, D>, &'a Argument<D>) -> BoxFuture<'a, ArgumentValue>;

/// A pointer to a function deciding whether the input of an argument counts as not provided.
pub type EmptyCheckerFn<D> = for<'a> fn(&RawInput<'a>, &CommandContext<'a, D>, &Argument<D>) -> bool;

/// A pointer to a function resolving the default value of an argument.
pub type DefaultFn<D> = for<'a> fn(&'a CommandContext<'a, D>, &'a Argument<D>) -> ArgumentValue;

/// The outcome of an inhibitor blocking a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inhibition {
    /// The reason reported in the blocked event.
    pub reason: String,
    /// A message replied to the invoker, if any.
    pub response: Option<String>,
}

impl Inhibition {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            response: None,
        }
    }

    /// Sets the message replied to the invoker.
    pub fn respond(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

/// A pointer to a function used by the [inhibitor hook](InhibitorHook).
pub(crate) type InhibitorFn<D> =
    for<'a> fn(&'a CommandContext<'a, D>, &'a str) -> BoxFuture<'a, Option<Inhibition>>;

/// A hook executed before the usage checks of every command.
///
/// The function must have as parameters a [command context] reference and a `&str` containing
/// the name of the command to execute. Returning an [inhibition](Inhibition) blocks the command.
///
/// [command context]: CommandContext
pub struct InhibitorHook<D>(pub InhibitorFn<D>);

/// A pointer to a function used by the [error handler hook](ErrorHandlerHook).
pub(crate) type ErrorHandlerFn<D, E> = for<'a> fn(&'a CommandContext<'a, D>, E) -> BoxFuture<'a, ()>;

/// A hook that can be used to handle errors of a specific command.
///
/// The function must have as parameters a [command context] reference and the actual error type
/// the command is supposed to return.
///
/// [command context]: CommandContext
pub struct ErrorHandlerHook<D, E>(pub ErrorHandlerFn<D, E>);
