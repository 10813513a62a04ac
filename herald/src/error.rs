use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;
use twilight_http::{response::DeserializeBodyError, Error as HttpError};
use twilight_validate::message::MessageValidationError;

/// An error raised while talking to the chat platform.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeBodyError),
    #[error(transparent)]
    Validation(#[from] MessageValidationError),
    #[error("{0}")]
    Other(String),
}

/// Errors raised when registering items into the [registry](crate::registry::Registry).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("A command with the name/alias \"{0}\" is already registered")]
    DuplicateCommand(String),
    #[error("A group with the id \"{0}\" is already registered")]
    DuplicateGroup(String),
    #[error("An argument type with the id \"{0}\" is already registered")]
    DuplicateType(String),
    #[error("Group \"{group}\" of command \"{command}\" is not registered")]
    UnknownGroup { command: String, group: String },
    #[error("An unknown command is already registered ({0})")]
    DuplicateUnknownCommand(String),
    #[error("Command \"{command}\" has invalid arguments: {source}")]
    Arguments {
        command: String,
        #[source]
        source: ArgumentError,
    },
}

/// Errors raised when building an [argument](crate::argument::Argument) or an
/// [argument collector](crate::collector::ArgumentCollector).
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Argument key must not be empty")]
    EmptyKey,
    #[error("Argument \"{0}\" must have either a type or both a validator and a parser")]
    MissingType(String),
    #[error("Argument \"{key}\" has an unknown type \"{kind}\"")]
    UnknownType { key: String, kind: String },
    #[error("Argument key \"{0}\" is used more than once")]
    DuplicateKey(String),
    #[error("Required argument \"{0}\" may not come after optional arguments")]
    RequiredAfterOptional(String),
    #[error("Argument \"{0}\" may not come after an infinite argument")]
    AfterInfinite(String),
}

/// An error meant to be shown to the user as-is.
///
/// Returning it from a command makes the framework reply with its message instead of treating
/// it as an unexpected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyError(pub String);

impl FriendlyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for FriendlyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl Error for FriendlyError {}

/// Errors returned by commands. Determines how the framework reports a failed command.
pub trait CommandFailure: Display + Send + 'static {
    /// The message to show to the user as-is, if this is a [friendly error](FriendlyError).
    fn friendly(&self) -> Option<&str> {
        None
    }
}

impl CommandFailure for Box<dyn Error + Send + Sync> {
    fn friendly(&self) -> Option<&str> {
        self.downcast_ref::<FriendlyError>().map(|e| e.0.as_str())
    }
}

impl CommandFailure for FriendlyError {
    fn friendly(&self) -> Option<&str> {
        Some(&self.0)
    }
}

impl CommandFailure for ClientError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_friendly_errors_are_detected() {
        let error: Box<dyn Error + Send + Sync> = Box::new(FriendlyError::new("Nope."));
        assert_eq!(error.friendly(), Some("Nope."));

        let error: Box<dyn Error + Send + Sync> = Box::new(ClientError::Other("down".into()));
        assert_eq!(error.friendly(), None);
    }
}
