use crate::context::CommandContext;
use crate::error::{ArgumentError, ClientError};
use crate::hook::{DefaultFn, EmptyCheckerFn, ParserFn, ValidatorFn};
use crate::parsers::escape_markdown;
use crate::registry::TypeRegistry;
use crate::twilight_exports::{Id, MessageMarker};
use crate::types::{ArgumentType, Validation};
use crate::value::ArgumentValue;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use tracing::debug;

/// The default amount of seconds to wait for a prompt reply.
pub const DEFAULT_WAIT: u64 = 30;

/// Longest value quoted back to the user when an infinite argument entry is rejected.
const MAX_QUOTED_LENGTH: usize = 1850;

/// Why the collection of an argument was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The user replied `cancel`.
    User,
    /// The user did not reply in time.
    Time,
    /// The maximum amount of prompts was reached.
    PromptLimit,
}

impl Display for CancelReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::User => f.write_str("user"),
            Self::Time => f.write_str("time"),
            Self::PromptLimit => f.write_str("promptLimit"),
        }
    }
}

/// The raw input provided to an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput<'a> {
    /// A single value, `None` if the user did not provide it.
    Single(Option<&'a str>),
    /// Several values, given to infinite arguments.
    Many(&'a [String]),
}

impl RawInput<'_> {
    /// Whether the input has no content at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(value) => value.map_or(true, str::is_empty),
            Self::Many(values) => values.iter().all(|v| v.is_empty()),
        }
    }
}

/// The default value of an optional argument.
pub enum ArgumentDefault<D> {
    Value(ArgumentValue),
    /// Resolved lazily each time the default is needed.
    Resolver(DefaultFn<D>),
}

impl<D> ArgumentDefault<D> {
    pub fn resolve(&self, ctx: &CommandContext<'_, D>, argument: &Argument<D>) -> ArgumentValue {
        match self {
            Self::Value(value) => value.clone(),
            Self::Resolver(fun) => fun(ctx, argument),
        }
    }
}

/// The result of obtaining a single argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentResult {
    /// The final value, `None` if cancelled.
    pub value: Option<ArgumentValue>,
    pub cancelled: Option<CancelReason>,
    /// Prompts sent to the user.
    pub prompts: Vec<Id<MessageMarker>>,
    /// Replies of the user consumed as answers.
    pub answers: Vec<Id<MessageMarker>>,
}

impl ArgumentResult {
    fn value(value: ArgumentValue, prompts: Vec<Id<MessageMarker>>, answers: Vec<Id<MessageMarker>>) -> Self {
        Self {
            value: Some(value),
            cancelled: None,
            prompts,
            answers,
        }
    }

    fn cancelled(reason: CancelReason, prompts: Vec<Id<MessageMarker>>, answers: Vec<Id<MessageMarker>>) -> Self {
        Self {
            value: None,
            cancelled: Some(reason),
            prompts,
            answers,
        }
    }
}

/// The declaration of an argument, turned into an [argument](Argument) once resolved against
/// the registered types.
pub struct ArgumentInfo<D> {
    pub key: &'static str,
    pub label: Option<&'static str>,
    pub prompt: &'static str,
    pub error: Option<&'static str>,
    pub kind: Option<&'static str>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub one_of: Option<Vec<String>>,
    pub default: Option<ArgumentDefault<D>>,
    pub infinite: bool,
    pub wait: u64,
    pub validator: Option<ValidatorFn<D>>,
    pub parser: Option<ParserFn<D>>,
    pub empty_checker: Option<EmptyCheckerFn<D>>,
}

impl<D> ArgumentInfo<D> {
    /// Creates a new argument declaration with the given key and prompt.
    pub fn new(key: &'static str, prompt: &'static str) -> Self {
        Self {
            key,
            label: None,
            prompt,
            error: None,
            kind: None,
            min: None,
            max: None,
            one_of: None,
            default: None,
            infinite: false,
            wait: DEFAULT_WAIT,
            validator: None,
            parser: None,
            empty_checker: None,
        }
    }

    /// Sets the label shown to users, defaults to the key.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Overrides the message shown when the validator rejects a value without a reason.
    pub fn error(mut self, error: &'static str) -> Self {
        self.error = Some(error);
        self
    }

    /// Sets the type id, use `a|b` to accept any of several types.
    pub fn kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Restricts the accepted values to the given choices, compared case-insensitively.
    pub fn one_of<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.one_of = Some(choices.into_iter().map(|c| c.as_ref().to_lowercase()).collect());
        self
    }

    /// Makes the argument optional, using the given value when not provided.
    pub fn default(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.default = Some(ArgumentDefault::Value(value.into()));
        self
    }

    /// Makes the argument optional, resolving the default with the given function.
    pub fn default_fn(mut self, fun: DefaultFn<D>) -> Self {
        self.default = Some(ArgumentDefault::Resolver(fun));
        self
    }

    pub fn infinite(mut self, infinite: bool) -> Self {
        self.infinite = infinite;
        self
    }

    /// Sets how many seconds to wait for a prompt reply, `0` waits forever.
    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait = seconds;
        self
    }

    pub fn validator(mut self, fun: ValidatorFn<D>) -> Self {
        self.validator = Some(fun);
        self
    }

    pub fn parser(mut self, fun: ParserFn<D>) -> Self {
        self.parser = Some(fun);
        self
    }

    pub fn empty_checker(mut self, fun: EmptyCheckerFn<D>) -> Self {
        self.empty_checker = Some(fun);
        self
    }
}

/// A command argument able to prompt the user for its value.
pub struct Argument<D> {
    /// Key of the argument in the collected values.
    pub key: &'static str,
    /// Name of the argument shown to users.
    pub label: &'static str,
    /// Message sent when asking for the value.
    pub prompt: &'static str,
    pub error: Option<&'static str>,
    pub kind: Option<Arc<dyn ArgumentType<D>>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub one_of: Option<Vec<String>>,
    pub default: Option<ArgumentDefault<D>>,
    pub infinite: bool,
    pub wait: u64,
    validator: Option<ValidatorFn<D>>,
    parser: Option<ParserFn<D>>,
    empty_checker: Option<EmptyCheckerFn<D>>,
}

impl<D> Argument<D> {
    /// Whether the user must provide a value.
    pub fn required(&self) -> bool {
        self.default.is_none()
    }
}

impl<D: Send + Sync + 'static> Argument<D> {
    /// Resolves the declaration against the registered types.
    pub fn new(info: ArgumentInfo<D>, types: &TypeRegistry<D>) -> Result<Self, ArgumentError> {
        if info.key.is_empty() {
            return Err(ArgumentError::EmptyKey);
        }

        let kind = match info.kind {
            Some(id) => Some(types.get(id).ok_or_else(|| ArgumentError::UnknownType {
                key: info.key.to_string(),
                kind: id.to_string(),
            })?),
            None if info.validator.is_some() && info.parser.is_some() => None,
            None => return Err(ArgumentError::MissingType(info.key.to_string())),
        };

        Ok(Self {
            key: info.key,
            label: info.label.unwrap_or(info.key),
            prompt: info.prompt,
            error: info.error,
            kind,
            min: info.min,
            max: info.max,
            one_of: info.one_of,
            default: info.default,
            infinite: info.infinite,
            wait: info.wait,
            validator: info.validator,
            parser: info.parser,
            empty_checker: info.empty_checker,
        })
    }

    /// Obtains the value of this argument, prompting the user when the given input is empty or
    /// invalid.
    ///
    /// Expected outcomes, including cancellations, are returned as part of the
    /// [result](ArgumentResult); only failures to talk to the chat platform are errors.
    pub async fn obtain(
        &self,
        ctx: &CommandContext<'_, D>,
        raw: RawInput<'_>,
        prompt_limit: Option<usize>,
    ) -> Result<ArgumentResult, ClientError> {
        let mut empty = self.is_empty(&raw, ctx);

        if empty {
            if let Some(default) = &self.default {
                debug!("Argument [{}] not provided, using its default", self.key);
                return Ok(ArgumentResult::value(default.resolve(ctx, self), Vec::new(), Vec::new()));
            }
        }

        let mut current = match raw {
            RawInput::Many(values) => return self.obtain_infinite(ctx, values, prompt_limit).await,
            RawInput::Single(value) if self.infinite => {
                let values = value.map(|v| vec![v.to_string()]).unwrap_or_default();
                return self.obtain_infinite(ctx, &values, prompt_limit).await;
            }
            RawInput::Single(value) => value.unwrap_or_default().to_string(),
        };

        let mut prompts = Vec::new();
        let mut answers = Vec::new();
        let mut validity = if empty {
            Validation::Invalid
        } else {
            self.validate(&current, ctx).await
        };

        while !validity.is_valid() {
            if prompt_limit.is_some_and(|limit| prompts.len() >= limit) {
                debug!("Argument [{}] reached the prompt limit", self.key);
                return Ok(ArgumentResult::cancelled(CancelReason::PromptLimit, prompts, answers));
            }

            let reason = if empty {
                self.prompt.to_string()
            } else {
                self.rejection(&validity)
            };

            prompts.push(ctx.send_prompt(&format!("{reason}\n{}", self.instructions(false))).await?);

            let Some(answer) = ctx.wait_for_reply(self.wait).await else {
                debug!("Argument [{}] prompt timed out", self.key);
                return Ok(ArgumentResult::cancelled(CancelReason::Time, prompts, answers));
            };

            answers.push(answer.id);
            current = answer.content;

            if current.eq_ignore_ascii_case("cancel") {
                return Ok(ArgumentResult::cancelled(CancelReason::User, prompts, answers));
            }

            empty = self.is_empty(&RawInput::Single(Some(&current)), ctx);
            validity = self.validate(&current, ctx).await;
        }

        let value = self.parse(&current, ctx).await;
        Ok(ArgumentResult::value(value, prompts, answers))
    }

    async fn obtain_infinite(
        &self,
        ctx: &CommandContext<'_, D>,
        values: &[String],
        prompt_limit: Option<usize>,
    ) -> Result<ArgumentResult, ClientError> {
        let mut results = Vec::new();
        let mut prompts = Vec::new();
        let mut answers = Vec::new();
        let mut index = 0;

        loop {
            let mut current = values.get(index).filter(|value| !value.is_empty()).cloned();
            let mut validity = match &current {
                Some(value) => self.validate(value, ctx).await,
                None => Validation::Invalid,
            };
            let mut attempts = 0;

            while !validity.is_valid() {
                attempts += 1;
                if prompt_limit.is_some_and(|limit| attempts > limit) {
                    return Ok(ArgumentResult::cancelled(CancelReason::PromptLimit, prompts, answers));
                }

                if let Some(value) = &current {
                    let reason = match &validity {
                        Validation::Rejected(why) => why.clone(),
                        _ => {
                            let escaped = escape_markdown(value).replace('@', "@\u{200b}");
                            let shown = if escaped.len() < MAX_QUOTED_LENGTH {
                                escaped.as_str()
                            } else {
                                "[too long to show]"
                            };
                            format!("You provided an invalid {}, \"{shown}\". Please try again.", self.label)
                        }
                    };
                    prompts.push(ctx.send_prompt(&format!("{reason}\n{}", self.instructions(true))).await?);
                } else if results.is_empty() || index < values.len() {
                    prompts.push(
                        ctx.send_prompt(&format!("{}\n{}", self.prompt, self.instructions(true)))
                            .await?,
                    );
                }

                let Some(answer) = ctx.wait_for_reply(self.wait).await else {
                    return Ok(ArgumentResult::cancelled(CancelReason::Time, prompts, answers));
                };

                answers.push(answer.id);
                let content = answer.content;

                if content.eq_ignore_ascii_case("finish") {
                    return Ok(self.finish(ctx, results, prompts, answers));
                }

                if content.eq_ignore_ascii_case("cancel") {
                    return Ok(ArgumentResult::cancelled(CancelReason::User, prompts, answers));
                }

                validity = self.validate(&content, ctx).await;
                current = Some(content);
            }

            let value = current.unwrap_or_default();
            results.push(self.parse(&value, ctx).await);

            if !values.is_empty() {
                index += 1;
                if index == values.len() {
                    return Ok(ArgumentResult::value(ArgumentValue::List(results), prompts, answers));
                }
            }
        }
    }

    /// Ends an infinite collection early. Finishing without any value falls back to the default,
    /// or cancels if there is none.
    fn finish(
        &self,
        ctx: &CommandContext<'_, D>,
        results: Vec<ArgumentValue>,
        prompts: Vec<Id<MessageMarker>>,
        answers: Vec<Id<MessageMarker>>,
    ) -> ArgumentResult {
        if !results.is_empty() {
            return ArgumentResult::value(ArgumentValue::List(results), prompts, answers);
        }

        match &self.default {
            Some(default) => ArgumentResult::value(default.resolve(ctx, self), prompts, answers),
            None => ArgumentResult::cancelled(CancelReason::User, prompts, answers),
        }
    }

    /// Validates the raw value using the custom validator if present, or the bound type.
    pub async fn validate(&self, value: &str, ctx: &CommandContext<'_, D>) -> Validation {
        let validity = match (self.validator, &self.kind) {
            (Some(validator), _) => validator(value, ctx, self).await,
            (None, Some(kind)) => kind.validate(value, ctx, self).await,
            (None, None) => Validation::Invalid,
        };

        if !validity.is_valid() && self.is_empty(&RawInput::Single(Some(value)), ctx) {
            Validation::Invalid
        } else {
            validity
        }
    }

    /// Parses a raw value previously accepted by [validate](Self::validate).
    pub async fn parse(&self, value: &str, ctx: &CommandContext<'_, D>) -> ArgumentValue {
        match (self.parser, &self.kind) {
            (Some(parser), _) => parser(value, ctx, self).await,
            (None, Some(kind)) => kind.parse(value, ctx, self).await,
            (None, None) => ArgumentValue::String(value.to_string()),
        }
    }

    /// Whether the given input counts as not provided.
    pub fn is_empty(&self, raw: &RawInput<'_>, ctx: &CommandContext<'_, D>) -> bool {
        match (self.empty_checker, &self.kind) {
            (Some(checker), _) => checker(raw, ctx, self),
            (None, Some(kind)) => kind.is_empty(raw, ctx, self),
            (None, None) => raw.is_blank(),
        }
    }

    fn rejection(&self, validity: &Validation) -> String {
        match validity {
            Validation::Rejected(why) => why.clone(),
            _ => self
                .error
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("You provided an invalid {}. Please try again.", self.label)),
        }
    }

    fn instructions(&self, infinite: bool) -> String {
        let mut text = if infinite {
            String::from("Respond with `cancel` to cancel the command, or `finish` to finish entry up to this point.")
        } else {
            String::from("Respond with `cancel` to cancel the command.")
        };

        if self.wait > 0 {
            text.push_str(&format!(
                " The command will automatically be cancelled in {} seconds.",
                self.wait
            ));
        }

        text
    }
}
