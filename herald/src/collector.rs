use crate::argument::{Argument, ArgumentInfo, CancelReason, RawInput};
use crate::context::CommandContext;
use crate::error::{ArgumentError, ClientError};
use crate::registry::TypeRegistry;
use crate::twilight_exports::{Id, MessageMarker};
use crate::value::ArgumentValues;
use std::collections::HashSet;
use tracing::debug;

/// The result of obtaining every argument of a collector.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorResult {
    /// The obtained values keyed by argument key, `None` if cancelled.
    pub values: Option<ArgumentValues>,
    pub cancelled: Option<CancelReason>,
    /// Prompts sent to the user across every argument.
    pub prompts: Vec<Id<MessageMarker>>,
    /// Replies of the user consumed as answers across every argument.
    pub answers: Vec<Id<MessageMarker>>,
}

/// An ordered list of arguments obtained one after another.
pub struct ArgumentCollector<D> {
    pub arguments: Vec<Argument<D>>,
    /// Maximum amount of prompts per argument, `None` for no limit.
    pub prompt_limit: Option<usize>,
}

impl<D: Send + Sync + 'static> ArgumentCollector<D> {
    /// Creates a new collector, checking the ordering of the given arguments.
    pub fn new(arguments: Vec<Argument<D>>, prompt_limit: Option<usize>) -> Result<Self, ArgumentError> {
        let mut keys = HashSet::new();
        let mut has_optional = false;
        let mut has_infinite = false;

        for argument in &arguments {
            if has_infinite {
                return Err(ArgumentError::AfterInfinite(argument.key.to_string()));
            }

            if argument.required() && has_optional {
                return Err(ArgumentError::RequiredAfterOptional(argument.key.to_string()));
            }

            if !keys.insert(argument.key) {
                return Err(ArgumentError::DuplicateKey(argument.key.to_string()));
            }

            has_optional |= !argument.required();
            has_infinite |= argument.infinite;
        }

        Ok(Self { arguments, prompt_limit })
    }

    /// Resolves the given declarations against the registered types and creates a collector
    /// out of them.
    pub fn from_infos(
        infos: Vec<ArgumentInfo<D>>,
        types: &TypeRegistry<D>,
        prompt_limit: Option<usize>,
    ) -> Result<Self, ArgumentError> {
        let arguments = infos
            .into_iter()
            .map(|info| Argument::new(info, types))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(arguments, prompt_limit)
    }

    /// The amount of values to split the argument string into, `0` if the last argument is
    /// infinite.
    pub fn arg_count(&self) -> usize {
        match self.arguments.last() {
            Some(last) if last.infinite => 0,
            _ => self.arguments.len(),
        }
    }

    /// Obtains every argument using the collector prompt limit.
    pub async fn obtain(
        &self,
        ctx: &CommandContext<'_, D>,
        provided: &[String],
    ) -> Result<CollectorResult, ClientError> {
        self.obtain_with_limit(ctx, provided, self.prompt_limit).await
    }

    /// Obtains every argument in order, using the provided values by position.
    ///
    /// The invoker is marked as awaiting input in the channel until this returns, so their
    /// messages are only taken as prompt replies.
    pub async fn obtain_with_limit(
        &self,
        ctx: &CommandContext<'_, D>,
        provided: &[String],
        prompt_limit: Option<usize>,
    ) -> Result<CollectorResult, ClientError> {
        let _guard = ctx.waiters.begin_awaiting(ctx.user_id(), ctx.channel_id());

        let mut values = ArgumentValues::new();
        let mut prompts = Vec::new();
        let mut answers = Vec::new();

        for (index, argument) in self.arguments.iter().enumerate() {
            let raw = if argument.infinite {
                RawInput::Many(provided.get(index..).unwrap_or_default())
            } else {
                RawInput::Single(provided.get(index).map(String::as_str))
            };

            let result = argument.obtain(ctx, raw, prompt_limit).await?;
            prompts.extend(result.prompts);
            answers.extend(result.answers);

            match (result.value, result.cancelled) {
                (Some(value), None) => values.insert(argument.key, value),
                (_, cancelled) => {
                    debug!("Argument [{}] collection cancelled: {:?}", argument.key, cancelled);

                    return Ok(CollectorResult {
                        values: None,
                        cancelled: Some(cancelled.unwrap_or(CancelReason::User)),
                        prompts,
                        answers,
                    });
                }
            }
        }

        Ok(CollectorResult {
            values: Some(values),
            cancelled: None,
            prompts,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentInfo;
    use crate::testing::{Harness, CHANNEL, OWNER};
    use crate::value::ArgumentValue;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ordering_is_checked() {
        let harness = Harness::new();
        let types = harness.types();

        let required_after_optional = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("a", "A?").kind("string").default("x"),
                ArgumentInfo::new("b", "B?").kind("string"),
            ],
            &types,
            None,
        );
        assert_eq!(
            required_after_optional.err(),
            Some(ArgumentError::RequiredAfterOptional("b".into()))
        );

        let after_infinite = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("a", "A?").kind("string").infinite(true),
                ArgumentInfo::new("b", "B?").kind("string").default("x"),
            ],
            &types,
            None,
        );
        assert_eq!(after_infinite.err(), Some(ArgumentError::AfterInfinite("b".into())));

        let duplicate = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("a", "A?").kind("string"),
                ArgumentInfo::new("a", "A?").kind("integer"),
            ],
            &types,
            None,
        );
        assert_eq!(duplicate.err(), Some(ArgumentError::DuplicateKey("a".into())));
    }

    #[test]
    fn arg_count_is_unlimited_with_infinite_last() {
        let harness = Harness::new();
        let types = harness.types();

        let fixed = ArgumentCollector::<()>::from_infos(
            vec![ArgumentInfo::new("a", "A?").kind("string"), ArgumentInfo::new("b", "B?").kind("string")],
            &types,
            None,
        )
        .unwrap();
        assert_eq!(fixed.arg_count(), 2);

        let infinite = ArgumentCollector::<()>::from_infos(
            vec![ArgumentInfo::new("a", "A?").kind("string").infinite(true)],
            &types,
            None,
        )
        .unwrap();
        assert_eq!(infinite.arg_count(), 0);
    }

    #[tokio::test]
    async fn provided_values_fill_every_argument() {
        let harness = Harness::new();
        let collector = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("target", "Who?").kind("string"),
                ArgumentInfo::new("numbers", "Which numbers?").kind("integer").infinite(true),
            ],
            &harness.types(),
            None,
        )
        .unwrap();
        let ctx = harness.context("!pick bob 1 2");

        let result = collector.obtain(&ctx, &strings(&["bob", "1", "2"])).await.unwrap();
        let values = result.values.unwrap();

        assert_eq!(result.cancelled, None);
        assert!(result.prompts.is_empty());
        assert_eq!(values.get::<String>("target").as_deref(), Some("bob"));
        assert_eq!(values.get::<Vec<i64>>("numbers"), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn cancellation_short_circuits_with_transcript() {
        let harness = Harness::new();
        let collector = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("a", "First?").kind("string"),
                ArgumentInfo::new("b", "Second?").kind("string"),
                ArgumentInfo::new("c", "Third?").kind("string"),
            ],
            &harness.types(),
            None,
        )
        .unwrap();
        let ctx = harness.context("!abc");
        harness.client.queue_replies(["one", "cancel"]);

        let result = collector.obtain(&ctx, &[]).await.unwrap();
        assert_eq!(result.values, None);
        assert_eq!(result.cancelled, Some(CancelReason::User));
        assert_eq!(result.prompts.len(), 2);
        assert_eq!(result.answers.len(), 2);
        assert!(!harness.client.sent().iter().any(|sent| sent.starts_with("Third?")));
    }

    #[tokio::test]
    async fn optional_arguments_use_defaults() {
        let harness = Harness::new();
        let collector = ArgumentCollector::<()>::from_infos(
            vec![
                ArgumentInfo::new("text", "Text?").kind("string"),
                ArgumentInfo::new("times", "Times?").kind("integer").default(1i64),
            ],
            &harness.types(),
            Some(0),
        )
        .unwrap();
        let ctx = harness.context("!repeat hi");

        let result = collector.obtain(&ctx, &strings(&["hi"])).await.unwrap();
        assert_eq!(result.values.unwrap().value("times"), Some(&ArgumentValue::Integer(1)));

        let result = collector.obtain(&ctx, &[]).await.unwrap();
        assert_eq!(result.cancelled, Some(CancelReason::PromptLimit));
        assert!(result.prompts.is_empty());
    }

    #[tokio::test]
    async fn awaiting_set_is_held_while_prompting() {
        let harness = Harness::new();
        let collector = ArgumentCollector::<()>::from_infos(
            vec![ArgumentInfo::new("text", "Text?").kind("string")],
            &harness.types(),
            None,
        )
        .unwrap();
        let ctx = harness.context("!echo");
        let waiters = harness.waiters.clone();

        let checker = tokio::spawn(async move {
            tokio::task::yield_now().await;
            let awaiting = waiters.is_awaiting(Id::new(OWNER), Id::new(CHANNEL));
            waiters.wake(&crate::testing::message_from(9, "hello"));
            awaiting
        });

        let result = collector.obtain(&ctx, &[]).await.unwrap();
        assert!(checker.await.unwrap());
        assert!(result.values.is_some());
        assert!(!harness.waiters.is_awaiting(Id::new(OWNER), Id::new(CHANNEL)));
    }

    #[tokio::test]
    async fn dropping_the_future_releases_the_awaiting_set() {
        let harness = Harness::new();
        let collector = ArgumentCollector::<()>::from_infos(
            vec![ArgumentInfo::new("text", "Text?").kind("string").wait(0)],
            &harness.types(),
            None,
        )
        .unwrap();
        let ctx = harness.context("!echo");

        {
            let future = collector.obtain(&ctx, &[]);
            tokio::pin!(future);
            assert!(futures::poll!(future.as_mut()).is_pending());
            assert!(harness.waiters.is_awaiting(Id::new(OWNER), Id::new(CHANNEL)));
        }

        assert!(!harness.waiters.is_awaiting(Id::new(OWNER), Id::new(CHANNEL)));
    }
}
