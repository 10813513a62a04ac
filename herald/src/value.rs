use crate::client::UserInfo;
use crate::twilight_exports::{ChannelMarker, Id, RoleMarker, UserMarker};
use std::collections::HashMap;

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    User(UserInfo),
    Channel(Id<ChannelMarker>),
    Role(Id<RoleMarker>),
    /// The values collected by an infinite argument.
    List(Vec<ArgumentValue>),
}

impl ArgumentValue {
    /// Converts the value into `T`, returning `None` if the variant doesn't match.
    pub fn get<T: FromArgumentValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ArgumentValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<ArgumentValue>> From<Vec<T>> for ArgumentValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Types that can be extracted out of an [argument value](ArgumentValue).
pub trait FromArgumentValue: Sized {
    fn from_value(value: &ArgumentValue) -> Option<Self>;
}

macro_rules! from_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromArgumentValue for $t {
                fn from_value(value: &ArgumentValue) -> Option<Self> {
                    match value {
                        ArgumentValue::$variant(inner) => Some(inner.clone()),
                        _ => None
                    }
                }
            }
        )*
    };
}

from_value! {
    String => String,
    i64 => Integer,
    bool => Boolean,
    UserInfo => User,
    Id<ChannelMarker> => Channel,
    Id<RoleMarker> => Role,
}

impl FromArgumentValue for f64 {
    fn from_value(value: &ArgumentValue) -> Option<Self> {
        match value {
            ArgumentValue::Float(f) => Some(*f),
            ArgumentValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromArgumentValue for Id<UserMarker> {
    fn from_value(value: &ArgumentValue) -> Option<Self> {
        match value {
            ArgumentValue::User(user) => Some(user.id),
            _ => None,
        }
    }
}

impl<T: FromArgumentValue> FromArgumentValue for Vec<T> {
    fn from_value(value: &ArgumentValue) -> Option<Self> {
        match value {
            ArgumentValue::List(values) => values.iter().map(T::from_value).collect(),
            other => Some(vec![T::from_value(other)?]),
        }
    }
}

/// The values obtained by an [argument collector](crate::collector::ArgumentCollector), keyed by
/// argument key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentValues(HashMap<&'static str, ArgumentValue>);

impl ArgumentValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: ArgumentValue) {
        self.0.insert(key, value);
    }

    /// Gets the raw value of the given key.
    pub fn value(&self, key: &str) -> Option<&ArgumentValue> {
        self.0.get(key)
    }

    /// Gets the value of the given key converted into `T`.
    pub fn get<T: FromArgumentValue>(&self, key: &str) -> Option<T> {
        self.value(key).and_then(T::from_value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&&'static str, &ArgumentValue)> {
        self.0.iter()
    }
}
