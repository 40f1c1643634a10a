use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Token matching exports to imports.
///
/// Type keys compare by [`TypeId`], named keys by string value and value
/// keys by `Eq` on the same Rust type. Keys of different kinds never compare
/// equal, so `ServiceKey::value(1u32)` and `ServiceKey::named("1")` are
/// distinct.
#[derive(Clone)]
pub enum ServiceKey {
    Type { id: TypeId, name: &'static str },
    Named(Cow<'static, str>),
    Value(Arc<dyn KeyValue>),
}

/// Any hashable, comparable value usable as a [`ServiceKey`].
pub trait KeyValue: Any + Send + Sync + fmt::Debug + fmt::Display {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn KeyValue) -> bool;
    fn hash_value(&self, state: &mut dyn Hasher);
}

impl<T> KeyValue for T
where
    T: Any + Send + Sync + Eq + Hash + fmt::Debug + fmt::Display,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn KeyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn hash_value(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

impl ServiceKey {
    /// Key identifying the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Key identified by a string name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// Key identified by an arbitrary value, such as an integer id.
    pub fn value<V: KeyValue>(value: V) -> Self {
        Self::Value(Arc::new(value))
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type { .. })
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Type { id: a, .. }, Self::Type { id: b, .. }) => a == b,
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Value(a), Self::Value(b)) => KeyValue::eq_value(&**a, &**b),
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Type { id, .. } => id.hash(state),
            Self::Named(name) => name.hash(state),
            Self::Value(value) => KeyValue::hash_value(&**value, state),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { name, .. } => f.write_str(name),
            Self::Named(name) => f.write_str(name),
            Self::Value(value) => fmt::Display::fmt(&**value, f),
        }
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { name, .. } => f.debug_tuple("Type").field(name).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<&'static str> for ServiceKey {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ServiceKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(key: &ServiceKey) -> Self {
        key.clone()
    }
}
