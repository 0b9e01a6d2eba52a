//! Values stored in context-local cells.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Dynamically typed payload of a context-local cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Explicit absence of data (a stored `None`). Distinct from an unset cell.
	Null,
	/// Boolean value.
	Bool(bool),
	/// Integer value.
	Int(i64),
	/// Floating point value.
	Float(f64),
	/// String value.
	Str(String),
	/// Ordered list of values.
	List(Vec<Value>),
	/// Arbitrary shared payload, compared by identity.
	Opaque(Opaque),
}

impl Value {
	/// Wraps an arbitrary payload as an [`Value::Opaque`].
	pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
		Value::Opaque(Opaque(Arc::new(value)))
	}

	/// Returns true if this is [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Returns the boolean value if this is a `Bool` variant.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the integer value if this is an `Int` variant.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the float value. Integers are widened.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(v) => Some(*v),
			Value::Int(v) => Some(*v as f64),
			_ => None,
		}
	}

	/// Returns the string value if this is a `Str` variant.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the list items if this is a `List` variant.
	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the opaque payload downcast to `T`, if it is one.
	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		match self {
			Value::Opaque(o) => o.downcast(),
			_ => None,
		}
	}

	/// Returns the type name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Str(_) => "string",
			Value::List(_) => "list",
			Value::Opaque(_) => "opaque",
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(v) => write!(f, "{v}"),
			Value::Int(v) => write!(f, "{v}"),
			Value::Float(v) => write!(f, "{v}"),
			Value::Str(v) => f.write_str(v),
			Value::List(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
			Value::Opaque(o) => write!(f, "{o:?}"),
		}
	}
}

/// Shared payload of an [`Value::Opaque`].
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
	/// Returns the payload downcast to `T`.
	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.0).downcast::<T>().ok()
	}
}

impl PartialEq for Opaque {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Opaque {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Opaque({:p})", Arc::as_ptr(&self.0))
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Int(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int(i64::from(v))
	}
}

impl From<u32> for Value {
	fn from(v: u32) -> Self {
		Value::Int(i64::from(v))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Str(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Str(v.to_string())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Value::Null, Into::into)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Value::List(v.into_iter().map(Into::into).collect())
	}
}

impl<T: Any + Send + Sync> From<Arc<T>> for Value {
	fn from(v: Arc<T>) -> Self {
		Value::Opaque(Opaque(v))
	}
}

/// Trait for types that can be extracted from a [`Value`].
pub trait FromValue: Sized {
	/// Extracts the value, returning `None` if the type doesn't match.
	fn from_value(value: &Value) -> Option<Self>;

	/// Human-readable name of the expected type, used in mismatch reports.
	fn expected() -> &'static str;
}

impl FromValue for Value {
	fn from_value(value: &Value) -> Option<Self> {
		Some(value.clone())
	}

	fn expected() -> &'static str {
		"any"
	}
}

impl FromValue for bool {
	fn from_value(value: &Value) -> Option<Self> {
		value.as_bool()
	}

	fn expected() -> &'static str {
		"bool"
	}
}

impl FromValue for i64 {
	fn from_value(value: &Value) -> Option<Self> {
		value.as_int()
	}

	fn expected() -> &'static str {
		"int"
	}
}

impl FromValue for f64 {
	fn from_value(value: &Value) -> Option<Self> {
		value.as_float()
	}

	fn expected() -> &'static str {
		"float"
	}
}

impl FromValue for String {
	fn from_value(value: &Value) -> Option<Self> {
		value.as_str().map(str::to_string)
	}

	fn expected() -> &'static str {
		"string"
	}
}

impl<T: FromValue> FromValue for Option<T> {
	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Null => Some(None),
			other => T::from_value(other).map(Some),
		}
	}

	fn expected() -> &'static str {
		T::expected()
	}
}

impl<T: FromValue> FromValue for Vec<T> {
	fn from_value(value: &Value) -> Option<Self> {
		value.as_list()?.iter().map(T::from_value).collect()
	}

	fn expected() -> &'static str {
		"list"
	}
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
	fn from_value(value: &Value) -> Option<Self> {
		value.downcast()
	}

	fn expected() -> &'static str {
		std::any::type_name::<T>()
	}
}

/// Logical state of a cell in one context.
///
/// `Unset` and `Deleted` are explicit states rather than in-band marker values,
/// so a stored [`Value::Null`] is never confused with absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawValue {
	/// Never written in this context, or reset back to its default.
	#[default]
	Unset,
	/// Explicitly erased in this context.
	Deleted,
	/// Holds a value.
	Present(Value),
}

impl RawValue {
	/// Returns the held value, if any.
	pub fn value(&self) -> Option<&Value> {
		match self {
			RawValue::Present(v) => Some(v),
			_ => None,
		}
	}

	/// Consumes the state and returns the held value, if any.
	pub fn into_value(self) -> Option<Value> {
		match self {
			RawValue::Present(v) => Some(v),
			_ => None,
		}
	}

	/// Returns true if a value is held.
	pub fn is_present(&self) -> bool {
		matches!(self, RawValue::Present(_))
	}
}

impl From<Value> for RawValue {
	fn from(v: Value) -> Self {
		RawValue::Present(v)
	}
}
