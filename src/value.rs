use core::fmt::{self, Display, Formatter};
use hashbrown::HashMap;

/// A dynamic property value, as found in attribute bags, component props and component state.
///
/// Shallow equality (as used by the map diff and by `update_props` change detection) is plain [`PartialEq`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Number(f64),
	Str(String),
	List(Vec<Value>),
	Map(HashMap<String, Value>),
}

impl Value {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}
}

/// Renders the attribute form of the value: the string a render surface receives from `set_attribute`.
///
/// Whole numbers print without a trailing `.0`, [`Value::Null`] prints as the empty string.
impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => Ok(()),
			Value::Bool(b) => write!(f, "{}", b),
			Value::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
			Value::Number(n) => write!(f, "{}", n),
			Value::Str(s) => f.write_str(s),
			Value::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{}", item)?;
				}
				Ok(())
			}
			Value::Map(map) => {
				let mut keys: Vec<_> = map.keys().collect();
				keys.sort();
				f.write_str("{")?;
				for (i, key) in keys.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{}:{}", key, map[*key])?;
				}
				f.write_str("}")
			}
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}

impl From<i64> for Value {
	#[allow(clippy::cast_precision_loss)]
	fn from(n: i64) -> Self {
		Value::Number(n as f64)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}
