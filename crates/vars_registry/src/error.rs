use ctxvars_context::TokenError;

/// Errors raised by slot access and schema construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// A slot has no resolvable value: nothing stored, no default, or deleted.
	#[error("context variable '{name}' is not set")]
	NotSet { name: String },

	/// Attribute-level form of [`Error::NotSet`], also raised for unknown names.
	#[error("'{type_name}' has no attribute '{name}'")]
	MissingAttribute { type_name: String, name: String },

	/// Write to an unknown name while dynamic allocation is disabled.
	#[error("can't set undeclared attribute '{type_name}.{name}': dynamic allocation is disabled")]
	UndeclaredAttribute { type_name: String, name: String },

	/// A reserved or excluded name was used as a slot.
	#[error("can't use '{type_name}.{name}' as a context variable: {reason}")]
	ReservedAttribute {
		type_name: String,
		name: String,
		reason: &'static str,
	},

	/// Invalid re-declaration of a slot name across declaring types.
	#[error("'{type_name}.{name}' conflicts with the slot inherited from '{parent}'")]
	Inheritance {
		type_name: String,
		name: String,
		parent: String,
	},

	/// The stored value does not have the type a typed accessor expects.
	#[error("context variable '{name}' holds {got}, expected {expected}")]
	TypeMismatch {
		name: String,
		expected: &'static str,
		got: &'static str,
	},

	/// An undo token could not be applied.
	#[error(transparent)]
	Token(#[from] TokenError),
}

impl Error {
	/// Returns true for the missing-value condition, in either its slot-level or
	/// attribute-level form.
	pub fn is_missing(&self) -> bool {
		matches!(self, Error::NotSet { .. } | Error::MissingAttribute { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
