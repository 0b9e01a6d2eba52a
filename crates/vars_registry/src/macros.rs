//! Declaration macro for registry types.

/// Builds the [`FieldDecl`](crate::FieldDecl) of one `context_vars!` field.
#[doc(hidden)]
#[macro_export]
macro_rules! __ctxvars_field {
	($field:ident, $ty:ty) => {
		$crate::FieldDecl::new(stringify!($field)).typed(stringify!($ty))
	};
	($field:ident, $ty:ty, = $default:expr) => {
		$crate::FieldDecl::new(stringify!($field))
			.typed(stringify!($ty))
			.value({
				let value: $ty = ::core::convert::Into::into($default);
				$crate::Value::from(value)
			})
	};
	($field:ident, $ty:ty, => $deferred:expr) => {
		$crate::FieldDecl::new(stringify!($field))
			.typed(stringify!($ty))
			.deferred(|| {
				let value: $ty = ::core::convert::Into::into(($deferred)());
				$crate::Value::from(value)
			})
	};
}

/// Declares a registry type whose fields are context-local variables.
///
/// This macro generates:
/// - A struct wrapping a [`Registry`](crate::Registry), dereferencing to it
/// - A [`ContextVars`](crate::ContextVars) impl whose schema is built on first use
/// - One method per field returning its [`TypedAccessor`](crate::TypedAccessor)
///
/// A field may carry a static default (`= expr`) or a deferred default
/// (`=> producer`), evaluated once per context on first read. Appending
/// `: dynamic = false` to the type name forbids writes to undeclared names.
///
/// # Example
///
/// ```ignore
/// context_vars! {
///     pub struct RequestVars {
///         locale: String = "en",
///         timezone: String = "UTC",
///         user_id: Option<i64>,
///         request_id: String => || next_request_id(),
///     }
/// }
///
/// let vars = RequestVars::new();
/// vars.user_id().set(Some(42));
/// assert_eq!(vars.locale().get()?, "en");
/// vars.set("trace", true)?; // dynamic slot
/// ```
///
/// # Panics
///
/// The first use of the type panics if a field name is reserved (see
/// [`is_reserved`](crate::decl::is_reserved)).
#[macro_export]
macro_rules! context_vars {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident $(: dynamic = $dynamic:literal)? {
			$(
				$(#[$field_meta:meta])*
				$field:ident : $ty:ty $(= $default:expr)? $(=> $deferred:expr)?
			),* $(,)?
		}
	) => {
		$(#[$meta])*
		$vis struct $name {
			registry: $crate::Registry,
		}

		impl $crate::ContextVars for $name {
			fn schema() -> &'static ::std::sync::Arc<$crate::Schema> {
				static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::Schema>> =
					::std::sync::OnceLock::new();
				SCHEMA.get_or_init(|| {
					let builder = $crate::Schema::builder(stringify!($name))
						$(.field($crate::__ctxvars_field!($field, $ty $(, = $default)? $(, => $deferred)?)))*;
					$(let builder = builder.dynamic_allocation($dynamic);)?
					match builder.build() {
						Ok(schema) => schema,
						Err(err) => panic!("invalid context_vars! declaration: {err}"),
					}
				})
			}
		}

		impl $name {
			/// Returns a handle on the variables of the current context.
			$vis fn new() -> Self {
				Self {
					registry: <Self as $crate::ContextVars>::registry(),
				}
			}

			$(
				$(#[$field_meta])*
				$vis fn $field(&self) -> $crate::TypedAccessor<$ty> {
					match self.registry.typed::<$ty>(stringify!($field)) {
						Some(accessor) => accessor,
						None => unreachable!(concat!("declared field `", stringify!($field), "` has no slot")),
					}
				}
			)*
		}

		impl ::core::default::Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl ::core::ops::Deref for $name {
			type Target = $crate::Registry;

			fn deref(&self) -> &$crate::Registry {
				&self.registry
			}
		}
	};
}
