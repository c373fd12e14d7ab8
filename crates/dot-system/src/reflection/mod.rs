//! Runtime type metadata
//!
//! Every reflectable Rust type implements [`Reflected`]. Its
//! [`build_type`](Reflected::build_type) describes the type once with a
//! [`TypeBuilder`]; the process-wide [`TypeRegistry`] runs it at most once
//! and hands out the sealed [`Type`] afterwards.
//!
//! ```ignore
//! impl Reflected for Sample {
//!     fn build_type() -> ReflectionResult<Type> {
//!         TypeBuilder::<Sample>::new("Dot.Test", "Sample")
//!             .is_class()
//!             .with_field("name", |s: &Sample| &s.name, |s: &mut Sample| &mut s.name)
//!             .with_constructor(|| Ptr::new(Sample::default()), &[])
//!             .with_method("add", Sample::add, &["a", "b"])
//!             .build()
//!     }
//! }
//! ```

mod activator;
mod enums;
mod invoke;
mod member_info;
pub(crate) mod registry;
mod type_builder;
mod type_info;

pub use activator::Activator;
pub use enums::{Enum, EnumType};
pub use invoke::{InstanceMethod, Mut, Ref, StaticMethod};
pub use member_info::{ConstructorInfo, FieldInfo, MethodInfo, ParameterInfo};
pub use registry::TypeRegistry;
pub use type_builder::TypeBuilder;
pub use type_info::Type;

use std::any::Any;

use crate::error::ReflectionResult;

/// A Rust type with runtime metadata
pub trait Reflected: Any + Send + Sync + Sized {
    /// Describe the type. Runs at most once per process, from inside
    /// [`type_of`]; do not call it directly.
    fn build_type() -> ReflectionResult<Type>;

    /// The sealed descriptor of this type
    fn type_of() -> Type {
        type_of::<Self>()
    }

    /// The sealed descriptor, or the error the registration produced
    fn try_type_of() -> ReflectionResult<Type> {
        try_type_of::<Self>()
    }
}

/// Descriptor of `T`, building it on first use.
///
/// # Panics
///
/// Panics when the registration of `T` is malformed. Use [`try_type_of`] to
/// get the registration error instead.
pub fn type_of<T: Reflected>() -> Type {
    match try_type_of::<T>() {
        Ok(ty) => ty,
        Err(err) => panic!("{err}"),
    }
}

/// Descriptor of `T`, or the error its registration produced
pub fn try_type_of<T: Reflected>() -> ReflectionResult<Type> {
    TypeRegistry::global().resolve::<T>()
}
