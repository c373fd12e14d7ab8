//! Boxing and runtime reflection modelled on the .NET base class library
//!
//! - [`Object`]: uniform handle holding null, a boxed value or a shared reference
//! - [`Type`]: immutable runtime descriptor, built once per type by a [`TypeBuilder`]
//! - [`FieldInfo`], [`MethodInfo`], [`ConstructorInfo`]: type-erased member access
//! - [`Activator`]: construction by matching boxed arguments against constructors
//! - [`TypeRegistry`]: process-wide lookup by name
//!
//! # Example
//!
//! ```ignore
//! use dot_system::{Activator, Object, Ptr, Reflected, ReflectionResult, Type, TypeBuilder};
//!
//! #[derive(Default)]
//! struct Sample { value: i32 }
//!
//! impl Sample {
//!     fn add(&self, a: i32, b: i32) -> i32 { a + b }
//! }
//!
//! impl Reflected for Sample {
//!     fn build_type() -> ReflectionResult<Type> {
//!         TypeBuilder::<Sample>::new("Dot.Test", "Sample")
//!             .is_class()
//!             .with_field("value", |s: &Sample| &s.value, |s: &mut Sample| &mut s.value)
//!             .with_constructor(|| Ptr::new(Sample::default()), &[])
//!             .with_method("add", Sample::add, &["a", "b"])
//!             .build()
//!     }
//! }
//!
//! let sample = Activator::create_instance(&Sample::type_of())?;
//! let sum = Sample::type_of()
//!     .get_method("add")
//!     .unwrap()
//!     .invoke(&sample, &[Object::from(3), Object::from(4)])?;
//! assert_eq!(sum.unbox::<i32>()?, 7);
//! ```

pub mod convert;
pub mod error;
pub mod noda_time;
pub mod object;
pub mod reflection;
mod tuple;

pub use convert::{FromObject, IntoObject, ValueType};
pub use error::{ReflectionError, ReflectionResult};
pub use noda_time::{DateTimeError, LocalDate, LocalDateTime, LocalMinute, LocalTime, Period};
pub use object::{Object, ObjectKind, Ptr};
pub use reflection::{
    try_type_of, type_of, Activator, ConstructorInfo, Enum, EnumType, FieldInfo, MethodInfo,
    ParameterInfo, Reflected, Type, TypeBuilder, TypeRegistry,
};
