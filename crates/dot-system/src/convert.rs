//! Conversions between Rust values and [`Object`]
//!
//! [`FromObject`] and [`IntoObject`] are the argument and return protocol of
//! every reflective call. Each implementation also reports the static type
//! used in parameter, field and return descriptors.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ReflectionResult;
use crate::object::{Object, Ptr};
use crate::reflection::{Reflected, Type, TypeBuilder, TypeRegistry};

/// A type that is copied into a box rather than shared by reference.
///
/// Implement it with [`value_type!`](crate::value_type), which also provides
/// the conversion impls.
pub trait ValueType: Reflected + Clone + PartialEq + fmt::Debug {
    /// Text of a boxed value. Defaults to the full type name.
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TypeRegistry::global().name_of::<Self>())
    }

    /// Feed the value to a hasher, consistently with `PartialEq`. The
    /// default feeds nothing, so equal boxes of one type share a hash.
    fn hash_value(&self, _state: &mut dyn Hasher) {}
}

/// Extract a typed value from an [`Object`]
pub trait FromObject: Sized {
    /// Declared type of a parameter or field of this Rust type
    fn parameter_type() -> ReflectionResult<Type>;

    /// Convert, failing with a type mismatch unless the object holds exactly `Self`
    fn from_object(object: &Object) -> ReflectionResult<Self>;
}

/// Wrap a typed value in an [`Object`]
pub trait IntoObject {
    /// Declared type of a return value of this Rust type
    fn return_type() -> ReflectionResult<Type>;

    /// Box the value. An `Err` returned by a fallible method passes through.
    fn into_object(self) -> ReflectionResult<Object>;
}

/// Mark one or more [`Reflected`] types as boxable value types.
///
/// A box of such a type displays as its full type name; enums display as
/// the variant name.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color { Red, Green }
///
/// impl Reflected for Color { /* ... */ }
/// dot_system::value_type!(Color);
/// ```
#[macro_export]
macro_rules! value_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::ValueType for $ty {}

        $crate::__object_conversions!($ty);
    )+};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __object_conversions {
    ($ty:ty) => {
        impl $crate::FromObject for $ty {
            fn parameter_type() -> $crate::ReflectionResult<$crate::Type> {
                <$ty as $crate::Reflected>::try_type_of()
            }

            fn from_object(object: &$crate::Object) -> $crate::ReflectionResult<Self> {
                object.unbox::<$ty>()
            }
        }

        impl $crate::IntoObject for $ty {
            fn return_type() -> $crate::ReflectionResult<$crate::Type> {
                <$ty as $crate::Reflected>::try_type_of()
            }

            fn into_object(self) -> $crate::ReflectionResult<$crate::Object> {
                $crate::Object::try_boxed(self)
            }
        }

        impl ::core::convert::From<$ty> for $crate::Object {
            fn from(value: $ty) -> Self {
                $crate::Object::boxed(value)
            }
        }
    };
}

/// [`ValueType`] for types whose boxes print through `Display` and hash
/// through `Hash`
macro_rules! displayed_value_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::convert::ValueType for $ty {
            fn fmt_value(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(self, f)
            }

            fn hash_value(&self, mut state: &mut dyn ::std::hash::Hasher) {
                ::std::hash::Hash::hash(self, &mut state);
            }
        }
    )+};
}

pub(crate) use displayed_value_type;

macro_rules! primitive_types {
    ($($ty:ty => $name:literal),+ $(,)?) => {$(
        impl Reflected for $ty {
            fn build_type() -> ReflectionResult<Type> {
                TypeBuilder::<$ty>::new("System", $name).build()
            }
        }

        crate::__object_conversions!($ty);
    )+};
}

primitive_types! {
    bool => "Boolean",
    char => "Char",
    i8 => "SByte",
    i16 => "Int16",
    i32 => "Int32",
    i64 => "Int64",
    u8 => "Byte",
    u16 => "UInt16",
    u32 => "UInt32",
    u64 => "UInt64",
    f32 => "Single",
    f64 => "Double",
    String => "String",
}

displayed_value_type!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, String);

macro_rules! float_value_types {
    ($($ty:ty),+) => {$(
        impl ValueType for $ty {
            fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }

            fn hash_value(&self, state: &mut dyn Hasher) {
                // 0.0 == -0.0
                let bits = if *self == 0.0 { 0 } else { self.to_bits() };
                state.write_u64(bits.into());
            }
        }
    )+};
}

float_value_types!(f32, f64);

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::boxed(value.to_string())
    }
}

// System.Object: accepts any argument as-is.

impl Reflected for Object {
    fn build_type() -> ReflectionResult<Type> {
        TypeBuilder::<Object>::new("System", "Object").is_class().build()
    }
}

impl FromObject for Object {
    fn parameter_type() -> ReflectionResult<Type> {
        Object::try_type_of()
    }

    fn from_object(object: &Object) -> ReflectionResult<Self> {
        Ok(object.clone())
    }
}

impl IntoObject for Object {
    fn return_type() -> ReflectionResult<Type> {
        Object::try_type_of()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        Ok(self)
    }
}

// System.Void: methods without a result return null.

impl Reflected for () {
    fn build_type() -> ReflectionResult<Type> {
        TypeBuilder::<()>::new("System", "Void").build()
    }
}

impl IntoObject for () {
    fn return_type() -> ReflectionResult<Type> {
        <()>::try_type_of()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        Ok(Object::null())
    }
}

// Fallible methods: the declared return type is that of the success value.

impl<T: IntoObject> IntoObject for ReflectionResult<T> {
    fn return_type() -> ReflectionResult<Type> {
        T::return_type()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        self?.into_object()
    }
}

// Reference types travel as shared handles.

impl<T: Reflected> FromObject for Ptr<T> {
    fn parameter_type() -> ReflectionResult<Type> {
        T::try_type_of()
    }

    fn from_object(object: &Object) -> ReflectionResult<Self> {
        object.downcast::<T>()
    }
}

impl<T: Reflected> IntoObject for Ptr<T> {
    fn return_type() -> ReflectionResult<Type> {
        T::try_type_of()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        Object::try_from_ptr(self)
    }
}

// Nullable value types: `None` boxes to null, `Some(v)` boxes `v` itself.

impl<T: ValueType> Reflected for Option<T> {
    fn build_type() -> ReflectionResult<Type> {
        let name = format!("Nullable`1[{}]", T::try_type_of()?.full_name());
        TypeBuilder::<Option<T>>::new("System", name)
            .with_generic_argument::<T>()
            .build()
    }
}

impl<T: ValueType> FromObject for Option<T> {
    fn parameter_type() -> ReflectionResult<Type> {
        Self::try_type_of()
    }

    fn from_object(object: &Object) -> ReflectionResult<Self> {
        if object.is_null() {
            return Ok(None);
        }
        object.unbox::<T>().map(Some)
    }
}

impl<T: ValueType> IntoObject for Option<T> {
    fn return_type() -> ReflectionResult<Type> {
        Self::try_type_of()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        self.map_or_else(|| Ok(Object::null()), Object::try_boxed)
    }
}

impl<T: ValueType> From<Option<T>> for Object {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Object::null, Object::boxed)
    }
}

// Lists are boxed by value.

impl<T: ValueType> Reflected for Vec<T> {
    fn build_type() -> ReflectionResult<Type> {
        let name = format!("List`1[{}]", T::try_type_of()?.full_name());
        TypeBuilder::<Vec<T>>::new("System.Collections.Generic", name)
            .with_generic_argument::<T>()
            .build()
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn hash_value(&self, state: &mut dyn Hasher) {
        state.write_usize(self.len());
        for item in self {
            item.hash_value(state);
        }
    }
}

impl<T: ValueType> FromObject for Vec<T> {
    fn parameter_type() -> ReflectionResult<Type> {
        Self::try_type_of()
    }

    fn from_object(object: &Object) -> ReflectionResult<Self> {
        object.unbox::<Vec<T>>()
    }
}

impl<T: ValueType> IntoObject for Vec<T> {
    fn return_type() -> ReflectionResult<Type> {
        Self::try_type_of()
    }

    fn into_object(self) -> ReflectionResult<Object> {
        Object::try_boxed(self)
    }
}

impl<T: ValueType> From<Vec<T>> for Object {
    fn from(value: Vec<T>) -> Self {
        Object::boxed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflectionError;

    #[test]
    fn test_primitive_type_names() {
        assert_eq!(bool::type_of().full_name(), "System.Boolean");
        assert_eq!(f64::type_of().full_name(), "System.Double");
        assert_eq!(String::type_of().name(), "String");
        assert!(!i32::type_of().is_class());
        assert!(Object::type_of().is_class());
    }

    #[test]
    fn test_str_boxes_as_string() {
        let obj = Object::from("abc");
        assert_eq!(obj.unbox::<String>(), Ok("abc".to_string()));
    }

    #[test]
    fn test_nullable() {
        assert!(Object::from(None::<i32>).is_null());

        let some = Object::from(Some(3));
        assert_eq!(some.type_name(), "System.Int32");
        assert_eq!(Option::<i32>::from_object(&some), Ok(Some(3)));
        assert_eq!(Option::<i32>::from_object(&Object::null()), Ok(None));
        assert!(Option::<i32>::from_object(&Object::from(3.0)).is_err());

        let ty = Option::<i32>::type_of();
        assert_eq!(ty.full_name(), "System.Nullable`1[System.Int32]");
        assert_eq!(ty.get_generic_arguments(), &[i32::type_of()]);
    }

    #[test]
    fn test_list_boxing() {
        let obj = Object::from(vec![1.0, 2.5]);
        assert_eq!(
            obj.type_name(),
            "System.Collections.Generic.List`1[System.Double]"
        );
        assert_eq!(obj.unbox::<Vec<f64>>(), Ok(vec![1.0, 2.5]));
        assert!(matches!(
            obj.unbox::<Vec<i32>>(),
            Err(ReflectionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unit_returns_null() {
        assert!(().into_object().unwrap().is_null());
        assert_eq!(<()>::return_type().unwrap().full_name(), "System.Void");
    }

    #[test]
    fn test_result_passes_errors_through() {
        let ok: ReflectionResult<i32> = Ok(4);
        assert_eq!(ok.into_object().unwrap().unbox::<i32>(), Ok(4));
        assert_eq!(
            ReflectionResult::<i32>::return_type().unwrap().full_name(),
            "System.Int32"
        );

        let failed: ReflectionResult<i32> = Err(ReflectionError::NullReference);
        assert_eq!(failed.into_object(), Err(ReflectionError::NullReference));
    }

    #[test]
    fn test_unsigned_sixteen() {
        let boxed = Object::from(65_535u16);
        assert_eq!(boxed.type_name(), "System.UInt16");
        assert_eq!(boxed.unbox::<u16>(), Ok(u16::MAX));
        assert!(boxed.unbox::<i16>().is_err());
    }

    #[test]
    fn test_display_of_boxes() {
        assert_eq!(Object::from(42).to_string(), "42");
        assert_eq!(Object::from("text").to_string(), "text");
        assert_eq!(Object::from(2.5).to_string(), "2.5");
        assert_eq!(
            Object::from(vec![1, 2]).to_string(),
            "System.Collections.Generic.List`1[System.Int32]"
        );
    }

    #[test]
    fn test_signed_zero_hashes_alike() {
        assert_eq!(Object::from(0.0), Object::from(-0.0));
        assert_eq!(Object::from(0.0).hash_code(), Object::from(-0.0).hash_code());
    }

    #[test]
    fn test_object_passes_through() {
        let obj = Object::from(9);
        assert!(Object::reference_equals(&Object::from_object(&obj).unwrap(), &obj));
    }
}
