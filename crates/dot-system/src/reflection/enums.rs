//! Enum metadata
//!
//! A Rust enum becomes reflectable as a value type whose descriptor carries
//! the name and boxed value of each variant. Boxed enums follow the usual
//! exact unboxing rule, so a value of one enum never unboxes as another even
//! when both share a discriminant.

use crate::convert::ValueType;
use crate::error::{ReflectionError, ReflectionResult};
use crate::object::Object;

use super::type_info::Type;

/// A fieldless enum with named variants
pub trait EnumType: ValueType + Copy {
    /// Every variant with its name, in declaration order
    fn variants() -> &'static [(&'static str, Self)];
}

#[derive(Debug, Clone)]
pub(crate) struct EnumValue {
    pub(crate) name: String,
    pub(crate) value: Object,
}

/// Name/value lookups over enum descriptors
pub struct Enum;

impl Enum {
    fn values(ty: &Type) -> ReflectionResult<&[EnumValue]> {
        if !ty.is_enum() {
            return Err(ReflectionError::NotAnEnum(ty.full_name().to_string()));
        }
        Ok(ty.enum_values())
    }

    /// Boxed variant of `ty` named `name`
    pub fn parse(ty: &Type, name: &str) -> ReflectionResult<Object> {
        Enum::values(ty)?
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| ReflectionError::UnknownEnumValue {
                type_name: ty.full_name().to_string(),
                value: name.to_string(),
            })
    }

    /// Variant names in declaration order
    pub fn get_names(ty: &Type) -> ReflectionResult<Vec<String>> {
        Ok(Enum::values(ty)?
            .iter()
            .map(|entry| entry.name.clone())
            .collect())
    }

    /// Name of a boxed variant, `None` for non-enum objects
    pub fn get_name(value: &Object) -> Option<String> {
        let ty = value.get_type()?;
        Enum::values(&ty)
            .ok()?
            .iter()
            .find(|entry| entry.value == *value)
            .map(|entry| entry.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{Reflected, TypeBuilder};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Suit {
        Hearts,
        Spades,
    }

    impl Reflected for Suit {
        fn build_type() -> ReflectionResult<Type> {
            TypeBuilder::<Suit>::new("Dot.Test.Enums", "Suit")
                .with_enum_values()
                .build()
        }
    }

    impl EnumType for Suit {
        fn variants() -> &'static [(&'static str, Self)] {
            &[("Hearts", Suit::Hearts), ("Spades", Suit::Spades)]
        }
    }

    crate::value_type!(Suit);

    #[test]
    fn test_parse() {
        let ty = Suit::type_of();
        assert!(ty.is_enum());
        assert!(!ty.is_class());
        let spades = Enum::parse(&ty, "Spades").unwrap();
        assert_eq!(spades.unbox::<Suit>(), Ok(Suit::Spades));
        assert_eq!(
            Enum::parse(&ty, "Clubs"),
            Err(ReflectionError::UnknownEnumValue {
                type_name: "Dot.Test.Enums.Suit".to_string(),
                value: "Clubs".to_string(),
            })
        );
    }

    #[test]
    fn test_names() {
        let ty = Suit::type_of();
        assert_eq!(Enum::get_names(&ty), Ok(vec!["Hearts".to_string(), "Spades".to_string()]));
        assert_eq!(Enum::get_name(&Object::from(Suit::Hearts)), Some("Hearts".to_string()));
        assert_eq!(Enum::get_name(&Object::from(1)), None);
        assert_eq!(Enum::get_name(&Object::null()), None);
    }

    #[test]
    fn test_not_an_enum() {
        assert_eq!(
            Enum::get_names(&i32::type_of()),
            Err(ReflectionError::NotAnEnum("System.Int32".to_string()))
        );
    }
}
