//! Tuples as reflected value types
//!
//! A Rust tuple of up to four value types is registered as
//! ``System.Tuple`N[..]`` with one constructor taking every item and two
//! static methods for positional access on a boxed tuple:
//!
//! - `GetItem(tuple, index)` boxes a copy of the item at `index`
//! - `SetItem(tuple, index, value)` overwrites that item inside the box
//!
//! Positions are zero-based.

use std::fmt;
use std::hash::Hasher;

use crate::convert::{FromObject, IntoObject, ValueType};
use crate::error::{ReflectionError, ReflectionResult};
use crate::object::Object;
use crate::reflection::{Reflected, Type, TypeBuilder};

/// Positional access to the items of a tuple
trait Items: Reflected {
    fn get(&self, index: i32) -> Option<ReflectionResult<Object>>;
    fn set(&mut self, index: i32, value: &Object) -> Option<ReflectionResult<()>>;
}

fn out_of_range(tuple: &Object, index: i32) -> ReflectionError {
    ReflectionError::IndexOutOfRange {
        type_name: tuple.type_name(),
        index,
    }
}

fn get_item<T: Items>(tuple: Object, index: i32) -> ReflectionResult<Object> {
    tuple
        .with_instance(|items: &T| items.get(index))?
        .unwrap_or_else(|| Err(out_of_range(&tuple, index)))
}

fn set_item<T: Items>(tuple: Object, index: i32, value: Object) -> ReflectionResult<()> {
    tuple
        .with_instance_mut(|items: &mut T| items.set(index, &value))?
        .unwrap_or_else(|| Err(out_of_range(&tuple, index)))
}

/// Prints an item through [`ValueType::fmt_value`]
struct Shown<'a, T>(&'a T);

impl<T: ValueType> fmt::Debug for Shown<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_value(f)
    }
}

macro_rules! tuple_types {
    ($($len:literal => ($($el:ident $item:ident $idx:tt),+)),+ $(,)?) => {$(
        impl<$($el),+> Reflected for ($($el,)+)
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn build_type() -> ReflectionResult<Type> {
                let arguments = [$($el::try_type_of()?.full_name().to_string()),+];
                let name = format!("Tuple`{}[{}]", $len, arguments.join(","));
                TypeBuilder::<($($el,)+)>::new("System", name)
                    $(.with_generic_argument::<$el>())+
                    .with_constructor(|$($item: $el),+| ($($item,)+), &[$(stringify!($item)),+])
                    .with_static_method("GetItem", get_item::<($($el,)+)>, &["tuple", "index"])
                    .with_static_method("SetItem", set_item::<($($el,)+)>, &["tuple", "index", "value"])
                    .build()
            }
        }

        impl<$($el),+> Items for ($($el,)+)
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn get(&self, index: i32) -> Option<ReflectionResult<Object>> {
                match index {
                    $($idx => Some(self.$idx.clone().into_object()),)+
                    _ => None,
                }
            }

            fn set(&mut self, index: i32, value: &Object) -> Option<ReflectionResult<()>> {
                match index {
                    $($idx => Some($el::from_object(value).map(|value| self.$idx = value)),)+
                    _ => None,
                }
            }
        }

        impl<$($el),+> ValueType for ($($el,)+)
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple("")$(.field(&Shown(&self.$idx)))+.finish()
            }

            fn hash_value(&self, state: &mut dyn Hasher) {
                state.write_usize($len);
                $(self.$idx.hash_value(state);)+
            }
        }

        impl<$($el),+> FromObject for ($($el,)+)
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn parameter_type() -> ReflectionResult<Type> {
                Self::try_type_of()
            }

            fn from_object(object: &Object) -> ReflectionResult<Self> {
                object.unbox::<Self>()
            }
        }

        impl<$($el),+> IntoObject for ($($el,)+)
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn return_type() -> ReflectionResult<Type> {
                Self::try_type_of()
            }

            fn into_object(self) -> ReflectionResult<Object> {
                Object::try_boxed(self)
            }
        }

        impl<$($el),+> From<($($el,)+)> for Object
        where
            $($el: ValueType + FromObject + IntoObject,)+
        {
            fn from(value: ($($el,)+)) -> Self {
                Object::boxed(value)
            }
        }
    )+};
}

tuple_types! {
    1 => (A item1 0),
    2 => (A item1 0, B item2 1),
    3 => (A item1 0, B item2 1, C item3 2),
    4 => (A item1 0, B item2 1, C item3 2, D item4 3),
}
