//! Erasure of Rust callables into [`Invoker`] closures
//!
//! One generic adapter per arity turns a function with concrete parameter
//! types into `Fn(&Object, &[Object]) -> ReflectionResult<Object>`. The
//! marker parameter keeps the `&T`, `&mut T` and static shapes apart so a
//! plain method path such as `Sample::add` selects its adapter without
//! annotations.
//!
//! Arguments are unboxed in order, inside the invoker. The caller checks the
//! argument count beforehand.

use std::any::Any;
use std::sync::Arc;

use super::member_info::Invoker;
use super::type_info::Type;
use crate::convert::{FromObject, IntoObject};
use crate::error::ReflectionResult;
use crate::object::Object;

/// Marker for methods taking `&self`
pub struct Ref;

/// Marker for methods taking `&mut self`
pub struct Mut;

/// A callable usable as an instance method of `T`
pub trait InstanceMethod<T, Marker>: Send + Sync + 'static {
    fn parameter_types() -> ReflectionResult<Vec<Type>>;
    fn return_type() -> ReflectionResult<Type>;
    fn into_invoker(self) -> Invoker;
}

/// A callable usable as a static method or constructor
pub trait StaticMethod<Marker>: Send + Sync + 'static {
    fn parameter_types() -> ReflectionResult<Vec<Type>>;
    fn return_type() -> ReflectionResult<Type>;
    fn into_invoker(self) -> Invoker;
}

macro_rules! impl_invokers {
    ($($arg:ident $idx:tt),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<T, F, R, $($arg),*> InstanceMethod<T, (Ref, R, ($($arg,)*))> for F
        where
            T: Any + Send + Sync,
            F: Fn(&T $(, $arg)*) -> R + Send + Sync + 'static,
            R: IntoObject,
            $($arg: FromObject,)*
        {
            fn parameter_types() -> ReflectionResult<Vec<Type>> {
                Ok(vec![$(<$arg as FromObject>::parameter_type()?),*])
            }

            fn return_type() -> ReflectionResult<Type> {
                R::return_type()
            }

            fn into_invoker(self) -> Invoker {
                Arc::new(move |target: &Object, args: &[Object]| -> ReflectionResult<Object> {
                    $(let $arg = <$arg as FromObject>::from_object(&args[$idx])?;)*
                    target
                        .with_instance(|this: &T| (self)(this $(, $arg)*))
                        .and_then(IntoObject::into_object)
                })
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<T, F, R, $($arg),*> InstanceMethod<T, (Mut, R, ($($arg,)*))> for F
        where
            T: Any + Send + Sync,
            F: Fn(&mut T $(, $arg)*) -> R + Send + Sync + 'static,
            R: IntoObject,
            $($arg: FromObject,)*
        {
            fn parameter_types() -> ReflectionResult<Vec<Type>> {
                Ok(vec![$(<$arg as FromObject>::parameter_type()?),*])
            }

            fn return_type() -> ReflectionResult<Type> {
                R::return_type()
            }

            fn into_invoker(self) -> Invoker {
                Arc::new(move |target: &Object, args: &[Object]| -> ReflectionResult<Object> {
                    $(let $arg = <$arg as FromObject>::from_object(&args[$idx])?;)*
                    target
                        .with_instance_mut(|this: &mut T| (self)(this $(, $arg)*))
                        .and_then(IntoObject::into_object)
                })
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<F, R, $($arg),*> StaticMethod<(R, ($($arg,)*))> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoObject,
            $($arg: FromObject,)*
        {
            fn parameter_types() -> ReflectionResult<Vec<Type>> {
                Ok(vec![$(<$arg as FromObject>::parameter_type()?),*])
            }

            fn return_type() -> ReflectionResult<Type> {
                R::return_type()
            }

            fn into_invoker(self) -> Invoker {
                Arc::new(move |_target: &Object, args: &[Object]| -> ReflectionResult<Object> {
                    $(let $arg = <$arg as FromObject>::from_object(&args[$idx])?;)*
                    (self)($($arg),*).into_object()
                })
            }
        }
    };
}

impl_invokers!();
impl_invokers!(A0 0);
impl_invokers!(A0 0, A1 1);
impl_invokers!(A0 0, A1 1, A2 2);
impl_invokers!(A0 0, A1 1, A2 2, A3 3);
impl_invokers!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_invokers!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_invokers!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_invokers!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);
