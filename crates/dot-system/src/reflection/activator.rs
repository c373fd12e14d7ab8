//! Generic construction from boxed arguments
//!
//! Constructors are tried in registration order and the first whose
//! parameter type names equal the arguments' runtime type names, position by
//! position, is invoked. There is no widening: an `Int32` argument does not
//! match a `Double` parameter.

use tracing::trace;

use super::type_info::Type;
use super::Reflected;
use crate::error::{ReflectionError, ReflectionResult};
use crate::object::Object;

pub struct Activator;

impl Activator {
    /// Invoke the parameterless constructor of `ty`
    pub fn create_instance(ty: &Type) -> ReflectionResult<Object> {
        Activator::create_instance_with(ty, &[])
    }

    /// Invoke the first constructor of `ty` matching `args`
    pub fn create_instance_with(ty: &Type, args: &[Object]) -> ReflectionResult<Object> {
        let constructors = ty.get_constructors();
        if constructors.is_empty() {
            return Err(ReflectionError::NoConstructors(ty.full_name().to_string()));
        }
        let constructor = constructors
            .iter()
            .find(|constructor| constructor.accepts(args))
            .ok_or_else(|| ReflectionError::NoMatchingConstructor(ty.full_name().to_string()))?;
        trace!(type_name = %ty, ?constructor, "constructor selected");
        constructor.invoke(args)
    }

    /// Resolve `type_name` in the registry and construct it without
    /// arguments. Assemblies are not modelled; `assembly_name` is ignored.
    pub fn create_instance_by_name(assembly_name: &str, type_name: &str) -> ReflectionResult<Object> {
        Activator::create_instance_by_name_with(assembly_name, type_name, &[])
    }

    /// Resolve `type_name` in the registry and construct it from `args`
    pub fn create_instance_by_name_with(
        _assembly_name: &str,
        type_name: &str,
        args: &[Object],
    ) -> ReflectionResult<Object> {
        let ty = Type::get_type(type_name)?;
        Activator::create_instance_with(&ty, args)
    }

    /// Construct a `T` from `args`
    pub fn create_instance_of<T: Reflected>(args: &[Object]) -> ReflectionResult<Object> {
        Activator::create_instance_with(&T::try_type_of()?, args)
    }
}
