//! Fluent builder for type descriptors
//!
//! [`TypeBuilder::new`] registers an empty shell for `T` right away, under
//! its full name, its simple name and its Rust type name, so members can
//! mention `T` itself while it is being described. [`TypeBuilder::build`]
//! seals the shell: fields and methods of the base type come first, then
//! the type's own.
//!
//! Problems found while chaining are remembered and reported by `build`,
//! including members whose types cannot be registered themselves. A builder
//! that is dropped without sealing, whether through an error or a panic,
//! withdraws its shell from the registry.

use std::any::{type_name, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use super::enums::{EnumType, EnumValue};
use super::invoke::{InstanceMethod, StaticMethod};
use super::member_info::{ConstructorInfo, FieldInfo, MethodInfo, ParameterInfo};
use super::registry::{ConstructionGuard, TypeRegistry};
use super::type_info::{Type, TypeMembers, Upcast};
use super::Reflected;
use crate::convert::{FromObject, IntoObject};
use crate::error::{ReflectionError, ReflectionResult};
use crate::object::Object;

/// Accumulates the shape of `T` and seals it into a [`Type`]
pub struct TypeBuilder<T> {
    shell: Type,
    is_class: bool,
    is_enum: bool,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    constructors: Vec<ConstructorInfo>,
    interfaces: Vec<Type>,
    generic_arguments: Vec<Type>,
    base: Option<Type>,
    upcast: Option<Upcast>,
    enum_values: Vec<EnumValue>,
    error: Option<ReflectionError>,
    _guard: ConstructionGuard,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflected> TypeBuilder<T> {
    /// Start describing `T` as `namespace.name`
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let shell = Type::shell(namespace.into(), name.into(), TypeId::of::<T>());
        let guard = TypeRegistry::global().begin(&shell, type_name::<T>());
        let mut builder = TypeBuilder {
            shell,
            is_class: false,
            is_enum: false,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            generic_arguments: Vec::new(),
            base: None,
            upcast: None,
            enum_values: Vec::new(),
            error: None,
            _guard: guard,
            _marker: PhantomData,
        };
        if builder.shell.name().is_empty() {
            builder.fail("type name must not be empty");
        }
        builder
    }

    fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(ReflectionError::registration(self.shell.full_name(), message));
        }
    }

    /// Unwrap the descriptor of a type `member` depends on, recording the
    /// failure otherwise
    fn require<V>(&mut self, member: &str, resolved: ReflectionResult<V>) -> Option<V> {
        match resolved {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(format!("{member} depends on a type that failed to register ({err})"));
                None
            }
        }
    }

    fn parameters(&mut self, member: &str, types: Vec<Type>, names: &[&str]) -> Vec<ParameterInfo> {
        if types.len() != names.len() {
            self.fail(format!(
                "{member} takes {} parameters but {} names were given",
                types.len(),
                names.len()
            ));
        }
        if names.iter().any(|name| name.is_empty()) {
            self.fail(format!("{member} has an empty parameter name"));
        }
        types
            .into_iter()
            .zip(names)
            .enumerate()
            .map(|(position, (ty, name))| ParameterInfo::new(name, ty, position))
            .collect()
    }

    /// Mark as a reference type
    pub fn is_class(mut self) -> Self {
        self.is_class = true;
        self
    }

    /// Mark as an enum. [`TypeBuilder::with_enum_values`] also does this.
    pub fn is_enum(mut self) -> Self {
        self.is_enum = true;
        self
    }

    /// Register a field through a pair of accessors
    pub fn with_field<F, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        F: FromObject + IntoObject + Clone + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        if name.is_empty() {
            self.fail("field name must not be empty");
            return self;
        }
        let Some(field_type) = self.require(name, F::parameter_type()) else {
            return self;
        };
        let getter = Arc::new(move |target: &Object| -> ReflectionResult<Object> {
            target
                .with_instance(|this: &T| get(this).clone())
                .and_then(IntoObject::into_object)
        });
        let setter = Arc::new(move |target: &Object, value: &Object| -> ReflectionResult<()> {
            let value = F::from_object(value)?;
            target.with_instance_mut(|this: &mut T| *set(this) = value)
        });
        let field = FieldInfo::new(name, &self.shell, field_type, getter, setter);
        self.fields.push(field);
        self
    }

    /// Register an instance method taking `&T` or `&mut T`
    pub fn with_method<M, F>(mut self, name: &str, method: F, parameter_names: &[&str]) -> Self
    where
        F: InstanceMethod<T, M>,
    {
        if name.is_empty() {
            self.fail("method name must not be empty");
            return self;
        }
        let (Some(types), Some(return_type)) = (
            self.require(name, F::parameter_types()),
            self.require(name, F::return_type()),
        ) else {
            return self;
        };
        let parameters = self.parameters(name, types, parameter_names);
        let info = MethodInfo::new(
            name,
            &self.shell,
            return_type,
            parameters,
            false,
            method.into_invoker(),
        );
        self.methods.push(info);
        self
    }

    /// Register a method that does not take an instance
    pub fn with_static_method<M, F>(mut self, name: &str, method: F, parameter_names: &[&str]) -> Self
    where
        F: StaticMethod<M>,
    {
        if name.is_empty() {
            self.fail("method name must not be empty");
            return self;
        }
        let (Some(types), Some(return_type)) = (
            self.require(name, F::parameter_types()),
            self.require(name, F::return_type()),
        ) else {
            return self;
        };
        let parameters = self.parameters(name, types, parameter_names);
        let info = MethodInfo::new(
            name,
            &self.shell,
            return_type,
            parameters,
            true,
            method.into_invoker(),
        );
        self.methods.push(info);
        self
    }

    /// Register a constructor. It must produce `T`, either boxed or as a
    /// [`Ptr`](crate::Ptr).
    pub fn with_constructor<M, F>(mut self, constructor: F, parameter_names: &[&str]) -> Self
    where
        F: StaticMethod<M>,
    {
        let (Some(types), Some(produced)) = (
            self.require(".ctor", F::parameter_types()),
            self.require(".ctor", F::return_type()),
        ) else {
            return self;
        };
        if produced != self.shell {
            self.fail(format!("constructor produces {produced}"));
        }
        let parameters = self.parameters(".ctor", types, parameter_names);
        let info = ConstructorInfo::new(&self.shell, parameters, constructor.into_invoker());
        self.constructors.push(info);
        self
    }

    /// Declare `B` as the base type, embedded in `T` and reached through
    /// the two projections
    pub fn with_base<B, G, H>(mut self, as_base: G, as_base_mut: H) -> Self
    where
        B: Reflected,
        G: Fn(&T) -> &B + Send + Sync + 'static,
        H: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        if let Some(base) = &self.base {
            let message = format!("base type already defined as {base}");
            self.fail(message);
            return self;
        }
        let Some(base) = self.require("base type", B::try_type_of()) else {
            return self;
        };
        self.base = Some(base);
        self.upcast = Some(Upcast::new::<T, B, G, H>(as_base, as_base_mut));
        self
    }

    /// Declare an implemented interface
    pub fn with_interface<I: Reflected>(mut self) -> Self {
        if let Some(interface) = self.require("interface", I::try_type_of()) {
            self.interfaces.push(interface);
        }
        self
    }

    /// Append a type argument of a generic instantiation
    pub fn with_generic_argument<A: Reflected>(mut self) -> Self {
        if let Some(argument) = self.require("generic argument", A::try_type_of()) {
            self.generic_arguments.push(argument);
        }
        self
    }

    /// Seal the type. Consumes the builder.
    pub fn build(self) -> ReflectionResult<Type> {
        if let Some(error) = self.error {
            return Err(error);
        }

        for (i, constructor) in self.constructors.iter().enumerate() {
            if self.constructors[..i]
                .iter()
                .any(|earlier| earlier.has_signature_of(constructor))
            {
                return Err(ReflectionError::registration(
                    self.shell.full_name(),
                    format!("duplicate constructor signature {constructor:?}"),
                ));
            }
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        if let Some(base) = &self.base {
            fields.extend_from_slice(base.get_fields());
            methods.extend_from_slice(base.get_methods());
        }
        fields.extend(self.fields);
        methods.extend(self.methods);

        let members = TypeMembers {
            is_class: self.is_class,
            is_enum: self.is_enum,
            fields,
            methods,
            constructors: self.constructors,
            interfaces: self.interfaces,
            generic_arguments: self.generic_arguments,
            base: self.base,
            upcast: self.upcast,
            enum_values: self.enum_values,
        };
        if !self.shell.seal(members) {
            return Err(ReflectionError::registration(
                self.shell.full_name(),
                "type is already built",
            ));
        }
        TypeRegistry::global().seal(&self.shell);
        Ok(self.shell)
    }
}

impl<T: EnumType> TypeBuilder<T> {
    /// Mark as an enum and record the name and boxed value of every variant
    pub fn with_enum_values(mut self) -> Self {
        self.is_enum = true;
        self.enum_values = T::variants()
            .iter()
            .map(|(name, value)| EnumValue {
                name: name.to_string(),
                value: Object::boxed(*value),
            })
            .collect();
        self
    }
}
