//! Type descriptor
//!
//! A [`Type`] is created as an empty shell when its builder starts, so the
//! type can refer to itself while it is being described, and is sealed once
//! by [`TypeBuilder::build`](super::TypeBuilder::build). After sealing it is
//! immutable and lives for the rest of the process.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, Weak};

use rustc_hash::FxHasher;

use super::enums::EnumValue;
use super::member_info::{ConstructorInfo, FieldInfo, MethodInfo};
use super::registry::TypeRegistry;
use crate::error::{ReflectionError, ReflectionResult};

type SharedProjection = dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync;
type ExclusiveProjection = dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync;

/// Projection from a derived instance to its embedded base
#[derive(Clone)]
pub(crate) struct Upcast {
    pub(crate) shared: Arc<SharedProjection>,
    pub(crate) exclusive: Arc<ExclusiveProjection>,
}

impl Upcast {
    pub(crate) fn new<T, B, G, H>(as_base: G, as_base_mut: H) -> Self
    where
        T: Any,
        B: Any,
        G: Fn(&T) -> &B + Send + Sync + 'static,
        H: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        let shared = shared_projection(move |value: &dyn Any| {
            value.downcast_ref::<T>().map(|this| as_base(this) as &dyn Any)
        });
        let exclusive = exclusive_projection(move |value: &mut dyn Any| {
            value
                .downcast_mut::<T>()
                .map(|this| as_base_mut(this) as &mut dyn Any)
        });
        Upcast {
            shared: Arc::new(shared),
            exclusive: Arc::new(exclusive),
        }
    }
}

// Pin the higher-ranked signatures; closure inference alone would tie the
// output lifetime to a single call.
fn shared_projection<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    f
}

fn exclusive_projection<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any>,
{
    f
}

/// Everything filled in when a type is sealed
#[derive(Default)]
pub(crate) struct TypeMembers {
    pub(crate) is_class: bool,
    pub(crate) is_enum: bool,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) constructors: Vec<ConstructorInfo>,
    pub(crate) interfaces: Vec<Type>,
    pub(crate) generic_arguments: Vec<Type>,
    pub(crate) base: Option<Type>,
    pub(crate) upcast: Option<Upcast>,
    pub(crate) enum_values: Vec<EnumValue>,
}

pub(crate) struct TypeData {
    namespace: String,
    name: String,
    full_name: String,
    type_id: TypeId,
    members: OnceLock<TypeMembers>,
}

/// Runtime descriptor of a reflected type.
///
/// Cheap to clone. Two descriptors are equal when their full names are equal.
#[derive(Clone)]
pub struct Type(Arc<TypeData>);

impl Type {
    pub(crate) fn shell(namespace: String, name: String, type_id: TypeId) -> Self {
        let full_name = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}.{name}")
        };
        Type(Arc::new(TypeData {
            namespace,
            name,
            full_name,
            type_id,
            members: OnceLock::new(),
        }))
    }

    /// Fill in the members; `false` if the type was already sealed
    pub(crate) fn seal(&self, members: TypeMembers) -> bool {
        self.0.members.set(members).is_ok()
    }

    pub(crate) fn downgrade(&self) -> Weak<TypeData> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<TypeData>) -> Option<Type> {
        weak.upgrade().map(Type)
    }

    pub(crate) fn base_projection(&self) -> Option<(Type, Upcast)> {
        let members = self.0.members.get()?;
        Some((members.base.clone()?, members.upcast.clone()?))
    }

    pub(crate) fn enum_values(&self) -> &[EnumValue] {
        self.members().map(|m| m.enum_values.as_slice()).unwrap_or_default()
    }

    fn members(&self) -> Option<&TypeMembers> {
        self.0.members.get()
    }

    /// Simple name, e.g. `Int32`
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Namespace without the type name, e.g. `System`
    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    /// Namespace-qualified name, e.g. `System.Int32`
    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    /// `TypeId` of the Rust type this descriptor was registered for
    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// Whether the builder has finished with this type
    pub fn is_sealed(&self) -> bool {
        self.0.members.get().is_some()
    }

    /// Whether instances are shared references rather than boxed copies
    pub fn is_class(&self) -> bool {
        self.members().is_some_and(|m| m.is_class)
    }

    /// Whether the type carries a table of named values
    pub fn is_enum(&self) -> bool {
        self.members().is_some_and(|m| m.is_enum)
    }

    /// Direct base type, if one was declared
    pub fn base_type(&self) -> Option<Type> {
        self.members().and_then(|m| m.base.clone())
    }

    /// Fields, inherited ones first
    pub fn get_fields(&self) -> &[FieldInfo] {
        self.members().map(|m| m.fields.as_slice()).unwrap_or_default()
    }

    /// First field registered under `name`
    pub fn get_field(&self, name: &str) -> Option<FieldInfo> {
        self.get_fields().iter().find(|f| f.name() == name).cloned()
    }

    /// Methods, inherited ones first
    pub fn get_methods(&self) -> &[MethodInfo] {
        self.members().map(|m| m.methods.as_slice()).unwrap_or_default()
    }

    /// First method registered under `name`
    pub fn get_method(&self, name: &str) -> Option<MethodInfo> {
        self.get_methods().iter().find(|m| m.name() == name).cloned()
    }

    /// Constructors in registration order
    pub fn get_constructors(&self) -> &[ConstructorInfo] {
        self.members().map(|m| m.constructors.as_slice()).unwrap_or_default()
    }

    /// Declared interfaces in registration order
    pub fn get_interfaces(&self) -> &[Type] {
        self.members().map(|m| m.interfaces.as_slice()).unwrap_or_default()
    }

    /// Interface by simple name
    pub fn get_interface(&self, name: &str) -> Option<Type> {
        self.get_interfaces().iter().find(|i| i.name() == name).cloned()
    }

    /// Type arguments of a generic instantiation such as ``List`1[System.Int32]``
    pub fn get_generic_arguments(&self) -> &[Type] {
        self.members().map(|m| m.generic_arguments.as_slice()).unwrap_or_default()
    }

    /// Whether `other` appears in this type's base chain
    pub fn is_subclass_of(&self, other: &Type) -> bool {
        let mut current = self.base_type();
        while let Some(base) = current {
            if base == *other {
                return true;
            }
            current = base.base_type();
        }
        false
    }

    /// Types that list this type anywhere in their base chain, in
    /// registration order
    pub fn get_derived_types(&self) -> Vec<Type> {
        TypeRegistry::global().derived_types(self.full_name())
    }

    /// Same as `==`: compares full names
    pub fn equals(&self, other: &Type) -> bool {
        self == other
    }

    /// Hash of the full name
    pub fn hash_code(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.full_name().hash(&mut hasher);
        hasher.finish()
    }

    /// Whether both handles point at the same descriptor instance
    pub fn ptr_eq(a: &Type, b: &Type) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Look up a type by full name, simple name or Rust type name
    pub fn get_type(name: &str) -> ReflectionResult<Type> {
        Type::find_type(name).ok_or_else(|| ReflectionError::TypeNotFound(name.to_string()))
    }

    /// Like [`Type::get_type`] but without the error
    pub fn find_type(name: &str) -> Option<Type> {
        TypeRegistry::global().get(name)
    }

    /// Derived types of the type registered under `name`
    pub fn get_derived_types_of(name: &str) -> ReflectionResult<Vec<Type>> {
        Type::get_type(name).map(|ty| ty.get_derived_types())
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name()
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name().hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{Reflected, TypeBuilder};

    struct Shape;
    struct Circle {
        shape: Shape,
    }

    impl Reflected for Shape {
        fn build_type() -> ReflectionResult<Type> {
            TypeBuilder::<Shape>::new("Dot.Test.TypeInfo", "Shape")
                .is_class()
                .build()
        }
    }

    impl Reflected for Circle {
        fn build_type() -> ReflectionResult<Type> {
            TypeBuilder::<Circle>::new("Dot.Test.TypeInfo", "Circle")
                .is_class()
                .with_base::<Shape, _, _>(|c: &Circle| &c.shape, |c: &mut Circle| &mut c.shape)
                .build()
        }
    }

    #[test]
    fn test_names() {
        let ty = Shape::type_of();
        assert_eq!(ty.namespace(), "Dot.Test.TypeInfo");
        assert_eq!(ty.name(), "Shape");
        assert_eq!(ty.full_name(), "Dot.Test.TypeInfo.Shape");
        assert_eq!(ty.to_string(), "Dot.Test.TypeInfo.Shape");
        assert_eq!(ty.type_id(), TypeId::of::<Shape>());
        assert!(ty.is_sealed());
    }

    #[test]
    fn test_empty_namespace() {
        let ty = Type::shell(String::new(), "Loose".to_string(), TypeId::of::<u16>());
        assert_eq!(ty.full_name(), "Loose");
        assert!(!ty.is_sealed());
        assert!(ty.get_methods().is_empty());
    }

    #[test]
    fn test_identity_by_full_name() {
        let b = Shape::type_of();
        let a = Type::get_type("Dot.Test.TypeInfo.Shape").unwrap();
        assert!(a.equals(&b));
        assert_eq!(a.hash_code(), b.hash_code());
        assert!(Type::ptr_eq(&a, &b));

        let detached = Type::shell("Dot.Test.TypeInfo".into(), "Shape".into(), TypeId::of::<u16>());
        assert_eq!(detached, b);
        assert!(!Type::ptr_eq(&detached, &b));
    }

    #[test]
    fn test_get_type_not_found() {
        assert_eq!(
            Type::get_type("Dot.Test.TypeInfo.Missing"),
            Err(ReflectionError::TypeNotFound("Dot.Test.TypeInfo.Missing".to_string()))
        );
        assert!(Type::find_type("Dot.Test.TypeInfo.Missing").is_none());
    }

    #[test]
    fn test_base_chain() {
        let circle = Circle::type_of();
        let shape = Shape::type_of();
        assert_eq!(circle.base_type(), Some(shape.clone()));
        assert!(circle.is_subclass_of(&shape));
        assert!(!shape.is_subclass_of(&circle));
        assert_eq!(shape.get_derived_types(), vec![circle]);
    }
}
