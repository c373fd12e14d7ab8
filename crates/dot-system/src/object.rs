//! Uniform boxed value
//!
//! An [`Object`] is either null, a boxed value (primitive or value type,
//! owned by the box) or a reference to a shared instance created through
//! [`Ptr`]. Cloning an `Object` clones the handle, never the payload.
//!
//! Unboxing is exact: a box only yields the type it was created from. There
//! is no widening between numeric types and no conversion between enum types
//! that share an underlying representation.

use std::any::{type_name, Any};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHasher;

use crate::convert::ValueType;
use crate::error::{ReflectionError, ReflectionResult};
use crate::reflection::{registry::TypeRegistry, Enum, Reflected, Type};

/// State of an [`Object`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Holds nothing
    Null,
    /// Holds a copy of a value type
    Boxed,
    /// Shares ownership of a reference-type instance
    Reference,
}

/// Type-erased storage behind a non-null object.
///
/// Access goes through visitor callbacks so the lock guard never escapes
/// the concrete cell type.
pub(crate) trait InstanceCell: Send + Sync {
    fn visit(&self, visitor: &mut dyn FnMut(&dyn Any));
    fn visit_mut(&self, visitor: &mut dyn FnMut(&mut dyn Any));
    fn value_eq(&self, other: &dyn InstanceCell) -> bool;
    fn hash_value(&self, state: &mut dyn Hasher);
    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> InstanceCell for RwLock<T> {
    fn visit(&self, visitor: &mut dyn FnMut(&dyn Any)) {
        visitor(&*self.read())
    }

    fn visit_mut(&self, visitor: &mut dyn FnMut(&mut dyn Any)) {
        visitor(&mut *self.write())
    }

    fn value_eq(&self, other: &dyn InstanceCell) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn InstanceCell)
    }

    fn hash_value(&self, state: &mut dyn Hasher) {
        state.write_usize(self as *const Self as *const () as usize);
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("..")
    }

    // References display as their type name, written by `Object` itself.
    fn fmt_display(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Cell for boxed value types. Separate from the reference cell so a box
/// can never be downcast to a [`Ptr`] and vice versa.
struct BoxedCell<T>(RwLock<T>);

impl<T: ValueType> InstanceCell for BoxedCell<T> {
    fn visit(&self, visitor: &mut dyn FnMut(&dyn Any)) {
        visitor(&*self.0.read())
    }

    fn visit_mut(&self, visitor: &mut dyn FnMut(&mut dyn Any)) {
        visitor(&mut *self.0.write())
    }

    fn value_eq(&self, other: &dyn InstanceCell) -> bool {
        match other.as_any().downcast_ref::<BoxedCell<T>>() {
            Some(other) if std::ptr::eq(self, other) => true,
            Some(other) => *self.0.read() == *other.0.read(),
            None => false,
        }
    }

    fn hash_value(&self, state: &mut dyn Hasher) {
        self.0.read().hash_value(state);
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.read(), f)
    }

    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.read().fmt_value(f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared handle to a reference-type instance
pub struct Ptr<T>(Arc<RwLock<T>>);

impl<T: Reflected> Ptr<T> {
    /// Allocate a new instance
    pub fn new(value: T) -> Self {
        Ptr(Arc::new(RwLock::new(value)))
    }

    /// Lock the instance for reading
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Lock the instance for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Whether both handles point at the same instance
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Ptr(Arc::clone(&self.0))
    }
}

impl<T: Reflected + fmt::Debug> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.read(), f)
    }
}

/// # Panics
///
/// Panics when the registration of `T` is malformed, like [`type_of`](crate::type_of).
impl<T: Reflected> From<Ptr<T>> for Object {
    fn from(ptr: Ptr<T>) -> Self {
        Object::try_from_ptr(ptr).unwrap_or_else(|err| panic!("{err}"))
    }
}

#[derive(Clone)]
struct Handle {
    ty: Type,
    kind: ObjectKind,
    cell: Arc<dyn InstanceCell>,
}

/// Boxed value or object reference
#[derive(Clone, Default)]
pub struct Object {
    handle: Option<Handle>,
}

impl Object {
    /// The null object
    pub const fn null() -> Self {
        Object { handle: None }
    }

    fn with_handle(ty: Type, kind: ObjectKind, cell: Arc<dyn InstanceCell>) -> Self {
        Object {
            handle: Some(Handle { ty, kind, cell }),
        }
    }

    /// Allocate a reference-type instance and return a reference to it.
    ///
    /// # Panics
    ///
    /// Panics when the registration of `T` is malformed.
    pub fn new<T: Reflected>(value: T) -> Self {
        Ptr::new(value).into()
    }

    /// Box a copy of a value type.
    ///
    /// # Panics
    ///
    /// Panics when the registration of `T` is malformed; [`Object::try_boxed`]
    /// returns the error instead.
    pub fn boxed<T: ValueType>(value: T) -> Self {
        Object::try_boxed(value).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Box a copy of a value type, or report why `T` has no descriptor
    pub fn try_boxed<T: ValueType>(value: T) -> ReflectionResult<Self> {
        let ty = T::try_type_of()?;
        Ok(Object::with_handle(ty, ObjectKind::Boxed, Arc::new(BoxedCell(RwLock::new(value)))))
    }

    pub(crate) fn try_from_ptr<T: Reflected>(ptr: Ptr<T>) -> ReflectionResult<Self> {
        let ty = T::try_type_of()?;
        Ok(Object::with_handle(ty, ObjectKind::Reference, ptr.0))
    }

    /// Null, boxed or reference
    pub fn kind(&self) -> ObjectKind {
        self.handle.as_ref().map_or(ObjectKind::Null, |handle| handle.kind)
    }

    /// Whether the object holds nothing
    pub fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    /// Whether the object owns a copy of a value type
    pub fn is_boxed(&self) -> bool {
        self.kind() == ObjectKind::Boxed
    }

    /// Whether the object shares a reference-type instance
    pub fn is_reference(&self) -> bool {
        self.kind() == ObjectKind::Reference
    }

    /// Runtime type, `None` for null
    pub fn get_type(&self) -> Option<Type> {
        self.handle.as_ref().map(|handle| handle.ty.clone())
    }

    /// Full name of the runtime type, `"null"` for null
    pub fn type_name(&self) -> String {
        self.handle
            .as_ref()
            .map_or_else(|| "null".to_string(), |handle| handle.ty.full_name().to_string())
    }

    /// Copy the value out of a box holding exactly `T`
    pub fn unbox<T: ValueType>(&self) -> ReflectionResult<T> {
        let cell = self
            .handle
            .as_ref()
            .filter(|handle| handle.kind == ObjectKind::Boxed)
            .and_then(|handle| handle.cell.as_any().downcast_ref::<BoxedCell<T>>());
        match cell {
            Some(cell) => Ok(cell.0.read().clone()),
            None => Err(ReflectionError::mismatch(expected_name::<T>(), self.type_name())),
        }
    }

    /// Recover the shared handle of a reference whose dynamic type is exactly `T`
    pub fn downcast<T: Reflected>(&self) -> ReflectionResult<Ptr<T>> {
        let cell = self
            .handle
            .as_ref()
            .filter(|handle| handle.kind == ObjectKind::Reference)
            .map(|handle| Arc::clone(&handle.cell));
        cell.and_then(|cell| cell.into_any().downcast::<RwLock<T>>().ok())
            .map(Ptr)
            .ok_or_else(|| ReflectionError::mismatch(expected_name::<T>(), self.type_name()))
    }

    /// Same as `==`: value equality for boxes, identity for references
    pub fn equals(&self, other: &Object) -> bool {
        self == other
    }

    /// Hash consistent with [`Object::equals`]; 0 for null
    pub fn hash_code(&self) -> u64 {
        if self.is_null() {
            return 0;
        }
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Identity comparison; two nulls are identical
    pub fn reference_equals(a: &Object, b: &Object) -> bool {
        match (&a.handle, &b.handle) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::as_ptr(&a.cell) as *const () == Arc::as_ptr(&b.cell) as *const ()
            }
            _ => false,
        }
    }

    /// Run `f` against the instance viewed as `T`, walking registered base
    /// projections when the runtime type derives from `T`.
    pub(crate) fn with_instance<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> ReflectionResult<R> {
        let handle = self.handle.as_ref().ok_or(ReflectionError::NullReference)?;
        let mut call = Some(f);
        let mut result = None;
        handle.cell.visit(&mut |value| {
            if let Some(target) = project::<T>(handle.ty.clone(), value) {
                result = call.take().map(|call| call(target));
            }
        });
        result.ok_or_else(|| {
            ReflectionError::mismatch(TypeRegistry::global().name_of::<T>(), handle.ty.full_name())
        })
    }

    /// Mutable counterpart of [`Object::with_instance`]. Holds the write lock
    /// for the duration of `f`.
    pub(crate) fn with_instance_mut<T: Any, R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
    ) -> ReflectionResult<R> {
        let handle = self.handle.as_ref().ok_or(ReflectionError::NullReference)?;
        let mut call = Some(f);
        let mut result = None;
        handle.cell.visit_mut(&mut |value| {
            if let Some(target) = project_mut::<T>(handle.ty.clone(), value) {
                result = call.take().map(|call| call(target));
            }
        });
        result.ok_or_else(|| {
            ReflectionError::mismatch(TypeRegistry::global().name_of::<T>(), handle.ty.full_name())
        })
    }
}

fn expected_name<T: Reflected>() -> String {
    match T::try_type_of() {
        Ok(ty) => ty.full_name().to_string(),
        Err(_) => type_name::<T>().to_string(),
    }
}

fn project<'a, T: Any>(mut ty: Type, mut current: &'a dyn Any) -> Option<&'a T> {
    loop {
        if let Some(target) = current.downcast_ref::<T>() {
            return Some(target);
        }
        let (base, upcast) = ty.base_projection()?;
        current = (upcast.shared)(current)?;
        ty = base;
    }
}

fn project_mut<'a, T: Any>(mut ty: Type, mut current: &'a mut dyn Any) -> Option<&'a mut T> {
    loop {
        if current.is::<T>() {
            return current.downcast_mut::<T>();
        }
        let (base, upcast) = ty.base_projection()?;
        current = (upcast.exclusive)(current)?;
        ty = base;
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (&self.handle, &other.handle) {
            (None, None) => true,
            (Some(a), Some(b)) if a.kind == b.kind && a.ty == b.ty => match a.kind {
                ObjectKind::Boxed => a.cell.value_eq(b.cell.as_ref()),
                _ => Object::reference_equals(self, other),
            },
            _ => false,
        }
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.handle {
            None => state.write_u8(0),
            Some(handle) => {
                handle.ty.hash(state);
                handle.cell.hash_value(state);
            }
        }
    }
}

/// Boxed values print through [`ValueType::fmt_value`], enum values as
/// their variant name, references as their full type name and null as an
/// empty string.
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(handle) = &self.handle else {
            return Ok(());
        };
        match handle.kind {
            ObjectKind::Reference | ObjectKind::Null => f.write_str(handle.ty.full_name()),
            ObjectKind::Boxed => match Enum::get_name(self) {
                Some(name) => f.write_str(&name),
                None => handle.cell.fmt_display(f),
            },
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            None => f.write_str("null"),
            Some(handle) => {
                write!(f, "{}(", handle.ty.full_name())?;
                handle.cell.fmt_debug(f)?;
                f.write_str(")")
            }
        }
    }
}
