//! Field, method, constructor and parameter descriptors
//!
//! Each descriptor owns a type-erased closure built by the
//! [`TypeBuilder`](super::TypeBuilder) and refers back to its declaring type
//! weakly; the declaring [`Type`] owns the descriptors.

use std::fmt;
use std::sync::{Arc, Weak};

use super::type_info::{Type, TypeData};
use crate::error::{ReflectionError, ReflectionResult};
use crate::object::Object;

pub(crate) type Invoker = Arc<dyn Fn(&Object, &[Object]) -> ReflectionResult<Object> + Send + Sync>;
pub(crate) type Getter = Arc<dyn Fn(&Object) -> ReflectionResult<Object> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&Object, &Object) -> ReflectionResult<()> + Send + Sync>;

/// Positional parameter of a method or constructor
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    name: String,
    parameter_type: Type,
    position: usize,
}

impl ParameterInfo {
    pub(crate) fn new(name: &str, parameter_type: Type, position: usize) -> Self {
        Self {
            name: name.to_string(),
            parameter_type,
            position,
        }
    }

    /// Name given at registration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type; arguments must box exactly this type
    pub fn parameter_type(&self) -> &Type {
        &self.parameter_type
    }

    /// Zero-based position
    pub fn position(&self) -> usize {
        self.position
    }
}

fn check_arity(member: &str, parameters: &[ParameterInfo], args: &[Object]) -> ReflectionResult<()> {
    if parameters.len() != args.len() {
        return Err(ReflectionError::ArityMismatch {
            member: member.to_string(),
            expected: parameters.len(),
            got: args.len(),
        });
    }
    Ok(())
}

struct FieldData {
    name: String,
    qualified_name: String,
    declaring_type: Weak<TypeData>,
    field_type: Type,
    getter: Getter,
    setter: Setter,
}

/// Reflected field
#[derive(Clone)]
pub struct FieldInfo(Arc<FieldData>);

impl FieldInfo {
    pub(crate) fn new(
        name: &str,
        declaring_type: &Type,
        field_type: Type,
        getter: Getter,
        setter: Setter,
    ) -> Self {
        FieldInfo(Arc::new(FieldData {
            name: name.to_string(),
            qualified_name: format!("{}.{}", declaring_type.full_name(), name),
            declaring_type: declaring_type.downgrade(),
            field_type,
            getter,
            setter,
        }))
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type that registered the field. For an inherited field this is the base.
    pub fn declaring_type(&self) -> Option<Type> {
        Type::upgrade(&self.0.declaring_type)
    }

    /// Static type of the field's value
    pub fn field_type(&self) -> &Type {
        &self.0.field_type
    }

    /// Read the field of `target` as a boxed value
    pub fn get_value(&self, target: &Object) -> ReflectionResult<Object> {
        (self.0.getter)(target)
    }

    /// Write the field of `target`. `value` must hold exactly the field's type.
    pub fn set_value(&self, target: &Object, value: &Object) -> ReflectionResult<()> {
        (self.0.setter)(target, value)
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldInfo({}: {})", self.0.qualified_name, self.0.field_type)
    }
}

struct MethodData {
    name: String,
    qualified_name: String,
    declaring_type: Weak<TypeData>,
    return_type: Type,
    parameters: Vec<ParameterInfo>,
    is_static: bool,
    invoker: Invoker,
}

/// Reflected instance or static method
#[derive(Clone)]
pub struct MethodInfo(Arc<MethodData>);

impl MethodInfo {
    pub(crate) fn new(
        name: &str,
        declaring_type: &Type,
        return_type: Type,
        parameters: Vec<ParameterInfo>,
        is_static: bool,
        invoker: Invoker,
    ) -> Self {
        MethodInfo(Arc::new(MethodData {
            name: name.to_string(),
            qualified_name: format!("{}.{}", declaring_type.full_name(), name),
            declaring_type: declaring_type.downgrade(),
            return_type,
            parameters,
            is_static,
            invoker,
        }))
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type that registered the method
    pub fn declaring_type(&self) -> Option<Type> {
        Type::upgrade(&self.0.declaring_type)
    }

    /// `System.Void` for methods without a result
    pub fn return_type(&self) -> &Type {
        &self.0.return_type
    }

    /// Parameters in positional order
    pub fn get_parameters(&self) -> &[ParameterInfo] {
        &self.0.parameters
    }

    /// Whether the method ignores its target
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Call the method on `target` (ignored for static methods).
    ///
    /// Arguments are unboxed one by one as the call is set up; a mismatch
    /// fails at the first offending argument. Methods without a result
    /// return null.
    pub fn invoke(&self, target: &Object, args: &[Object]) -> ReflectionResult<Object> {
        check_arity(&self.0.qualified_name, &self.0.parameters, args)?;
        (self.0.invoker)(target, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodInfo({}(", self.0.qualified_name)?;
        for (i, param) in self.0.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.parameter_type)?;
        }
        write!(f, ") -> {})", self.0.return_type)
    }
}

struct ConstructorData {
    qualified_name: String,
    declaring_type: Weak<TypeData>,
    parameters: Vec<ParameterInfo>,
    invoker: Invoker,
}

/// Reflected constructor
#[derive(Clone)]
pub struct ConstructorInfo(Arc<ConstructorData>);

impl ConstructorInfo {
    pub(crate) fn new(declaring_type: &Type, parameters: Vec<ParameterInfo>, invoker: Invoker) -> Self {
        ConstructorInfo(Arc::new(ConstructorData {
            qualified_name: format!("{}..ctor", declaring_type.full_name()),
            declaring_type: declaring_type.downgrade(),
            parameters,
            invoker,
        }))
    }

    /// Always `.ctor`
    pub fn name(&self) -> &str {
        ".ctor"
    }

    /// Type the constructor produces
    pub fn declaring_type(&self) -> Option<Type> {
        Type::upgrade(&self.0.declaring_type)
    }

    /// Parameters in positional order
    pub fn get_parameters(&self) -> &[ParameterInfo] {
        &self.0.parameters
    }

    /// Construct a new instance
    pub fn invoke(&self, args: &[Object]) -> ReflectionResult<Object> {
        check_arity(&self.0.qualified_name, &self.0.parameters, args)?;
        (self.0.invoker)(&Object::null(), args)
    }

    /// Same arity and same parameter type names, position by position
    pub(crate) fn has_signature_of(&self, other: &ConstructorInfo) -> bool {
        self.0.parameters.len() == other.0.parameters.len()
            && self
                .0
                .parameters
                .iter()
                .zip(&other.0.parameters)
                .all(|(a, b)| a.parameter_type.name() == b.parameter_type.name())
    }

    /// Whether each argument's runtime type name equals the declared
    /// parameter type name. Null arguments never match.
    pub(crate) fn accepts(&self, args: &[Object]) -> bool {
        self.0.parameters.len() == args.len()
            && self.0.parameters.iter().zip(args).all(|(param, arg)| {
                arg.get_type()
                    .is_some_and(|ty| ty.name() == param.parameter_type.name())
            })
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstructorInfo({}(", self.0.qualified_name)?;
        for (i, param) in self.0.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.parameter_type)?;
        }
        f.write_str("))")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Ptr;
    use crate::reflection::{Reflected, TypeBuilder};

    #[derive(Debug, Default)]
    struct Account {
        owner: String,
        balance: i64,
    }

    impl Account {
        fn deposit(&mut self, amount: i64) -> i64 {
            self.balance += amount;
            self.balance
        }

        fn describe(&self) -> String {
            format!("{}: {}", self.owner, self.balance)
        }

        fn close(&mut self) {
            self.balance = 0;
        }

        fn bank_code() -> String {
            "DOT".to_string()
        }
    }

    impl Reflected for Account {
        fn build_type() -> ReflectionResult<Type> {
            TypeBuilder::<Account>::new("Dot.Test.Members", "Account")
                .is_class()
                .with_field("owner", |a: &Account| &a.owner, |a: &mut Account| &mut a.owner)
                .with_field("balance", |a: &Account| &a.balance, |a: &mut Account| &mut a.balance)
                .with_constructor(|| Ptr::new(Account::default()), &[])
                .with_constructor(
                    |owner: String| Ptr::new(Account { owner, balance: 0 }),
                    &["owner"],
                )
                .with_method("deposit", Account::deposit, &["amount"])
                .with_method("describe", Account::describe, &[])
                .with_method("close", Account::close, &[])
                .with_static_method("bank_code", Account::bank_code, &[])
                .build()
        }
    }

    fn account(owner: &str, balance: i64) -> Object {
        Object::new(Account {
            owner: owner.to_string(),
            balance,
        })
    }

    #[test]
    fn test_field_get_set() {
        let ty = Account::type_of();
        let obj = account("ann", 10);
        let balance = ty.get_field("balance").unwrap();
        assert_eq!(balance.field_type(), &i64::type_of());
        assert_eq!(balance.get_value(&obj).unwrap().unbox::<i64>(), Ok(10));

        balance.set_value(&obj, &Object::from(25i64)).unwrap();
        assert_eq!(obj.downcast::<Account>().unwrap().read().balance, 25);
    }

    #[test]
    fn test_field_set_is_strict() {
        let field = Account::type_of().get_field("balance").unwrap();
        let obj = account("bob", 1);
        let err = field.set_value(&obj, &Object::from(25i32)).unwrap_err();
        assert_eq!(
            err,
            ReflectionError::TypeMismatch {
                expected: "System.Int64".to_string(),
                got: "System.Int32".to_string(),
            }
        );
        assert_eq!(field.get_value(&obj).unwrap(), Object::from(1i64));
    }

    #[test]
    fn test_field_on_wrong_target() {
        let field = Account::type_of().get_field("owner").unwrap();
        assert_eq!(field.get_value(&Object::null()), Err(ReflectionError::NullReference));
        assert!(matches!(
            field.get_value(&Object::from(1)),
            Err(ReflectionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_method_shapes() {
        let ty = Account::type_of();
        let deposit = ty.get_method("deposit").unwrap();
        assert_eq!(deposit.return_type(), &i64::type_of());
        assert!(!deposit.is_static());
        let params = deposit.get_parameters();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), "amount");
        assert_eq!(params[0].position(), 0);
        assert_eq!(params[0].parameter_type().name(), "Int64");
        assert_eq!(deposit.declaring_type(), Some(ty.clone()));

        assert_eq!(ty.get_method("close").unwrap().return_type().name(), "Void");
        assert!(ty.get_method("bank_code").unwrap().is_static());
        assert!(ty.get_method("withdraw").is_none());
    }

    #[test]
    fn test_invoke_mutating_and_shared() {
        let ty = Account::type_of();
        let obj = account("cy", 5);
        let result = ty
            .get_method("deposit")
            .unwrap()
            .invoke(&obj, &[Object::from(7i64)])
            .unwrap();
        assert_eq!(result.unbox::<i64>(), Ok(12));

        let text = ty.get_method("describe").unwrap().invoke(&obj, &[]).unwrap();
        assert_eq!(text.unbox::<String>(), Ok("cy: 12".to_string()));

        let unit = ty.get_method("close").unwrap().invoke(&obj, &[]).unwrap();
        assert!(unit.is_null());
        assert_eq!(obj.downcast::<Account>().unwrap().read().balance, 0);
    }

    #[test]
    fn test_invoke_static_ignores_target() {
        let method = Account::type_of().get_method("bank_code").unwrap();
        let code = method.invoke(&Object::null(), &[]).unwrap();
        assert_eq!(code.unbox::<String>(), Ok("DOT".to_string()));
    }

    #[test]
    fn test_invoke_arity() {
        let method = Account::type_of().get_method("deposit").unwrap();
        let obj = account("dee", 0);
        let err = method.invoke(&obj, &[]).unwrap_err();
        assert_eq!(
            err,
            ReflectionError::ArityMismatch {
                member: "Dot.Test.Members.Account.deposit".to_string(),
                expected: 1,
                got: 0,
            }
        );
        assert!(method.invoke(&obj, &[Object::from(1i64), Object::from(2i64)]).is_err());
        assert_eq!(obj.downcast::<Account>().unwrap().read().balance, 0);
    }

    #[test]
    fn test_invoke_argument_mismatch() {
        let method = Account::type_of().get_method("deposit").unwrap();
        let err = method.invoke(&account("eve", 0), &[Object::from("ten")]).unwrap_err();
        assert!(matches!(err, ReflectionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_constructor_invoke() {
        let ctors = Account::type_of().get_constructors().to_vec();
        assert_eq!(ctors.len(), 2);
        assert_eq!(ctors[0].name(), ".ctor");

        let obj = ctors[1].invoke(&[Object::from("fay")]).unwrap();
        assert_eq!(obj.downcast::<Account>().unwrap().read().owner, "fay");
        assert!(ctors[0].invoke(&[Object::from("x")]).is_err());
    }

    #[test]
    fn test_signatures() {
        let ctors = Account::type_of().get_constructors().to_vec();
        assert!(ctors[0].has_signature_of(&ctors[0]));
        assert!(!ctors[0].has_signature_of(&ctors[1]));
        assert!(ctors[1].accepts(&[Object::from("x")]));
        assert!(!ctors[1].accepts(&[Object::from(1)]));
        assert!(!ctors[1].accepts(&[Object::null()]));
    }
}
