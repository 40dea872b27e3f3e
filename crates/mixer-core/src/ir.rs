//! Intermediate representation of class-like units, their members and bodies

use crate::error::CoreError;
use crate::naming::{NEXT_PREFIX, REQUIRES_PREFIX};
use crate::types::{Type, TypeSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of units known to the host, e.g. everything parsed from one source tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub units: Vec<Unit>,
}

/// A class-like declaration: the input parts and the target of a composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub interfaces: Vec<Type>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
    /// Identifiers of the parts this unit declares it is composed from
    #[serde(default)]
    pub mixins: Vec<String>,
    /// Qualified names of the parts that were composed into this unit
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Abstract,
    Static,
    Final,
    Synchronized,
    Native,
    Strictfp,
    Transient,
    Volatile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub flags: BTreeSet<Modifier>,
}

impl Modifiers {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            flags: BTreeSet::new(),
        }
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.flags.contains(&modifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: Type,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Absent iff the method is abstract
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub origin: Option<Origin>,
}

/// Where a composed member was copied from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Qualified name of the part
    pub unit: String,
    pub member: String,
    /// Parameter types for methods, `None` for fields
    #[serde(default)]
    pub params: Option<Vec<Type>>,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@see {}#{}", self.unit, self.member)?;
        if let Some(params) = &self.params {
            write!(f, "(")?;
            for (i, ty) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ty)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Local {
        name: String,
        ty: Type,
        #[serde(default)]
        init: Option<Expr>,
    },
    If {
        cond: Expr,
        then: Block,
        #[serde(default)]
        otherwise: Option<Block>,
    },
    Block {
        block: Block,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    This,
    Local {
        name: String,
    },
    Field {
        #[serde(default)]
        target: Option<Box<Expr>>,
        field: FieldRef,
    },
    Invoke {
        #[serde(default)]
        target: Option<Box<Expr>>,
        method: MethodRef,
        #[serde(default)]
        args: Vec<Expr>,
    },
    New {
        ty: Type,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        ty: Type,
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// Reference to an invoked method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRef {
    pub name: String,
    #[serde(default)]
    pub declaring: Option<Type>,
    /// Parameter types of the invoked declaration
    #[serde(default)]
    pub params: Vec<Type>,
}

/// Reference to an accessed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub name: String,
    #[serde(default)]
    pub declaring: Option<Type>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Find a unit by qualified name, falling back to its simple name
    pub fn find_unit(&self, name: &str) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| u.qualified_name() == name)
            .or_else(|| self.units.iter().find(|u| u.name == name))
    }

    /// Resolve part identifiers in their declared order
    pub fn resolve_parts<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Unit>, CoreError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.find_unit(name)
                    .ok_or_else(|| CoreError::UnitNotFound(name.to_string()))
            })
            .collect()
    }

    /// Units that declare at least one part to be composed from
    pub fn mixin_targets(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.mixins.is_empty())
    }

    pub fn replace_unit(&mut self, unit: Unit) {
        let qualified = unit.qualified_name();
        match self
            .units
            .iter_mut()
            .find(|u| u.qualified_name() == qualified)
        {
            Some(existing) => *existing = unit,
            None => self.units.push(unit),
        }
    }
}

impl Unit {
    pub fn new(qualified: impl AsRef<str>) -> Self {
        let qualified = qualified.as_ref();
        let (package, name) = match qualified.rsplit_once('.') {
            Some((package, name)) => (Some(package.to_string()), name.to_string()),
            None => (None, qualified.to_string()),
        };
        Self {
            name,
            package,
            modifiers: Modifiers::new(Visibility::Public),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            mixins: Vec::new(),
            sources: Vec::new(),
            documentation: None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(package) if !package.is_empty() => format!("{}.{}", package, self.name),
            _ => self.name.clone(),
        }
    }

    /// A type reference pointing at this declaration
    pub fn as_type(&self) -> Type {
        Type::Named {
            name: self.name.clone(),
            package: self.package.clone(),
            args: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_interface(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_mixins<I, S>(mut self, mixins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mixins.extend(mixins.into_iter().map(Into::into));
        self
    }

    pub fn abstract_unit(mut self) -> Self {
        self.modifiers.flags.insert(Modifier::Abstract);
        self
    }

    /// First method with exactly this name
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether an equivalent interface reference is already declared
    ///
    /// Type arguments count: `Comparable<A>` and `Comparable<B>` are distinct.
    pub fn implements(&self, interface: &Type, ts: &TypeSystem) -> bool {
        self.interfaces.iter().any(|i| ts.is_equivalent(i, interface))
    }
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            modifiers: Modifiers::new(Visibility::Public),
            body: Some(Block::default()),
            documentation: None,
            origin: None,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.flags.insert(modifier);
        self
    }

    pub fn with_body(mut self, statements: Vec<Stmt>) -> Self {
        self.body = Some(Block { statements });
        self
    }

    /// Mark abstract and drop the body
    pub fn into_abstract(mut self) -> Self {
        self.modifiers.flags.insert(Modifier::Abstract);
        self.body = None;
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.has(Modifier::Abstract)
    }

    pub fn param_types(&self) -> impl ExactSizeIterator<Item = &Type> {
        self.params.iter().map(|p| &p.ty)
    }

    /// Member the composition expects to be supplied by someone else
    pub fn is_binding_placeholder(&self) -> bool {
        self.name.starts_with(REQUIRES_PREFIX)
    }

    /// Abstract hook delegating to the next deeper layer of a chain
    pub fn is_chain_placeholder(&self) -> bool {
        self.is_abstract() && self.name.starts_with(NEXT_PREFIX)
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::new(Visibility::Private),
            init: None,
            documentation: None,
            origin: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }

    pub fn is_binding_placeholder(&self) -> bool {
        self.name.starts_with(REQUIRES_PREFIX)
    }
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return { value }
    }
}

impl Expr {
    /// Unqualified call with no parameters declared
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Invoke {
            target: None,
            method: MethodRef {
                name: name.into(),
                declaring: None,
                params: Vec::new(),
            },
            args,
        }
    }

    /// Unqualified call whose declaration has the given parameter types
    pub fn call_with(name: impl Into<String>, params: Vec<Type>, args: Vec<Expr>) -> Self {
        Expr::Invoke {
            target: None,
            method: MethodRef {
                name: name.into(),
                declaring: None,
                params,
            },
            args,
        }
    }

    /// Call on an explicit receiver, e.g. `System.out.println(..)`
    pub fn call_on(
        target: Expr,
        name: impl Into<String>,
        params: Vec<Type>,
        args: Vec<Expr>,
    ) -> Self {
        Expr::Invoke {
            target: Some(Box::new(target)),
            method: MethodRef {
                name: name.into(),
                declaring: None,
                params,
            },
            args,
        }
    }

    /// Access to a field of `this`
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field {
            target: Some(Box::new(Expr::This)),
            field: FieldRef {
                name: name.into(),
                declaring: None,
            },
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Expr::Local { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal {
            value: Literal::String(value.into()),
        }
    }

    pub fn literal(value: Literal) -> Self {
        Expr::Literal { value }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flying() -> Unit {
        Unit::new("jmixer.Flying")
            .abstract_unit()
            .with_method(Method::new("fly", Type::Void))
            .with_method(Method::new("_super_print", Type::Void).into_abstract())
    }

    #[test]
    fn test_unit_names() {
        let unit = flying();
        assert_eq!(unit.name, "Flying");
        assert_eq!(unit.package.as_deref(), Some("jmixer"));
        assert_eq!(unit.qualified_name(), "jmixer.Flying");
        assert_eq!(unit.as_type(), Type::named("jmixer.Flying"));
    }

    #[test]
    fn test_placeholder_classification() {
        let unit = flying();
        let fly = unit.method("fly").unwrap();
        let hook = unit.method("_super_print").unwrap();

        assert!(!fly.is_chain_placeholder());
        assert!(hook.is_chain_placeholder());
        assert!(hook.body.is_none());

        // A concrete method with the prefix is not a chain placeholder
        let concrete = Method::new("_super_print", Type::Void);
        assert!(!concrete.is_chain_placeholder());

        let required = Method::new("_this_name", Type::named("java.lang.String")).into_abstract();
        assert!(required.is_binding_placeholder());
        assert!(Field::new("_this_count", Type::Int).is_binding_placeholder());
    }

    #[test]
    fn test_catalog_resolution_keeps_order() {
        let mut catalog = Catalog::new();
        catalog.add_unit(flying());
        catalog.add_unit(Unit::new("jmixer.Swimming"));
        catalog.add_unit(Unit::new("jmixer.Duck").with_mixins(["jmixer.Flying", "Swimming"]));

        let parts = catalog.resolve_parts(&["Swimming", "jmixer.Flying"]).unwrap();
        let names: Vec<_> = parts.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Swimming", "Flying"]);

        let targets: Vec<_> = catalog.mixin_targets().map(|u| u.name.clone()).collect();
        assert_eq!(targets, vec!["Duck".to_string()]);
    }

    #[test]
    fn test_catalog_missing_unit() {
        let catalog = Catalog::new();
        let err = catalog.resolve_parts(&["jmixer.Ghost"]).unwrap_err();
        assert!(matches!(err, CoreError::UnitNotFound(name) if name == "jmixer.Ghost"));
    }

    #[test]
    fn test_origin_display() {
        let method = Origin {
            unit: "jmixer.Flying".to_string(),
            member: "print".to_string(),
            params: Some(vec![Type::Int, Type::named("java.lang.String")]),
        };
        assert_eq!(
            method.to_string(),
            "@see jmixer.Flying#print(int, java.lang.String)"
        );

        let field = Origin {
            unit: "jmixer.Flying".to_string(),
            member: "altitude".to_string(),
            params: None,
        };
        assert_eq!(field.to_string(), "@see jmixer.Flying#altitude");
    }

    #[test]
    fn test_unit_json_shape() {
        let unit = Unit::new("jmixer.Swimming").with_method(
            Method::new("swim", Type::Void).with_body(vec![Stmt::expr(Expr::call(
                "_super_swim",
                vec![],
            ))]),
        );
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["methods"][0]["body"][0]["stmt"], "expr");
        assert_eq!(json["methods"][0]["body"][0]["expr"]["expr"], "invoke");

        let back: Unit = serde_json::from_value(json).unwrap();
        assert_eq!(back, unit);
    }
}
