//! Type references and the host type system used for signature matching

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the root reference type every class is a subtype of
pub const OBJECT: &str = "java.lang.Object";

/// A reference to a type as it appears in a signature or a body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// Primitive types
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,

    /// Array of a component type
    Array { component: Box<Type> },

    /// Reference to a declared class or interface
    Named {
        name: String,
        /// Package of the declaration, `None` for the default package
        #[serde(default)]
        package: Option<String>,
        /// Actual type arguments; empty for raw references
        #[serde(default)]
        args: Vec<Type>,
    },

    /// Formal type parameter (e.g. `T`)
    Param { name: String },
}

impl Type {
    /// Reference to a declaration, split on the last `.` into package and name
    pub fn named(qualified: impl AsRef<str>) -> Self {
        let qualified = qualified.as_ref();
        match qualified.rsplit_once('.') {
            Some((package, name)) => Type::Named {
                name: name.to_string(),
                package: Some(package.to_string()),
                args: Vec::new(),
            },
            None => Type::Named {
                name: qualified.to_string(),
                package: None,
                args: Vec::new(),
            },
        }
    }

    /// Add type arguments to a named reference; other types are returned unchanged
    pub fn with_args(self, new_args: Vec<Type>) -> Self {
        match self {
            Type::Named { name, package, .. } => Type::Named {
                name,
                package,
                args: new_args,
            },
            other => other,
        }
    }

    pub fn array_of(component: Type) -> Self {
        Type::Array {
            component: Box::new(component),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Type::Param { name: name.into() }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Void
                | Type::Boolean
                | Type::Byte
                | Type::Char
                | Type::Short
                | Type::Int
                | Type::Long
                | Type::Float
                | Type::Double
        )
    }

    /// Fully-qualified name without type arguments
    ///
    /// Arrays render as `component[]`, matching how declarations are looked up.
    pub fn qualified_name(&self) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Byte => "byte".to_string(),
            Type::Char => "char".to_string(),
            Type::Short => "short".to_string(),
            Type::Int => "int".to_string(),
            Type::Long => "long".to_string(),
            Type::Float => "float".to_string(),
            Type::Double => "double".to_string(),
            Type::Array { component } => format!("{}[]", component.qualified_name()),
            Type::Named { name, package, .. } => match package {
                Some(package) if !package.is_empty() => format!("{}.{}", package, name),
                _ => name.clone(),
            },
            Type::Param { name } => name.clone(),
        }
    }

    /// The value a synthesized method returns for this type
    pub fn zero_value(&self) -> crate::ir::Literal {
        use crate::ir::Literal;

        match self {
            Type::Boolean => Literal::Bool(false),
            Type::Byte => Literal::Byte(0),
            Type::Char => Literal::Char(' '),
            Type::Short => Literal::Short(0),
            Type::Int => Literal::Int(0),
            Type::Long => Literal::Long(0),
            Type::Float => Literal::Float(0.0),
            Type::Double => Literal::Double(0.0),
            _ => Literal::Null,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named { args, .. } if !args.is_empty() => {
                write!(f, "{}<", self.qualified_name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Type::Array { component } => write!(f, "{}[]", component),
            _ => write!(f, "{}", self.qualified_name()),
        }
    }
}

/// Subtyping oracle supplied by the host
///
/// Only declared supertypes are known; everything else is decided structurally.
#[derive(Debug, Clone, Default)]
pub struct TypeSystem {
    supertypes: BTreeMap<String, Vec<Type>>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self {
            supertypes: BTreeMap::new(),
        }
    }

    /// Declare the direct supertypes (superclass and interfaces) of a type
    pub fn register(&mut self, qualified_name: impl Into<String>, supers: Vec<Type>) {
        self.supertypes
            .entry(qualified_name.into())
            .or_default()
            .extend(supers);
    }

    pub fn supertypes_of(&self, qualified_name: &str) -> &[Type] {
        self.supertypes
            .get(qualified_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `sub` may be used where `sup` is expected
    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        match (sub, sup) {
            (a, b) if a.is_primitive() || b.is_primitive() => a == b,
            (_, Type::Named { name, package, args })
                if args.is_empty() && is_object(name, package.as_deref()) =>
            {
                true
            }
            (Type::Param { name: a }, Type::Param { name: b }) => a == b,
            (Type::Array { component: a }, Type::Array { component: b }) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_subtype(a, b)
                }
            }
            (
                Type::Named { args: sub_args, .. },
                Type::Named { args: sup_args, .. },
            ) => {
                let sub_name = sub.qualified_name();
                let sup_name = sup.qualified_name();
                if sub_name == sup_name {
                    // Raw references are compatible with any parameterization
                    return sub_args.is_empty()
                        || sup_args.is_empty()
                        || (sub_args.len() == sup_args.len()
                            && sub_args
                                .iter()
                                .zip(sup_args)
                                .all(|(a, b)| self.is_equivalent(a, b)));
                }
                self.supertypes_of(&sub_name)
                    .iter()
                    .any(|parent| self.is_subtype(parent, sup))
            }
            _ => false,
        }
    }

    /// Mutual subtyping, the equality used when comparing signatures
    pub fn is_equivalent(&self, a: &Type, b: &Type) -> bool {
        self.is_subtype(a, b) && self.is_subtype(b, a)
    }

    /// Pairwise equivalence of two parameter lists
    pub fn params_equivalent<'a, I, J>(&self, a: I, b: J) -> bool
    where
        I: IntoIterator<Item = &'a Type>,
        J: IntoIterator<Item = &'a Type>,
        I::IntoIter: ExactSizeIterator,
        J::IntoIter: ExactSizeIterator,
    {
        let a = a.into_iter();
        let b = b.into_iter();
        a.len() == b.len() && a.zip(b).all(|(x, y)| self.is_equivalent(x, y))
    }
}

fn is_object(name: &str, package: Option<&str>) -> bool {
    match package {
        Some(package) => format!("{}.{}", package, name) == OBJECT,
        None => name == "Object",
    }
}
