//! Rewriting of placeholder references inside composed members

use crate::error::CoreError;
use crate::ir::{Field, FieldRef, Method, MethodRef, Unit};
use crate::naming::{next_alias, strip_next, strip_requires};
use crate::registry::PartRegistry;
use crate::types::{Type, TypeSystem};
use crate::visit::{walk_method_ref_mut, walk_type_mut, VisitMut};
use tracing::trace;

/// Counts of what a rewrite pass touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub bindings: usize,
    pub chain_calls: usize,
    pub type_refs: usize,
}

/// Re-points references to a part's own declaration at the target
pub struct TypeRepointer {
    from: String,
    to: Type,
    pub rewritten: usize,
}

impl TypeRepointer {
    pub fn new(from: &Unit, to: Type) -> Self {
        Self {
            from: from.qualified_name(),
            to,
            rewritten: 0,
        }
    }

    /// Re-pointed copies of `types`, e.g. a parameter list as it will read in the target
    pub fn repoint_all<'t>(&mut self, types: impl IntoIterator<Item = &'t Type>) -> Vec<Type> {
        types
            .into_iter()
            .map(|ty| {
                let mut ty = ty.clone();
                self.visit_type_mut(&mut ty);
                ty
            })
            .collect()
    }
}

impl VisitMut for TypeRepointer {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        let matches = matches!(ty, Type::Named { .. }) && ty.qualified_name() == self.from;
        if matches {
            if let Type::Named { args, .. } = ty {
                let args = std::mem::take(args);
                *ty = self.to.clone().with_args(args);
                self.rewritten += 1;
            }
        }
        walk_type_mut(self, ty);
    }
}

/// Rewrites the call sites of one method freshly copied out of a part
///
/// Binding placeholder calls lose their prefix. Chain placeholder calls are
/// redirected one layer below the method the part itself inserted under the
/// chained base name; the part registry must already hold that method.
pub struct CallSiteRewriter<'a> {
    registry: &'a PartRegistry,
    ts: &'a TypeSystem,
    types: TypeRepointer,
    stats: RewriteStats,
    error: Option<CoreError>,
}

impl<'a> CallSiteRewriter<'a> {
    pub fn new(
        part: &Unit,
        target: Type,
        registry: &'a PartRegistry,
        ts: &'a TypeSystem,
    ) -> Self {
        Self {
            registry,
            ts,
            types: TypeRepointer::new(part, target),
            stats: RewriteStats::default(),
            error: None,
        }
    }

    pub fn rewrite(mut self, method: &mut Method) -> Result<RewriteStats, CoreError> {
        self.visit_method_mut(method);
        self.finish()
    }

    /// Same as [`Self::rewrite`] for a field's type and initializer
    pub fn rewrite_field(mut self, field: &mut Field) -> Result<RewriteStats, CoreError> {
        self.visit_field_mut(field);
        self.finish()
    }

    fn finish(mut self) -> Result<RewriteStats, CoreError> {
        match self.error {
            Some(error) => Err(error),
            None => {
                self.stats.type_refs = self.types.rewritten;
                Ok(self.stats)
            }
        }
    }

    fn redirect_chain_call(&self, base: &str, params: &[Type]) -> Result<String, CoreError> {
        let layer = self
            .registry
            .find(base, params, self.ts)
            .ok_or_else(|| CoreError::UnresolvedChainCall {
                base: base.to_string(),
                part: self.registry.part().to_string(),
            })?;
        next_alias(&layer.alias)
    }
}

impl VisitMut for CallSiteRewriter<'_> {
    fn visit_method_ref_mut(&mut self, method: &mut MethodRef) {
        if self.error.is_some() {
            return;
        }
        // Parameter types first, so chain lookups compare them as the target sees them
        walk_method_ref_mut(self, method);
        if let Some(plain) = strip_requires(&method.name) {
            trace!("binding call {} -> {}", method.name, plain);
            method.name = plain.to_string();
            self.stats.bindings += 1;
        } else if let Some(base) = strip_next(&method.name) {
            match self.redirect_chain_call(base, &method.params) {
                Ok(alias) => {
                    trace!("chain call {} -> {}", method.name, alias);
                    method.name = alias;
                    self.stats.chain_calls += 1;
                }
                Err(error) => self.error = Some(error),
            }
        }
    }

    fn visit_type_mut(&mut self, ty: &mut Type) {
        self.types.visit_type_mut(ty);
    }
}

/// Strips the binding prefix from every field reference in a unit
#[derive(Debug, Default)]
pub struct PlaceholderStripper {
    pub stripped: usize,
}

impl VisitMut for PlaceholderStripper {
    fn visit_field_ref_mut(&mut self, field: &mut FieldRef) {
        if let Some(plain) = strip_requires(&field.name) {
            field.name = plain.to_string();
            self.stripped += 1;
        }
    }
}

/// Run [`PlaceholderStripper`] over the whole unit, returning how many references changed
pub fn strip_placeholders(unit: &mut Unit) -> usize {
    let mut stripper = PlaceholderStripper::default();
    stripper.visit_unit_mut(unit);
    stripper.stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Expr, Stmt};
    use crate::visit::{accessed_fields, invoked_methods};

    fn part() -> Unit {
        Unit::new("jmixer.Flying")
    }

    fn target() -> Unit {
        Unit::new("jmixer.Duck")
    }

    fn names(method: &Method) -> Vec<String> {
        invoked_methods(method)
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    #[test]
    fn test_binding_calls_lose_prefix() {
        let registry = PartRegistry::new("jmixer.Flying");
        let ts = TypeSystem::new();
        let mut method = Method::new("fly", Type::Void).with_body(vec![Stmt::expr(Expr::call(
            "_this_flap",
            vec![Expr::call("_this_wings", vec![])],
        ))]);

        let stats = CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap();

        assert_eq!(names(&method), vec!["flap", "wings"]);
        assert_eq!(stats.bindings, 2);
        assert_eq!(stats.chain_calls, 0);
    }

    #[test]
    fn test_chain_call_goes_one_layer_below_own_method() {
        let mut registry = PartRegistry::new("jmixer.Flying");
        registry.insert("print#0", vec![], 0);
        let ts = TypeSystem::new();
        let mut method = Method::new("print#0", Type::Void)
            .with_body(vec![Stmt::expr(Expr::call("_super_print", vec![]))]);

        let stats = CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap();

        assert_eq!(names(&method), vec!["print#1"]);
        assert_eq!(stats.chain_calls, 1);
    }

    #[test]
    fn test_chain_call_matches_parameters() {
        let mut registry = PartRegistry::new("jmixer.Flying");
        registry.insert("log", vec![Type::Int], 0);
        registry.insert("log#2", vec![Type::named("java.lang.String")], 1);
        let ts = TypeSystem::new();
        let mut method = Method::new("log#2", Type::Void)
            .with_param("msg", Type::named("java.lang.String"))
            .with_body(vec![Stmt::expr(Expr::call_with(
                "_super_log",
                vec![Type::named("java.lang.String")],
                vec![Expr::local("msg")],
            ))]);

        CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap();

        assert_eq!(names(&method), vec!["log#3"]);
    }

    #[test]
    fn test_unmatched_chain_call_is_fatal() {
        let mut registry = PartRegistry::new("jmixer.Flying");
        registry.insert("fly", vec![], 0);
        let ts = TypeSystem::new();
        let mut method = Method::new("fly", Type::Void)
            .with_body(vec![Stmt::expr(Expr::call("_super_print", vec![]))]);

        let err = CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::UnresolvedChainCall {
                base: "print".to_string(),
                part: "jmixer.Flying".to_string(),
            }
        );
        assert!(err.to_string().contains("jmixer.Flying"));
        assert!(err.to_string().contains("print"));
    }

    #[test]
    fn test_self_type_references_point_at_target() {
        let registry = PartRegistry::new("jmixer.Flying");
        let ts = TypeSystem::new();
        let flying = Type::named("jmixer.Flying");
        let mut method = Method::new("copy", flying.clone())
            .with_param("other", flying.clone())
            .with_body(vec![Stmt::ret(Some(Expr::Cast {
                ty: Type::named("java.util.List").with_args(vec![flying.clone()]),
                operand: Box::new(Expr::local("other")),
            }))]);

        let stats = CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap();

        let duck = Type::named("jmixer.Duck");
        assert_eq!(method.return_type, duck);
        assert_eq!(method.params[0].ty, duck);
        assert_eq!(stats.type_refs, 3);
    }

    #[test]
    fn test_chain_call_compares_retargeted_parameters() {
        let duck = Type::named("jmixer.Duck");
        let mut registry = PartRegistry::new("jmixer.Flying");
        registry.insert("merge", vec![duck.clone()], 0);
        let ts = TypeSystem::new();
        let mut method = Method::new("merge", Type::Void)
            .with_param("other", Type::named("jmixer.Flying"))
            .with_body(vec![Stmt::expr(Expr::call_with(
                "_super_merge",
                vec![Type::named("jmixer.Flying")],
                vec![Expr::local("other")],
            ))]);

        CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite(&mut method)
            .unwrap();

        let calls = invoked_methods(&method);
        assert_eq!(calls[0].name, "merge#0");
        assert_eq!(calls[0].params, vec![duck]);
    }

    #[test]
    fn test_field_initializer_is_rewritten() {
        let registry = PartRegistry::new("jmixer.Flying");
        let ts = TypeSystem::new();
        let mut field = Field::new("self_ref", Type::named("jmixer.Flying"))
            .with_init(Expr::call("_this_name", vec![]));

        let stats = CallSiteRewriter::new(&part(), target().as_type(), &registry, &ts)
            .rewrite_field(&mut field)
            .unwrap();

        assert_eq!(field.ty, Type::named("jmixer.Duck"));
        match field.init {
            Some(Expr::Invoke { ref method, .. }) => assert_eq!(method.name, "name"),
            ref other => panic!("unexpected initializer {:?}", other),
        }
        assert_eq!(stats.bindings, 1);
        assert_eq!(stats.type_refs, 1);
    }

    #[test]
    fn test_repoint_all_leaves_other_types() {
        let mut repointer = TypeRepointer::new(&part(), target().as_type());
        let params = [Type::Int, Type::named("jmixer.Flying")];
        assert_eq!(
            repointer.repoint_all(&params),
            vec![Type::Int, Type::named("jmixer.Duck")]
        );
        assert_eq!(repointer.rewritten, 1);
    }

    #[test]
    fn test_stripper_covers_all_members() {
        let mut unit = target()
            .with_method(Method::new("show", Type::Void).with_body(vec![
                Stmt::expr(Expr::call("println", vec![Expr::field("_this_name")])),
                Stmt::expr(Expr::assign(Expr::field("_this_count"), Expr::field("count"))),
            ]))
            .with_method(Method::new("plain", Type::Void));

        assert_eq!(strip_placeholders(&mut unit), 2);
        let fields: Vec<_> = accessed_fields(&unit.methods[0])
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(fields, vec!["name", "count", "count"]);
    }
}
