//! Composition of part units into a target unit.
//!
//! Parts are merged in reverse of the order they are listed in, so the last
//! part keeps the plain name of every method it defines and each earlier part
//! defining the same signature is stored one chain layer deeper under a
//! private alias. The first-listed part therefore ends up innermost: its logic
//! runs last when the outer layers delegate through their `_super_` hooks.
//!
//! The pass runs in this order:
//!
//! 1. for each part, methods are inserted (aliasing collisions) and their call
//!    sites rewritten, then fields and interfaces are merged;
//! 2. every chain placeholder that some part activated gets a no-op
//!    terminator one layer below the deepest real override;
//! 3. binding prefixes are stripped from field references across the target.

use crate::config::{ComposeOptions, FieldPolicy};
use crate::error::CoreError;
use crate::ir::{Block, Catalog, Expr, Method, Modifier, Origin, Stmt, Unit, Visibility};
use crate::naming::{next_alias, strip_next, NEXT_PREFIX};
use crate::registry::{PartRegistry, Registry};
use crate::rewrite::{strip_placeholders, CallSiteRewriter, RewriteStats, TypeRepointer};
use crate::types::TypeSystem;
use crate::visit::VisitMut;
use tracing::{debug, info, warn};

/// What a composition added to its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionSummary {
    /// Methods copied from parts, aliased ones included
    pub methods: usize,
    /// Methods stored under a chain alias because of a collision
    pub aliased: usize,
    /// Chain calls redirected to a deeper layer
    pub chain_calls: usize,
    /// Binding calls that lost their prefix
    pub bindings: usize,
    /// Type references re-pointed from a part at the target
    pub type_refs: usize,
    /// Synthesized no-op chain terminators
    pub terminators: usize,
    pub fields: usize,
    pub interfaces: usize,
    /// Field references that lost their binding prefix
    pub stripped: usize,
}

pub struct Composer<'ts> {
    ts: &'ts TypeSystem,
    options: ComposeOptions,
}

impl<'ts> Composer<'ts> {
    pub fn new(ts: &'ts TypeSystem) -> Self {
        Self {
            ts,
            options: ComposeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Merge `parts` into `target`
    ///
    /// On error the target keeps whatever was merged before the failure.
    pub fn compose(
        &self,
        target: &mut Unit,
        parts: &[&Unit],
    ) -> Result<CompositionSummary, CoreError> {
        if parts.is_empty() {
            return Err(CoreError::NoParts(target.qualified_name()));
        }

        info!(
            "Composing {} from {} part(s): {}",
            target.qualified_name(),
            parts.len(),
            parts
                .iter()
                .map(|p| p.qualified_name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        if self.options.trace_origins {
            target
                .sources
                .extend(parts.iter().map(|p| p.qualified_name()));
        }

        let mut summary = CompositionSummary::default();
        let mut registry = Registry::new();

        for part in parts.iter().rev() {
            debug!("Merging part {}", part.qualified_name());
            let own = self.merge_methods(target, part, &registry, &mut summary)?;
            self.merge_fields(target, part, &own, &mut summary)?;
            self.merge_interfaces(target, part, &mut summary);
            registry.push(own);
        }

        summary.terminators = self.synthesize_terminators(target, parts, &registry)?;
        summary.stripped = strip_placeholders(target);

        info!(
            "Composed {}: {} method(s) ({} aliased), {} terminator(s), {} field(s), {} interface(s)",
            target.qualified_name(),
            summary.methods,
            summary.aliased,
            summary.terminators,
            summary.fields,
            summary.interfaces
        );

        Ok(summary)
    }

    /// Compose every unit of the catalog that declares mixins
    ///
    /// Parts are read from the catalog as it was before this call, so a part
    /// that is itself a mixin target contributes its declared members only.
    pub fn compose_catalog(
        &self,
        catalog: &mut Catalog,
    ) -> Result<Vec<(String, CompositionSummary)>, CoreError> {
        let mut composed = Vec::new();
        for target in catalog.mixin_targets() {
            let parts = catalog.resolve_parts(&target.mixins)?;
            let mut result = target.clone();
            let summary = self.compose(&mut result, &parts)?;
            composed.push((result, summary));
        }

        Ok(composed
            .into_iter()
            .map(|(unit, summary)| {
                let name = unit.qualified_name();
                catalog.replace_unit(unit);
                (name, summary)
            })
            .collect())
    }

    /// Insert the concrete methods of one part, aliasing collisions
    fn merge_methods(
        &self,
        target: &mut Unit,
        part: &Unit,
        registry: &Registry,
        summary: &mut CompositionSummary,
    ) -> Result<PartRegistry, CoreError> {
        let mut own = PartRegistry::new(part.qualified_name());
        let target_type = target.as_type();
        let mut repointer = TypeRepointer::new(part, target_type.clone());

        for method in &part.methods {
            if method.is_abstract() {
                continue;
            }
            if method.is_binding_placeholder() {
                debug!("Skipping binding placeholder {}", method.name);
                continue;
            }
            if method.name.starts_with(NEXT_PREFIX) {
                warn!(
                    "{}#{} is concrete but carries the chain prefix; copying it unchanged",
                    part.qualified_name(),
                    method.name
                );
            }

            // Signatures are compared as they read in the target
            let params = repointer.repoint_all(method.param_types());
            let mut copy = method.clone();

            if let Some(previous) = registry.previous(&method.name, &params, self.ts) {
                copy.name = next_alias(&previous.alias)?;
                copy.modifiers.visibility = Visibility::Private;
                summary.aliased += 1;
                debug!(
                    "{}#{} collides with {}, inserted as {}",
                    part.qualified_name(),
                    method.name,
                    previous.alias,
                    copy.name
                );
            }

            if self.options.trace_origins {
                copy.origin = Some(Origin {
                    unit: part.qualified_name(),
                    member: method.name.clone(),
                    params: Some(method.param_types().cloned().collect()),
                });
            }

            let index = target.methods.len();
            own.insert(copy.name.clone(), params, index);
            target.methods.push(copy);
            summary.methods += 1;
        }

        // Call sites are rewritten only once this part's registry is complete.
        let inserted: Vec<usize> = own.iter().map(|r| r.index).collect();
        for index in inserted {
            let stats = CallSiteRewriter::new(part, target_type.clone(), &own, self.ts)
                .rewrite(&mut target.methods[index])?;
            summary.absorb(stats);
        }

        Ok(own)
    }

    fn merge_fields(
        &self,
        target: &mut Unit,
        part: &Unit,
        own: &PartRegistry,
        summary: &mut CompositionSummary,
    ) -> Result<(), CoreError> {
        for field in &part.fields {
            if field.is_binding_placeholder() {
                continue;
            }

            if target.field(&field.name).is_some() {
                match self.options.field_policy {
                    FieldPolicy::KeepAll => {
                        warn!(
                            "{} already has a field `{}`; keeping both copies",
                            target.qualified_name(),
                            field.name
                        );
                    }
                    FieldPolicy::KeepFirst => {
                        debug!(
                            "Skipping field `{}` of {}: already merged",
                            field.name,
                            part.qualified_name()
                        );
                        continue;
                    }
                    FieldPolicy::Reject => {
                        return Err(CoreError::DuplicateField {
                            field: field.name.clone(),
                            part: part.qualified_name(),
                        });
                    }
                }
            }

            let mut copy = field.clone();
            if self.options.trace_origins {
                copy.origin = Some(Origin {
                    unit: part.qualified_name(),
                    member: field.name.clone(),
                    params: None,
                });
            }
            let stats = CallSiteRewriter::new(part, target.as_type(), own, self.ts)
                .rewrite_field(&mut copy)?;
            summary.absorb(stats);
            target.fields.push(copy);
            summary.fields += 1;
        }
        Ok(())
    }

    fn merge_interfaces(&self, target: &mut Unit, part: &Unit, summary: &mut CompositionSummary) {
        for interface in &part.interfaces {
            if !target.implements(interface, self.ts) {
                target.interfaces.push(interface.clone());
                summary.interfaces += 1;
            }
        }
    }

    /// Close every activated chain with a no-op one layer below its deepest override
    fn synthesize_terminators(
        &self,
        target: &mut Unit,
        parts: &[&Unit],
        registry: &Registry,
    ) -> Result<usize, CoreError> {
        let mut closed = PartRegistry::new(target.qualified_name());

        for part in parts.iter().rev() {
            for hook in part.methods.iter().filter(|m| m.is_chain_placeholder()) {
                let Some(base) = strip_next(&hook.name) else {
                    continue;
                };
                let params =
                    TypeRepointer::new(part, target.as_type()).repoint_all(hook.param_types());

                if closed.find(base, &params, self.ts).is_some() {
                    continue;
                }
                let Some(deepest) = registry.deepest(base, &params, self.ts) else {
                    debug!(
                        "{}#{} is never activated, no terminator needed",
                        part.qualified_name(),
                        hook.name
                    );
                    continue;
                };

                let alias = next_alias(&deepest.alias)?;
                let mut terminator = self.terminator(hook, alias.clone(), part);
                TypeRepointer::new(part, target.as_type()).visit_method_mut(&mut terminator);

                debug!("Terminating chain {} with {}", base, alias);
                let index = target.methods.len();
                target.methods.push(terminator);
                closed.insert(alias, params, index);
            }
        }

        Ok(closed.len())
    }

    fn terminator(&self, hook: &Method, alias: String, part: &Unit) -> Method {
        let mut modifiers = hook.modifiers.clone();
        modifiers.flags.remove(&Modifier::Abstract);
        modifiers.visibility = Visibility::Private;

        let statements = if hook.return_type.is_void() {
            Vec::new()
        } else {
            vec![Stmt::ret(Some(Expr::literal(hook.return_type.zero_value())))]
        };

        Method {
            name: alias,
            params: hook.params.clone(),
            return_type: hook.return_type.clone(),
            modifiers,
            body: Some(Block { statements }),
            documentation: None,
            origin: self.options.trace_origins.then(|| Origin {
                unit: part.qualified_name(),
                member: hook.name.clone(),
                params: Some(hook.param_types().cloned().collect()),
            }),
        }
    }
}

impl CompositionSummary {
    fn absorb(&mut self, stats: RewriteStats) {
        self.chain_calls += stats.chain_calls;
        self.bindings += stats.bindings;
        self.type_refs += stats.type_refs;
    }
}

/// Compose with a structural type system and default options
pub fn compose(mut target: Unit, parts: &[Unit]) -> Result<Unit, CoreError> {
    let ts = TypeSystem::new();
    let parts: Vec<&Unit> = parts.iter().collect();
    Composer::new(&ts).compose(&mut target, &parts)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Literal};
    use crate::types::Type;

    fn printing(part: &str, label: &str) -> Unit {
        Unit::new(part)
            .abstract_unit()
            .with_method(Method::new("print", Type::Void).with_body(vec![
                Stmt::expr(Expr::call("println", vec![Expr::string(label)])),
                Stmt::expr(Expr::call("_super_print", vec![])),
            ]))
            .with_method(
                Method::new("_super_print", Type::Void)
                    .with_visibility(Visibility::Protected)
                    .into_abstract(),
            )
    }

    #[test]
    fn test_empty_part_list_is_rejected() {
        let ts = TypeSystem::new();
        let mut target = Unit::new("p.T");
        let err = Composer::new(&ts).compose(&mut target, &[]).unwrap_err();
        assert_eq!(err, CoreError::NoParts("p.T".to_string()));
    }

    #[test]
    fn test_last_part_keeps_plain_name() {
        let a = printing("p.A", "A");
        let b = printing("p.B", "B");
        let target = compose(Unit::new("p.T"), &[a, b]).unwrap();

        let print = target.method("print").unwrap();
        assert_eq!(print.modifiers.visibility, Visibility::Public);
        assert_eq!(print.origin.as_ref().unwrap().unit, "p.B");

        let layer = target.method("print#0").unwrap();
        assert_eq!(layer.modifiers.visibility, Visibility::Private);
        assert_eq!(layer.origin.as_ref().unwrap().unit, "p.A");
    }

    #[test]
    fn test_terminator_returns_zero_value() {
        let part = Unit::new("p.Counter")
            .with_method(Method::new("count", Type::Int).with_body(vec![Stmt::ret(Some(
                Expr::call("_super_count", vec![]),
            ))]))
            .with_method(Method::new("_super_count", Type::Int).into_abstract());

        let target = compose(Unit::new("p.T"), &[part]).unwrap();
        let terminator = target.method("count#0").unwrap();

        assert!(!terminator.is_abstract());
        assert_eq!(terminator.modifiers.visibility, Visibility::Private);
        assert_eq!(
            terminator.body.as_ref().unwrap().statements,
            vec![Stmt::ret(Some(Expr::literal(Literal::Int(0))))]
        );
    }

    #[test]
    fn test_inactive_hook_is_dropped() {
        let part = Unit::new("p.Quiet")
            .with_method(Method::new("_super_shout", Type::Void).into_abstract())
            .with_method(Method::new("_this_volume", Type::Int).into_abstract());

        let target = compose(Unit::new("p.T"), &[part]).unwrap();
        assert!(target.methods.is_empty());
    }

    #[test]
    fn test_interfaces_keep_distinct_type_arguments() {
        let comparable = Type::named("java.lang.Comparable");
        let a = Unit::new("p.A")
            .with_interface(comparable.clone().with_args(vec![Type::named("p.Y")]))
            .with_interface(Type::named("p.Shared"));
        let b = Unit::new("p.B")
            .with_interface(comparable.clone().with_args(vec![Type::named("p.X")]))
            .with_interface(Type::named("p.Shared"));

        let target = compose(Unit::new("p.T"), &[a, b]).unwrap();
        let rendered: Vec<_> = target.interfaces.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "java.lang.Comparable<p.X>",
                "p.Shared",
                "java.lang.Comparable<p.Y>",
            ]
        );
    }

    #[test]
    fn test_field_policy_keep_first() {
        let ts = TypeSystem::new();
        let a = Unit::new("p.A").with_field(Field::new("label", Type::Int));
        let b = Unit::new("p.B").with_field(Field::new("label", Type::Long));
        let mut target = Unit::new("p.T");

        let options = ComposeOptions {
            field_policy: FieldPolicy::KeepFirst,
            ..Default::default()
        };
        let summary = Composer::new(&ts)
            .with_options(options)
            .compose(&mut target, &[&a, &b])
            .unwrap();

        assert_eq!(summary.fields, 1);
        assert_eq!(target.fields.len(), 1);
        // B is merged first
        assert_eq!(target.fields[0].ty, Type::Long);
    }

    #[test]
    fn test_field_policy_reject() {
        let ts = TypeSystem::new();
        let a = Unit::new("p.A").with_field(Field::new("label", Type::Int));
        let b = Unit::new("p.B").with_field(Field::new("label", Type::Int));
        let mut target = Unit::new("p.T");

        let options = ComposeOptions {
            field_policy: FieldPolicy::Reject,
            ..Default::default()
        };
        let err = Composer::new(&ts)
            .with_options(options)
            .compose(&mut target, &[&a, &b])
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::DuplicateField {
                field: "label".to_string(),
                part: "p.A".to_string(),
            }
        );
        // Not transactional: B's field stays
        assert_eq!(target.fields.len(), 1);
    }

    #[test]
    fn test_no_trace_leaves_members_bare() {
        let ts = TypeSystem::new();
        let part = printing("p.A", "A").with_field(Field::new("x", Type::Int));
        let mut target = Unit::new("p.T");

        let options = ComposeOptions {
            trace_origins: false,
            ..Default::default()
        };
        Composer::new(&ts)
            .with_options(options)
            .compose(&mut target, &[&part])
            .unwrap();

        assert!(target.sources.is_empty());
        assert!(target.methods.iter().all(|m| m.origin.is_none()));
        assert!(target.fields.iter().all(|f| f.origin.is_none()));
    }

    #[test]
    fn test_compose_catalog() {
        let mut catalog = Catalog::new();
        catalog.add_unit(printing("p.A", "A"));
        catalog.add_unit(printing("p.B", "B"));
        catalog.add_unit(Unit::new("p.T").with_mixins(["p.A", "B"]));

        let ts = TypeSystem::new();
        let composed = Composer::new(&ts).compose_catalog(&mut catalog).unwrap();

        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].0, "p.T");
        assert_eq!(composed[0].1.terminators, 1);

        let target = catalog.find_unit("p.T").unwrap();
        assert_eq!(target.sources, vec!["p.A".to_string(), "p.B".to_string()]);
        assert!(target.method("print#1").is_some());
    }

    #[test]
    fn test_compose_catalog_missing_part() {
        let mut catalog = Catalog::new();
        catalog.add_unit(Unit::new("p.T").with_mixins(["p.Missing"]));

        let ts = TypeSystem::new();
        let err = Composer::new(&ts).compose_catalog(&mut catalog).unwrap_err();
        assert_eq!(err, CoreError::UnitNotFound("p.Missing".to_string()));
    }
}
