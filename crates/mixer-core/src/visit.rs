//! Traversal of method bodies and signatures.
//!
//! [`Visit`] walks a tree by shared reference and [`VisitMut`] by mutable
//! reference. Each hook defaults to the matching `walk_*` function, so an
//! implementation overrides only the nodes it cares about and calls the walk
//! function itself when it still wants the children visited.

use crate::ir::{Block, Expr, Field, FieldRef, Method, MethodRef, Stmt, Unit};
use crate::types::Type;

pub trait Visit<'ast> {
    fn visit_method(&mut self, method: &'ast Method) {
        walk_method(self, method);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_method_ref(&mut self, _method: &'ast MethodRef) {}

    fn visit_field_ref(&mut self, _field: &'ast FieldRef) {}

    fn visit_type(&mut self, _ty: &'ast Type) {}
}

pub trait VisitMut {
    fn visit_unit_mut(&mut self, unit: &mut Unit) {
        walk_unit_mut(self, unit);
    }

    fn visit_method_mut(&mut self, method: &mut Method) {
        walk_method_mut(self, method);
    }

    fn visit_field_mut(&mut self, field: &mut Field) {
        walk_field_mut(self, field);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_method_ref_mut(&mut self, method: &mut MethodRef) {
        walk_method_ref_mut(self, method);
    }

    fn visit_field_ref_mut(&mut self, field: &mut FieldRef) {
        walk_field_ref_mut(self, field);
    }

    fn visit_type_mut(&mut self, ty: &mut Type) {
        walk_type_mut(self, ty);
    }
}

pub fn walk_method<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, method: &'ast Method) {
    for param in &method.params {
        v.visit_type(&param.ty);
    }
    v.visit_type(&method.return_type);
    if let Some(body) = &method.body {
        v.visit_block(body);
    }
}

pub fn walk_block<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.statements {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Expr { expr } => v.visit_expr(expr),
        Stmt::Return { value } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::Local { ty, init, .. } => {
            v.visit_type(ty);
            if let Some(init) = init {
                v.visit_expr(init);
            }
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(otherwise) = otherwise {
                v.visit_block(otherwise);
            }
        }
        Stmt::Block { block } => v.visit_block(block),
    }
}

pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Literal { .. } | Expr::This | Expr::Local { .. } => {}
        Expr::Field { target, field } => {
            if let Some(target) = target {
                v.visit_expr(target);
            }
            if let Some(declaring) = &field.declaring {
                v.visit_type(declaring);
            }
            v.visit_field_ref(field);
        }
        Expr::Invoke {
            target,
            method,
            args,
        } => {
            if let Some(target) = target {
                v.visit_expr(target);
            }
            if let Some(declaring) = &method.declaring {
                v.visit_type(declaring);
            }
            for ty in &method.params {
                v.visit_type(ty);
            }
            v.visit_method_ref(method);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::New { ty, args } => {
            v.visit_type(ty);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Assign { target, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::Cast { ty, operand } => {
            v.visit_type(ty);
            v.visit_expr(operand);
        }
    }
}

pub fn walk_unit_mut<V: VisitMut + ?Sized>(v: &mut V, unit: &mut Unit) {
    for field in &mut unit.fields {
        v.visit_field_mut(field);
    }
    for method in &mut unit.methods {
        v.visit_method_mut(method);
    }
}

pub fn walk_method_mut<V: VisitMut + ?Sized>(v: &mut V, method: &mut Method) {
    for param in &mut method.params {
        v.visit_type_mut(&mut param.ty);
    }
    v.visit_type_mut(&mut method.return_type);
    if let Some(body) = &mut method.body {
        v.visit_block_mut(body);
    }
}

pub fn walk_field_mut<V: VisitMut + ?Sized>(v: &mut V, field: &mut Field) {
    v.visit_type_mut(&mut field.ty);
    if let Some(init) = &mut field.init {
        v.visit_expr_mut(init);
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.statements {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Expr { expr } => v.visit_expr_mut(expr),
        Stmt::Return { value } => {
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        Stmt::Local { ty, init, .. } => {
            v.visit_type_mut(ty);
            if let Some(init) = init {
                v.visit_expr_mut(init);
            }
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr_mut(cond);
            v.visit_block_mut(then);
            if let Some(otherwise) = otherwise {
                v.visit_block_mut(otherwise);
            }
        }
        Stmt::Block { block } => v.visit_block_mut(block),
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Literal { .. } | Expr::This | Expr::Local { .. } => {}
        Expr::Field { target, field } => {
            if let Some(target) = target {
                v.visit_expr_mut(target);
            }
            v.visit_field_ref_mut(field);
        }
        Expr::Invoke {
            target,
            method,
            args,
        } => {
            if let Some(target) = target {
                v.visit_expr_mut(target);
            }
            v.visit_method_ref_mut(method);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::New { ty, args } => {
            v.visit_type_mut(ty);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Assign { target, value } => {
            v.visit_expr_mut(target);
            v.visit_expr_mut(value);
        }
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr_mut(lhs);
            v.visit_expr_mut(rhs);
        }
        Expr::Cast { ty, operand } => {
            v.visit_type_mut(ty);
            v.visit_expr_mut(operand);
        }
    }
}

pub fn walk_method_ref_mut<V: VisitMut + ?Sized>(v: &mut V, method: &mut MethodRef) {
    if let Some(declaring) = &mut method.declaring {
        v.visit_type_mut(declaring);
    }
    for ty in &mut method.params {
        v.visit_type_mut(ty);
    }
}

pub fn walk_field_ref_mut<V: VisitMut + ?Sized>(v: &mut V, field: &mut FieldRef) {
    if let Some(declaring) = &mut field.declaring {
        v.visit_type_mut(declaring);
    }
}

pub fn walk_type_mut<V: VisitMut + ?Sized>(v: &mut V, ty: &mut Type) {
    match ty {
        Type::Array { component } => v.visit_type_mut(component),
        Type::Named { args, .. } => {
            for arg in args {
                v.visit_type_mut(arg);
            }
        }
        _ => {}
    }
}

/// Names of every method invoked anywhere in `method`'s body
pub fn invoked_methods(method: &Method) -> Vec<&MethodRef> {
    struct Calls<'ast>(Vec<&'ast MethodRef>);

    impl<'ast> Visit<'ast> for Calls<'ast> {
        fn visit_method_ref(&mut self, method: &'ast MethodRef) {
            self.0.push(method);
        }
    }

    let mut calls = Calls(Vec::new());
    calls.visit_method(method);
    calls.0
}

/// Every field reference in `method`'s body
pub fn accessed_fields(method: &Method) -> Vec<&FieldRef> {
    struct Fields<'ast>(Vec<&'ast FieldRef>);

    impl<'ast> Visit<'ast> for Fields<'ast> {
        fn visit_field_ref(&mut self, field: &'ast FieldRef) {
            self.0.push(field);
        }
    }

    let mut fields = Fields(Vec::new());
    fields.visit_method(method);
    fields.0
}
