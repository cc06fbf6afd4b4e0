//! Declaration pass.
//!
//! Names are declared first so that signatures may refer to each other in
//! any order. Signatures are then linked in sub-passes: generic parameters,
//! alias targets, the remaining declared-type facts the type relations
//! consult (union members, `implements` lists, ownership), and finally
//! function, field and case types. Duplicate functions are settled just
//! before that last sub-pass and never reach it.

use std::collections::HashMap;

use kiln_ast::{Ast, DeclId, DeclKind, Ownership, Type, TypeKind};
use kiln_core::{CompilationPhase, DiagnosticKind, Symbol};

use super::Linker;
use super::types::TypeUse;
use crate::error::{LinkError, LinkResult};
use crate::relate::all_same;
use crate::signature::{FunctionSig, OwnershipInfo, ParamInfo, ParamSig};

/// A function declared twice under the same name in the same frame.
struct Redeclaration {
    namespace: Option<DeclId>,
    first: DeclId,
    second: DeclId,
}

impl<'db> Linker<'_, 'db> {
    pub fn declare_items(&mut self) -> LinkResult<()> {
        let _span = tracing::debug_span!("declare_items").entered();
        let ast = self.ast;

        let mut redeclared = Vec::new();
        for &item in ast.items() {
            self.declare_item(None, item, &mut redeclared);
        }

        let owners = self.signature_owners();
        for &decl in &owners {
            self.record_generics(decl);
        }
        for &decl in &owners {
            self.in_namespaces(decl, |this| this.link_generic_params(decl));
        }
        for &decl in &owners {
            self.in_namespaces(decl, |this| this.link_alias(decl));
        }
        for &decl in &owners {
            self.in_namespaces(decl, |this| this.link_type_facts(decl));
        }
        let mut survivors = HashMap::new();
        for redeclaration in redeclared {
            self.check_redeclaration(redeclaration, &mut survivors);
        }
        for &decl in &owners {
            if self.ignored.contains(&decl) {
                continue;
            }
            self.in_namespaces(decl, |this| this.link_signature(decl))?;
        }
        tracing::debug!(
            signatures = owners.len(),
            ignored = self.ignored.len(),
            "declared items"
        );
        Ok(())
    }

    fn declare_item(
        &mut self,
        namespace: Option<DeclId>,
        item: DeclId,
        redeclared: &mut Vec<Redeclaration>,
    ) {
        let ast = self.ast;
        let decl = ast.decl(item);
        let previous = match namespace {
            None => self.scopes.find_in_frame(decl.name),
            Some(ns) => self.namespaces.find(ns, decl.name),
        };
        if let Some(first) = previous
            && ast.decl(first).as_function().is_some()
            && decl.as_function().is_some()
        {
            redeclared.push(Redeclaration {
                namespace,
                first,
                second: item,
            });
        }
        match namespace {
            None => self.scopes.declare(decl.name, item),
            Some(ns) => self.namespaces.declare(ns, decl.name, item),
        }
        if let DeclKind::Namespace(ns) = &decl.kind {
            for &member in &ns.members {
                self.declare_item(Some(item), member, redeclared);
            }
        }
    }

    /// Every declaration with a signature, in source order: items, the
    /// members of namespaces and the methods of interfaces.
    pub(super) fn signature_owners(&self) -> Vec<DeclId> {
        fn walk(ast: &Ast, decl: DeclId, out: &mut Vec<DeclId>) {
            match &ast.decl(decl).kind {
                DeclKind::Namespace(ns) => {
                    for &member in &ns.members {
                        walk(ast, member, out);
                    }
                }
                DeclKind::Interface(iface) => {
                    out.push(decl);
                    out.extend(iface.methods.iter().copied());
                }
                _ => out.push(decl),
            }
        }
        let mut out = Vec::new();
        for &item in self.ast.items() {
            walk(self.ast, item, &mut out);
        }
        out
    }

    fn record_generics(&mut self, decl: DeclId) {
        let generics = self.ast.decl(decl).generics();
        if generics.is_empty() {
            return;
        }
        for &param in generics {
            let gp = self.ast.generic_param(param);
            self.program.sigs.params.insert(
                param,
                ParamInfo {
                    owner: decl,
                    index: gp.index,
                },
            );
        }
        self.program.sigs.generics.insert(decl, generics.to_vec());
    }

    fn link_generic_params(&mut self, decl: DeclId) {
        let ast = self.ast;
        let generics = ast.decl(decl).generics();
        if generics.is_empty() {
            return;
        }
        let host = self.generic_host(decl);
        let frame = self.generic_frame(decl);
        let token = self.scopes.scope_start_with(&frame);
        for &param in generics {
            let gp = ast.generic_param(param);
            if let Some(bound) = gp.bound {
                let ty = self.link_type(bound, host, TypeUse::Annotation);
                self.program.sigs.bounds.insert(param, ty);
            }
            if let Some(default) = gp.default {
                let ty = self.link_type(default, host, TypeUse::Annotation);
                self.program.sigs.defaults.insert(param, ty);
            }
        }
        self.scopes.scope_end(token);
    }

    fn link_alias(&mut self, decl: DeclId) {
        let ast = self.ast;
        let DeclKind::TypeAlias(alias) = &ast.decl(decl).kind else {
            return;
        };
        let frame = self.generic_frame(decl);
        let token = self.scopes.scope_start_with(&frame);
        let target = self.link_type(alias.target, self.generic_host(decl), TypeUse::Annotation);
        self.program.sigs.alias_targets.insert(decl, target);
        self.scopes.scope_end(token);
    }

    fn link_type_facts(&mut self, decl: DeclId) {
        let ast = self.ast;
        let host = self.generic_host(decl);
        let frame = self.generic_frame(decl);
        let token = self.scopes.scope_start_with(&frame);
        match &ast.decl(decl).kind {
            DeclKind::Union(union) => {
                let members = union
                    .members
                    .iter()
                    .map(|m| self.link_type(*m, host, TypeUse::Use))
                    .collect();
                self.program.sigs.union_members.insert(decl, members);
            }
            DeclKind::Struct(strukt) => {
                let mut interfaces = Vec::new();
                for &iface in &strukt.implements {
                    let ty = self.link_type(iface, host, TypeUse::Annotation);
                    match ty.kind(self.db) {
                        TypeKind::Linked { decl: target, .. }
                            if matches!(ast.decl(*target).kind, DeclKind::Interface(_)) =>
                        {
                            interfaces.push(*target);
                        }
                        TypeKind::Unknown => {}
                        _ => {
                            let shown = self.show(ty);
                            self.report(
                                DiagnosticKind::TypeMismatch,
                                CompilationPhase::Declaration,
                                ast.type_expr(iface).span,
                                format!("`{shown}` is not an interface"),
                            );
                        }
                    }
                }
                if !interfaces.is_empty() {
                    self.program.sigs.implements.insert(decl, interfaces);
                }
                if let Ownership::Owned { destructor } = &strukt.ownership {
                    let destructor = destructor.and_then(|name| self.resolve_destructor(decl, name));
                    self.program
                        .sigs
                        .ownership
                        .insert(decl, OwnershipInfo::Owned { destructor });
                }
            }
            _ => {}
        }
        self.scopes.scope_end(token);
    }

    fn resolve_destructor(&mut self, strukt: DeclId, name: Symbol) -> Option<DeclId> {
        let found = self
            .scopes
            .find(name)
            .filter(|d| self.ast.decl(*d).as_function().is_some());
        if found.is_none() {
            let span = self.ast.decl(strukt).span;
            let owner = self.name_of(strukt);
            self.report(
                DiagnosticKind::UnresolvedSymbol,
                CompilationPhase::Declaration,
                span,
                format!("destructor `{name}` of `{owner}` is not a function in scope"),
            );
        }
        found
    }

    fn link_signature(&mut self, decl: DeclId) -> LinkResult<()> {
        let ast = self.ast;
        let host = self.generic_host(decl);
        let frame = self.generic_frame(decl);
        let token = self.scopes.scope_start_with(&frame);
        let result = self.link_signature_in_frame(decl, host);
        self.scopes.scope_end(token);
        if result.is_ok()
            && let Some(func) = ast.decl(decl).as_function()
            && func.body.is_some()
        {
            self.bodies.push(decl);
        }
        result
    }

    fn link_signature_in_frame(&mut self, decl: DeclId, host: Option<DeclId>) -> LinkResult<()> {
        let ast = self.ast;
        match &ast.decl(decl).kind {
            DeclKind::Function(func) => {
                let mut params = Vec::with_capacity(func.params.len());
                for &param in &func.params {
                    let DeclKind::Parameter(p) = &ast.decl(param).kind else {
                        return Err(LinkError::unexpected_decl(param, "parameter"));
                    };
                    let ty = self.link_type(p.ty, host, TypeUse::Use);
                    self.program.sigs.decl_types.insert(param, ty);
                    params.push(ParamSig {
                        decl: param,
                        ty,
                        implicit: p.implicit,
                    });
                }
                let ret = match func.ret {
                    Some(ret) => self.link_type(ret, host, TypeUse::Use),
                    None => Type::void(self.db),
                };
                self.program
                    .sigs
                    .functions
                    .insert(decl, FunctionSig { params, ret });
            }
            DeclKind::Struct(strukt) => {
                let fields = strukt
                    .fields
                    .iter()
                    .map(|f| (f.name, self.link_type(f.ty, host, TypeUse::Use)))
                    .collect();
                self.program.sigs.fields.insert(decl, fields);
            }
            DeclKind::Variant(variant) => {
                let cases = variant
                    .cases
                    .iter()
                    .map(|c| (c.name, c.payload.map(|p| self.link_type(p, host, TypeUse::Use))))
                    .collect();
                self.program.sigs.cases.insert(decl, cases);
            }
            DeclKind::Variable(var) => {
                let ty = match var.ty {
                    Some(ty) => self.link_type(ty, host, TypeUse::Use),
                    None => Type::unknown(self.db),
                };
                self.program.sigs.decl_types.insert(decl, ty);
            }
            DeclKind::Parameter(_) => return Err(LinkError::unexpected_decl(decl, "item")),
            DeclKind::Interface(_)
            | DeclKind::Union(_)
            | DeclKind::TypeAlias(_)
            | DeclKind::GenericParam(_)
            | DeclKind::Namespace(_) => {}
        }
        Ok(())
    }

    /// Two functions with the same name in one frame: if their explicit
    /// parameter types agree, the second is a duplicate and is ignored.
    /// Otherwise the second shadows the first.
    ///
    /// `survivors` maps each ignored duplicate to the definition kept in
    /// its place.
    fn check_redeclaration(
        &mut self,
        redeclaration: Redeclaration,
        survivors: &mut HashMap<DeclId, DeclId>,
    ) {
        let Redeclaration {
            namespace,
            first,
            second,
        } = redeclaration;
        let first = survivors.get(&first).copied().unwrap_or(first);
        let (Some(a), Some(b)) = (
            self.annotated_params(first),
            self.annotated_params(second),
        ) else {
            return;
        };
        if !all_same(self.db, &self.program.sigs, &a, &b) {
            return;
        }
        let name = self.name_of(second);
        let span = self.ast.decl(second).span;
        self.report(
            DiagnosticKind::StructuralAmbiguity,
            CompilationPhase::Declaration,
            span,
            format!("duplicate definition of `{name}` with the same parameter types"),
        );
        self.ignored.insert(second);
        survivors.insert(second, first);
        match namespace {
            None => self.scopes.declare(name, first),
            Some(ns) => self.namespaces.declare(ns, name, first),
        }
    }

    /// Explicit parameter types of function `decl`, linked as annotations
    /// so that nothing is instantiated. Problems are reported when the
    /// signature itself is linked.
    fn annotated_params(&mut self, decl: DeclId) -> Option<Vec<Type<'db>>> {
        let ast = self.ast;
        let func = ast.decl(decl).as_function()?;
        let host = self.generic_host(decl);
        let frame = self.generic_frame(decl);
        self.in_namespaces(decl, |this| {
            let token = this.scopes.scope_start_with(&frame);
            let params = this.quietly(|this| {
                func.params
                    .iter()
                    .filter_map(|&param| match &ast.decl(param).kind {
                        DeclKind::Parameter(p) if !p.implicit => {
                            Some(this.link_type(p.ty, host, TypeUse::Annotation))
                        }
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            });
            this.scopes.scope_end(token);
            Some(params)
        })
    }
}
