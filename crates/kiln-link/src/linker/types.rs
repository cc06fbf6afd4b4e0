//! Linking of type annotations.

use kiln_ast::{DeclId, DeclKind, Primitive, Type, TypeExprId, TypeExprKind, TypeKind};
use kiln_core::{CompilationPhase, DiagnosticKind, Span, Symbol};

use super::Linker;
use crate::query::{Usage, UsageSite};
use crate::relate::{satisfies_bound, TypeEnv};
use crate::subst::substitute;

/// Whether a linked annotation counts as a use of the generic types it
/// names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TypeUse {
    /// Parameter, field, local and payload types: generic types are
    /// instantiated or subscribed to.
    Use,
    /// Bounds, defaults, alias targets and `implements` lists only
    /// describe types.
    Annotation,
}

impl<'db> Linker<'_, 'db> {
    pub(super) fn link_type(
        &mut self,
        id: TypeExprId,
        host: Option<DeclId>,
        usage: TypeUse,
    ) -> Type<'db> {
        let ast = self.ast;
        let texpr = ast.type_expr(id);
        match &texpr.kind {
            TypeExprKind::Named { path, args } => {
                self.link_named_type(id, texpr.span, path, args, host, usage)
            }
            TypeExprKind::Pointer(inner) => {
                let inner = self.link_type(*inner, host, usage);
                Type::new(self.db, TypeKind::Pointer(inner))
            }
            TypeExprKind::Reference(inner) => {
                let inner = self.link_type(*inner, host, usage);
                Type::new(self.db, TypeKind::Reference(inner))
            }
            TypeExprKind::Array { elem, len } => {
                let elem = self.link_type(*elem, host, usage);
                Type::new(self.db, TypeKind::Array { elem, len: *len })
            }
            TypeExprKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.link_type(*p, host, usage))
                    .collect();
                let ret = self.link_type(*ret, host, usage);
                Type::new(self.db, TypeKind::Function { params, ret })
            }
        }
    }

    fn link_named_type(
        &mut self,
        id: TypeExprId,
        span: Span,
        path: &[Symbol],
        args: &[TypeExprId],
        host: Option<DeclId>,
        usage: TypeUse,
    ) -> Type<'db> {
        let ast = self.ast;
        let shown_path = path_string(path);

        // Builtin names cannot be shadowed.
        if let [name] = path
            && let Some(prim) = name.with_str(Primitive::from_name)
        {
            if !args.is_empty() {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::NameResolution,
                    span,
                    format!("builtin type `{shown_path}` takes no generic arguments"),
                );
            }
            return Type::primitive(self.db, prim);
        }

        let Some(decl) = self.resolve_path(path) else {
            self.report(
                DiagnosticKind::UnresolvedSymbol,
                CompilationPhase::NameResolution,
                span,
                format!("unresolved type `{shown_path}`"),
            );
            return Type::unknown(self.db);
        };

        match &ast.decl(decl).kind {
            DeclKind::GenericParam(param) => {
                if !args.is_empty() {
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        CompilationPhase::NameResolution,
                        span,
                        format!("type parameter `{shown_path}` takes no generic arguments"),
                    );
                }
                return Type::param(self.db, *param);
            }
            DeclKind::Struct(_)
            | DeclKind::Variant(_)
            | DeclKind::Interface(_)
            | DeclKind::Union(_)
            | DeclKind::TypeAlias(_) => {}
            DeclKind::Variable(_)
            | DeclKind::Parameter(_)
            | DeclKind::Function(_)
            | DeclKind::Namespace(_) => {
                self.report(
                    DiagnosticKind::UnresolvedSymbol,
                    CompilationPhase::NameResolution,
                    span,
                    format!("`{shown_path}` does not name a type"),
                );
                return Type::unknown(self.db);
            }
        }

        let mut linked_args: Vec<Type<'db>> = args
            .iter()
            .map(|a| self.link_type(*a, host, usage))
            .collect();
        self.complete_type_args(decl, &mut linked_args, span);
        self.check_bounds(decl, &linked_args, span);

        let ty = Type::linked(self.db, decl, linked_args);
        if usage == TypeUse::Use
            && let Some((target, target_args)) = self.instantiable(ty)
        {
            let instance = self.use_generic(host, target, target_args, span);
            self.program.usages.insert(
                UsageSite::Type(id),
                Usage {
                    decl: target,
                    instance,
                },
            );
        }
        ty
    }

    /// Fix up the argument count of a named generic type. Extra arguments
    /// are dropped; missing ones come from defaults.
    fn complete_type_args(&mut self, decl: DeclId, args: &mut Vec<Type<'db>>, span: Span) {
        let generics = self.program.sigs.generics(decl).to_vec();
        let name = self.name_of(decl);
        if args.len() > generics.len() {
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::NameResolution,
                span,
                format!(
                    "`{name}` takes {} generic argument{} but {} were supplied",
                    generics.len(),
                    if generics.len() == 1 { "" } else { "s" },
                    args.len()
                ),
            );
            args.truncate(generics.len());
        }
        for &param in &generics[args.len()..] {
            match self.program.sigs.default(param) {
                Some(default) => {
                    let filled = substitute(self.db, default, &generics[..args.len()], args);
                    args.push(filled);
                }
                None => {
                    let param_name = self.ast.generic_param(param).name;
                    self.report(
                        DiagnosticKind::InferenceFailure,
                        CompilationPhase::Inference,
                        span,
                        format!("missing generic argument for parameter `{param_name}` of `{name}`"),
                    );
                    args.push(Type::unknown(self.db));
                }
            }
        }
    }

    /// Report closed arguments that do not meet their parameter's bound.
    pub(super) fn check_bounds(&mut self, decl: DeclId, args: &[Type<'db>], span: Span) {
        let generics = self.program.sigs.generics(decl).to_vec();
        for (&param, &arg) in generics.iter().zip(args) {
            let Some(bound) = self.program.sigs.bound(param) else {
                continue;
            };
            if arg.is_open(self.db) || arg.contains_unknown(self.db) {
                continue;
            }
            let bound = substitute(self.db, bound, &generics, args);
            if satisfies_bound(self.db, &self.program.sigs, bound, arg) {
                continue;
            }
            let param_name = self.ast.generic_param(param).name;
            let (arg, bound) = (self.show(arg), self.show(bound));
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                span,
                format!("`{arg}` does not satisfy the bound `{bound}` of `{param_name}`"),
            );
        }
    }

    /// The generic declaration a linked type instantiates, looking through
    /// aliases. `None` for non-generic types.
    fn instantiable(&self, ty: Type<'db>) -> Option<(DeclId, Vec<Type<'db>>)> {
        let TypeKind::Linked { decl, args } = ty.kind(self.db) else {
            return None;
        };
        if let Some(target) = self.program.sigs.alias_target(self.db, *decl, args) {
            return self.instantiable(target);
        }
        (!args.is_empty()).then(|| (*decl, args.clone()))
    }
}

pub(super) fn path_string(path: &[Symbol]) -> String {
    path.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("::")
}
