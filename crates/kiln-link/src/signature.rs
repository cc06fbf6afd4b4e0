//! Linked declaration signatures.
//!
//! Filled in by the declaration pass of the linker. Types of generic
//! declarations are stored in open form over the declaration's own
//! parameters; accessors that take `args` close them.

use std::collections::HashMap;

use kiln_ast::{DeclId, GenericParamId, Type, TypeKind};
use kiln_core::Symbol;

use crate::infer::{Formal, GenericSignature};
use crate::relate::{TypeEnv, expand};
use crate::subst::{substitute, substitute_all};

/// A parameter of a linked function signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSig<'db> {
    pub decl: DeclId,
    pub ty: Type<'db>,
    pub implicit: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSig<'db> {
    pub params: Vec<ParamSig<'db>>,
    pub ret: Type<'db>,
}

impl<'db> FunctionSig<'db> {
    /// Parameters the caller passes explicitly.
    pub fn explicit_params(&self) -> impl Iterator<Item = &ParamSig<'db>> {
        self.params.iter().filter(|p| !p.implicit)
    }

    /// The function's own type, for functions used as values.
    pub fn as_type(&self, db: &'db dyn salsa::Database) -> Type<'db> {
        Type::new(
            db,
            TypeKind::Function {
                params: self.explicit_params().map(|p| p.ty).collect(),
                ret: self.ret,
            },
        )
    }
}

/// How values of a struct type leave scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipInfo {
    Copy,
    /// `destructor` is `None` when the struct is owned but its destructor
    /// could not be resolved.
    Owned { destructor: Option<DeclId> },
}

/// Owner and position of a generic parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    pub owner: DeclId,
    pub index: u32,
}

#[derive(Clone, Debug, Default)]
pub struct Signatures<'db> {
    pub(crate) generics: HashMap<DeclId, Vec<GenericParamId>>,
    pub(crate) params: HashMap<GenericParamId, ParamInfo>,
    pub(crate) bounds: HashMap<GenericParamId, Type<'db>>,
    pub(crate) defaults: HashMap<GenericParamId, Type<'db>>,
    /// Types of parameters and local variables.
    pub(crate) decl_types: HashMap<DeclId, Type<'db>>,
    pub(crate) functions: HashMap<DeclId, FunctionSig<'db>>,
    pub(crate) fields: HashMap<DeclId, Vec<(Symbol, Type<'db>)>>,
    pub(crate) cases: HashMap<DeclId, Vec<(Symbol, Option<Type<'db>>)>>,
    pub(crate) union_members: HashMap<DeclId, Vec<Type<'db>>>,
    pub(crate) alias_targets: HashMap<DeclId, Type<'db>>,
    pub(crate) implements: HashMap<DeclId, Vec<DeclId>>,
    pub(crate) ownership: HashMap<DeclId, OwnershipInfo>,
}

impl<'db> Signatures<'db> {
    pub fn generics(&self, decl: DeclId) -> &[GenericParamId] {
        self.generics.get(&decl).map_or(&[], Vec::as_slice)
    }

    pub fn param_info(&self, param: GenericParamId) -> Option<ParamInfo> {
        self.params.get(&param).copied()
    }

    pub fn bound(&self, param: GenericParamId) -> Option<Type<'db>> {
        self.bounds.get(&param).copied()
    }

    pub fn default(&self, param: GenericParamId) -> Option<Type<'db>> {
        self.defaults.get(&param).copied()
    }

    pub fn decl_type(&self, decl: DeclId) -> Option<Type<'db>> {
        self.decl_types.get(&decl).copied()
    }

    pub fn function(&self, decl: DeclId) -> Option<&FunctionSig<'db>> {
        self.functions.get(&decl)
    }

    /// Fields of a struct in declaration order, in open form.
    pub fn fields(&self, decl: DeclId) -> Option<&[(Symbol, Type<'db>)]> {
        self.fields.get(&decl).map(Vec::as_slice)
    }

    /// Type of field `name` of struct `decl` closed over `args`.
    pub fn field_type(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        args: &[Type<'db>],
        name: Symbol,
    ) -> Option<Type<'db>> {
        let (_, ty) = self.fields.get(&decl)?.iter().find(|(n, _)| *n == name)?;
        Some(substitute(db, *ty, self.generics(decl), args))
    }

    pub fn cases(&self, decl: DeclId) -> Option<&[(Symbol, Option<Type<'db>>)]> {
        self.cases.get(&decl).map(Vec::as_slice)
    }

    pub fn ownership(&self, decl: DeclId) -> OwnershipInfo {
        self.ownership
            .get(&decl)
            .copied()
            .unwrap_or(OwnershipInfo::Copy)
    }

    /// Ownership of a value of type `ty`. Only struct types can be owned;
    /// generic parameters are treated as copies.
    pub fn ownership_of(&self, db: &'db dyn salsa::Database, ty: Type<'db>) -> OwnershipInfo {
        match expand(db, self, ty).kind(db) {
            TypeKind::Linked { decl, .. } => self.ownership(*decl),
            _ => OwnershipInfo::Copy,
        }
    }

    pub fn is_owned(&self, db: &'db dyn salsa::Database, ty: Type<'db>) -> bool {
        matches!(self.ownership_of(db, ty), OwnershipInfo::Owned { .. })
    }

    /// Defaults of `decl`'s generic parameters, in order.
    pub fn defaults_of(&self, decl: DeclId) -> Vec<Option<Type<'db>>> {
        self.generics(decl)
            .iter()
            .map(|p| self.default(*p))
            .collect()
    }

    /// Inference view of a generic function.
    pub fn call_signature(&self, decl: DeclId) -> Option<GenericSignature<'db>> {
        let func = self.functions.get(&decl)?;
        Some(GenericSignature {
            params: self.generics(decl).to_vec(),
            defaults: self.defaults_of(decl),
            formals: func
                .params
                .iter()
                .map(|p| Formal {
                    ty: p.ty,
                    implicit: p.implicit,
                })
                .collect(),
            ret: Some(func.ret),
        })
    }

    /// Inference view of a struct literal: the supplied fields act as the
    /// formals and the struct type itself as the return type.
    pub fn construct_signature(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        supplied: &[Type<'db>],
    ) -> GenericSignature<'db> {
        let generics = self.generics(decl).to_vec();
        let own = generics.iter().map(|p| Type::param(db, *p)).collect();
        GenericSignature {
            defaults: self.defaults_of(decl),
            formals: supplied
                .iter()
                .map(|ty| Formal {
                    ty: *ty,
                    implicit: false,
                })
                .collect(),
            ret: Some(Type::linked(db, decl, own)),
            params: generics,
        }
    }
}

impl<'db> TypeEnv<'db> for Signatures<'db> {
    fn alias_target(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        args: &[Type<'db>],
    ) -> Option<Type<'db>> {
        let target = *self.alias_targets.get(&decl)?;
        Some(substitute(db, target, self.generics(decl), args))
    }

    fn union_members(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        args: &[Type<'db>],
    ) -> Option<Vec<Type<'db>>> {
        let members = self.union_members.get(&decl)?;
        Some(substitute_all(db, members, self.generics(decl), args))
    }

    fn implements(&self, decl: DeclId, interface: DeclId) -> bool {
        self.implements
            .get(&decl)
            .is_some_and(|list| list.contains(&interface))
    }
}
