//! Declaration types for the AST.
//!
//! Every nameable entity is a [`Declaration`] stored in the AST arena:
//! - Variables: `let x: int = 5;`
//! - Parameters: `x: T` in a function signature
//! - Functions: `fn identity<T>(x: T) -> T { ... }`
//! - Structs: `struct Box<T> { value: T }`
//! - Variants: `variant Option<T> { Some(T), None }`
//! - Interfaces: `interface Show { fn show(self: &Self) -> str; }`
//! - Unions: `union Number = int | float`
//! - Type aliases: `type Ints = List<int>`
//! - Generic parameters: `T` in `<T: Bound = Default>`
//! - Namespaces: `namespace math { ... }`

use kiln_core::{Span, Symbol};

use crate::ids::{BlockId, DeclId, GenericParamId, TypeExprId};

/// A nameable entity.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub name: Symbol,
    pub span: Span,
    /// Lexical container (function for parameters, namespace for members).
    pub parent: Option<DeclId>,
    pub kind: DeclKind,
}

/// The different kinds of declarations.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Variable(VariableDecl),
    Parameter(ParameterDecl),
    Function(FunctionDecl),
    Struct(StructDecl),
    Variant(VariantDecl),
    Interface(InterfaceDecl),
    Union(UnionDecl),
    TypeAlias(TypeAliasDecl),
    GenericParam(GenericParamId),
    Namespace(NamespaceDecl),
}

impl Declaration {
    /// Generic parameters of a generic declaration, empty otherwise.
    pub fn generics(&self) -> &[GenericParamId] {
        match &self.kind {
            DeclKind::Function(f) => &f.generics,
            DeclKind::Struct(s) => &s.generics,
            DeclKind::Variant(v) => &v.generics,
            DeclKind::Interface(i) => &i.generics,
            DeclKind::Union(u) => &u.generics,
            DeclKind::TypeAlias(a) => &a.generics,
            DeclKind::Variable(_)
            | DeclKind::Parameter(_)
            | DeclKind::GenericParam(_)
            | DeclKind::Namespace(_) => &[],
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generics().is_empty()
    }

    /// Whether the declaration names a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Struct(_)
                | DeclKind::Variant(_)
                | DeclKind::Interface(_)
                | DeclKind::Union(_)
                | DeclKind::TypeAlias(_)
                | DeclKind::GenericParam(_)
        )
    }

    /// Whether the declaration binds a runtime value in a body.
    pub fn is_value_binding(&self) -> bool {
        matches!(self.kind, DeclKind::Variable(_) | DeclKind::Parameter(_))
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.kind {
            DeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }
}

/// Local variable: `let x: T = init;`
#[derive(Clone, Debug)]
pub struct VariableDecl {
    pub ty: Option<TypeExprId>,
    pub mutable: bool,
    /// `comptime let`: the initializer must be evaluable at compile time.
    pub comptime: bool,
}

/// Function parameter.
#[derive(Clone, Debug)]
pub struct ParameterDecl {
    pub ty: TypeExprId,
    /// Implicit parameters are supplied by the compiler (e.g. a receiver
    /// or context argument) and do not take part in generic inference.
    pub implicit: bool,
}

/// Function declaration: `fn name<G>(params) -> ret { body }`
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub generics: Vec<GenericParamId>,
    /// Parameter declarations, in order.
    pub params: Vec<DeclId>,
    pub ret: Option<TypeExprId>,
    /// `None` for signatures without a body (interface methods, externs).
    pub body: Option<BlockId>,
}

/// Struct declaration: `struct Name<G> { fields }`
#[derive(Clone, Debug)]
pub struct StructDecl {
    pub generics: Vec<GenericParamId>,
    pub fields: Vec<FieldDecl>,
    pub ownership: Ownership,
    /// Interfaces the struct declares it implements.
    pub implements: Vec<TypeExprId>,
}

/// A struct field.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Symbol,
    pub span: Span,
    pub ty: TypeExprId,
}

/// How values of a struct are transferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Plain data; reads copy, nothing is tracked.
    Copy,
    /// Linear value; passing by value moves it out of its binding.
    /// `destructor` names the function run when the value leaves scope.
    Owned { destructor: Option<Symbol> },
}

/// Tagged union: `variant Name<G> { Case(Payload), ... }`
#[derive(Clone, Debug)]
pub struct VariantDecl {
    pub generics: Vec<GenericParamId>,
    pub cases: Vec<VariantCase>,
}

#[derive(Clone, Debug)]
pub struct VariantCase {
    pub name: Symbol,
    pub span: Span,
    pub payload: Option<TypeExprId>,
}

/// Interface: a named capability set of method signatures.
#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub generics: Vec<GenericParamId>,
    /// Function declarations without bodies.
    pub methods: Vec<DeclId>,
}

/// Untagged union of member types: `union Number = int | float`
#[derive(Clone, Debug)]
pub struct UnionDecl {
    pub generics: Vec<GenericParamId>,
    pub members: Vec<TypeExprId>,
}

/// `type Name<G> = target`
#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub generics: Vec<GenericParamId>,
    pub target: TypeExprId,
}

/// `namespace name { members }`
#[derive(Clone, Debug)]
pub struct NamespaceDecl {
    pub members: Vec<DeclId>,
}

/// A generic parameter: `T: Bound = Default`.
#[derive(Clone, Debug)]
pub struct GenericParameter {
    pub name: Symbol,
    pub span: Span,
    /// Minimum capability the argument must satisfy.
    pub bound: Option<TypeExprId>,
    pub default: Option<TypeExprId>,
    /// Position within the owner's parameter list.
    pub index: u32,
    pub owner: DeclId,
    /// The `DeclKind::GenericParam` declaration that makes the name visible.
    pub decl: DeclId,
}
