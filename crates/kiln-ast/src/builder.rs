//! Programmatic construction of an [`Ast`].
//!
//! The builder is the producer of ASTs for drivers and tests. Nodes receive
//! the span set with [`AstBuilder::at`]; nodes created before any call to
//! `at` get an empty span.
//!
//! ```
//! # use kiln_ast::AstBuilder;
//! let mut b = AstBuilder::new();
//! let identity = b.function("identity");
//! let t = b.generic(identity, "T");
//! let ty = b.ty("T");
//! b.param(identity, "x", ty);
//! let ret = b.ty("T");
//! b.returns(identity, ret);
//! let x = b.name("x");
//! let ret_stmt = b.ret(Some(x));
//! let body = b.block([ret_stmt]);
//! b.body(identity, body);
//! let ast = b.finish();
//! assert_eq!(ast.generic_param(t).index, 0);
//! ```

use kiln_core::{Span, Symbol};

use crate::ast::Ast;
use crate::decl::{
    DeclKind, Declaration, FieldDecl, FunctionDecl, GenericParameter, InterfaceDecl,
    NamespaceDecl, Ownership, ParameterDecl, StructDecl, TypeAliasDecl, UnionDecl, VariableDecl,
    VariantCase, VariantDecl,
};
use crate::expr::{
    BinaryOp, Block, Expr, ExprKind, IfArm, Stmt, StmtKind, SwitchCase, UnaryOp,
};
use crate::ids::{BlockId, DeclId, ExprId, GenericParamId, StmtId, TypeExprId};
use crate::types::{TypeExpr, TypeExprKind};

#[derive(Default)]
pub struct AstBuilder {
    ast: Ast,
    span: Span,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span given to nodes created from now on.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    pub fn finish(self) -> Ast {
        self.ast
    }

    /// Read access to what has been built so far.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    // ---- type annotations ----

    /// A plain named type: `int`, `T`, `Box`.
    pub fn ty(&mut self, name: &str) -> TypeExprId {
        self.ty_app(name, [])
    }

    /// A named type applied to arguments: `Box<T>`.
    pub fn ty_app(
        &mut self,
        name: &str,
        args: impl IntoIterator<Item = TypeExprId>,
    ) -> TypeExprId {
        self.ty_path(&[name], args)
    }

    /// A qualified named type: `collections::List<T>`.
    pub fn ty_path(
        &mut self,
        path: &[&str],
        args: impl IntoIterator<Item = TypeExprId>,
    ) -> TypeExprId {
        let path = path.iter().map(|s| Symbol::from_dynamic(s)).collect();
        self.type_expr(TypeExprKind::Named {
            path,
            args: args.into_iter().collect(),
        })
    }

    pub fn ty_ptr(&mut self, inner: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Pointer(inner))
    }

    pub fn ty_ref(&mut self, inner: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Reference(inner))
    }

    pub fn ty_array(&mut self, elem: TypeExprId, len: Option<u64>) -> TypeExprId {
        self.type_expr(TypeExprKind::Array { elem, len })
    }

    pub fn ty_fn(
        &mut self,
        params: impl IntoIterator<Item = TypeExprId>,
        ret: TypeExprId,
    ) -> TypeExprId {
        self.type_expr(TypeExprKind::Function {
            params: params.into_iter().collect(),
            ret,
        })
    }

    fn type_expr(&mut self, kind: TypeExprKind) -> TypeExprId {
        self.ast.type_exprs.push(TypeExpr {
            span: self.span,
            kind,
        })
    }

    // ---- declarations ----

    /// Declare a top-level function with no parameters, no return type and
    /// no body.
    pub fn function(&mut self, name: &str) -> DeclId {
        let decl = self.decl(name, None, DeclKind::Function(empty_function()));
        self.ast.items.push(decl);
        decl
    }

    /// Add a generic parameter to `owner`.
    pub fn generic(&mut self, owner: DeclId, name: &str) -> GenericParamId {
        self.generic_with(owner, name, None, None)
    }

    pub fn generic_with(
        &mut self,
        owner: DeclId,
        name: &str,
        bound: Option<TypeExprId>,
        default: Option<TypeExprId>,
    ) -> GenericParamId {
        let id = self.ast.generic_params.next_key();
        let decl = self.decl(name, Some(owner), DeclKind::GenericParam(id));
        let generics = self.generics_mut(owner);
        let index = generics.len() as u32;
        generics.push(id);
        self.ast.generic_params.push(GenericParameter {
            name: Symbol::from_dynamic(name),
            span: self.span,
            bound,
            default,
            index,
            owner,
            decl,
        })
    }

    pub fn param(&mut self, func: DeclId, name: &str, ty: TypeExprId) -> DeclId {
        self.param_with(func, name, ty, false)
    }

    /// Add a compiler-supplied parameter that inference skips.
    pub fn implicit_param(&mut self, func: DeclId, name: &str, ty: TypeExprId) -> DeclId {
        self.param_with(func, name, ty, true)
    }

    fn param_with(&mut self, func: DeclId, name: &str, ty: TypeExprId, implicit: bool) -> DeclId {
        let param = self.decl(
            name,
            Some(func),
            DeclKind::Parameter(ParameterDecl { ty, implicit }),
        );
        self.function_mut(func).params.push(param);
        param
    }

    pub fn returns(&mut self, func: DeclId, ty: TypeExprId) {
        self.function_mut(func).ret = Some(ty);
    }

    pub fn body(&mut self, func: DeclId, body: BlockId) {
        self.function_mut(func).body = Some(body);
    }

    pub fn structure(&mut self, name: &str, ownership: Ownership) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::Struct(StructDecl {
                generics: Vec::new(),
                fields: Vec::new(),
                ownership,
                implements: Vec::new(),
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    pub fn field(&mut self, strukt: DeclId, name: &str, ty: TypeExprId) {
        let field = FieldDecl {
            name: Symbol::from_dynamic(name),
            span: self.span,
            ty,
        };
        if let DeclKind::Struct(s) = &mut self.ast.decls[strukt].kind {
            s.fields.push(field);
        } else {
            panic!("{strukt} is not a struct");
        }
    }

    pub fn implements(&mut self, strukt: DeclId, interface: TypeExprId) {
        if let DeclKind::Struct(s) = &mut self.ast.decls[strukt].kind {
            s.implements.push(interface);
        } else {
            panic!("{strukt} is not a struct");
        }
    }

    pub fn variant(&mut self, name: &str) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::Variant(VariantDecl {
                generics: Vec::new(),
                cases: Vec::new(),
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    pub fn case(&mut self, variant: DeclId, name: &str, payload: Option<TypeExprId>) {
        let case = VariantCase {
            name: Symbol::from_dynamic(name),
            span: self.span,
            payload,
        };
        if let DeclKind::Variant(v) = &mut self.ast.decls[variant].kind {
            v.cases.push(case);
        } else {
            panic!("{variant} is not a variant");
        }
    }

    pub fn interface(&mut self, name: &str) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::Interface(InterfaceDecl {
                generics: Vec::new(),
                methods: Vec::new(),
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    /// Add a bodiless method signature to an interface.
    pub fn method(&mut self, interface: DeclId, name: &str) -> DeclId {
        let method = self.decl(
            name,
            Some(interface),
            DeclKind::Function(empty_function()),
        );
        if let DeclKind::Interface(i) = &mut self.ast.decls[interface].kind {
            i.methods.push(method);
        } else {
            panic!("{interface} is not an interface");
        }
        method
    }

    pub fn union(&mut self, name: &str) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::Union(UnionDecl {
                generics: Vec::new(),
                members: Vec::new(),
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    pub fn member(&mut self, union: DeclId, ty: TypeExprId) {
        if let DeclKind::Union(u) = &mut self.ast.decls[union].kind {
            u.members.push(ty);
        } else {
            panic!("{union} is not a union");
        }
    }

    pub fn alias(&mut self, name: &str, target: TypeExprId) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::TypeAlias(TypeAliasDecl {
                generics: Vec::new(),
                target,
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    pub fn namespace(&mut self, name: &str) -> DeclId {
        let decl = self.decl(
            name,
            None,
            DeclKind::Namespace(NamespaceDecl {
                members: Vec::new(),
            }),
        );
        self.ast.items.push(decl);
        decl
    }

    /// Move a top-level declaration into a namespace.
    pub fn nest(&mut self, namespace: DeclId, item: DeclId) {
        self.ast.items.retain(|&i| i != item);
        self.ast.decls[item].parent = Some(namespace);
        if let DeclKind::Namespace(ns) = &mut self.ast.decls[namespace].kind {
            ns.members.push(item);
        } else {
            panic!("{namespace} is not a namespace");
        }
    }

    fn decl(&mut self, name: &str, parent: Option<DeclId>, kind: DeclKind) -> DeclId {
        self.ast.decls.push(Declaration {
            name: Symbol::from_dynamic(name),
            span: self.span,
            parent,
            kind,
        })
    }

    fn function_mut(&mut self, func: DeclId) -> &mut FunctionDecl {
        match &mut self.ast.decls[func].kind {
            DeclKind::Function(f) => f,
            _ => panic!("{func} is not a function"),
        }
    }

    fn generics_mut(&mut self, owner: DeclId) -> &mut Vec<GenericParamId> {
        match &mut self.ast.decls[owner].kind {
            DeclKind::Function(f) => &mut f.generics,
            DeclKind::Struct(s) => &mut s.generics,
            DeclKind::Variant(v) => &mut v.generics,
            DeclKind::Interface(i) => &mut i.generics,
            DeclKind::Union(u) => &mut u.generics,
            DeclKind::TypeAlias(a) => &mut a.generics,
            _ => panic!("{owner} cannot have generic parameters"),
        }
    }

    // ---- expressions ----

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::IntLit(value))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::FloatLit(value))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.expr(ExprKind::StrLit(value.to_owned()))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::BoolLit(value))
    }

    pub fn name(&mut self, name: &str) -> ExprId {
        self.expr(ExprKind::Name(Symbol::from_dynamic(name)))
    }

    pub fn path(&mut self, path: &[&str]) -> ExprId {
        let path = path.iter().map(|s| Symbol::from_dynamic(s)).collect();
        self.expr(ExprKind::Path(path))
    }

    /// `name(args)`
    pub fn call(&mut self, name: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let callee = self.name(name);
        self.call_expr(callee, [], args)
    }

    /// `name<generic_args>(args)`
    pub fn call_generic(
        &mut self,
        name: &str,
        generic_args: impl IntoIterator<Item = TypeExprId>,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let callee = self.name(name);
        self.call_expr(callee, generic_args, args)
    }

    pub fn call_expr(
        &mut self,
        callee: ExprId,
        generic_args: impl IntoIterator<Item = TypeExprId>,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        self.expr(ExprKind::Call {
            callee,
            generic_args: generic_args.into_iter().collect(),
            args: args.into_iter().collect(),
        })
    }

    /// `Type { field: value, ... }`
    pub fn construct(
        &mut self,
        ty: TypeExprId,
        fields: impl IntoIterator<Item = (&'static str, ExprId)>,
    ) -> ExprId {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (Symbol::new(name), value))
            .collect();
        self.expr(ExprKind::Construct { ty, fields })
    }

    pub fn member_of(&mut self, base: ExprId, field: &str) -> ExprId {
        self.expr(ExprKind::Member {
            base,
            field: Symbol::from_dynamic(field),
        })
    }

    pub fn address_of(&mut self, place: ExprId) -> ExprId {
        self.expr(ExprKind::AddressOf(place))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, lhs, rhs })
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.ast.exprs.push(Expr {
            span: self.span,
            kind,
        })
    }

    // ---- statements ----

    /// `let name: ty = init;` Returns the statement and the new binding.
    pub fn let_(
        &mut self,
        name: &str,
        ty: Option<TypeExprId>,
        init: Option<ExprId>,
    ) -> (StmtId, DeclId) {
        self.binding(name, ty, init, false, false)
    }

    /// `let mut name: ty = init;`
    pub fn let_mut(
        &mut self,
        name: &str,
        ty: Option<TypeExprId>,
        init: Option<ExprId>,
    ) -> (StmtId, DeclId) {
        self.binding(name, ty, init, true, false)
    }

    /// `comptime let name = init;`
    pub fn comptime_let(&mut self, name: &str, init: ExprId) -> (StmtId, DeclId) {
        self.binding(name, None, Some(init), false, true)
    }

    fn binding(
        &mut self,
        name: &str,
        ty: Option<TypeExprId>,
        init: Option<ExprId>,
        mutable: bool,
        comptime: bool,
    ) -> (StmtId, DeclId) {
        let decl = self.decl(
            name,
            None,
            DeclKind::Variable(VariableDecl {
                ty,
                mutable,
                comptime,
            }),
        );
        (self.stmt(StmtKind::Let { decl, init }), decl)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Assign { target, value })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value))
    }

    pub fn if_(&mut self, cond: ExprId, then_body: BlockId, else_body: Option<BlockId>) -> StmtId {
        self.if_chain([(cond, then_body)], else_body)
    }

    /// `if c0 { .. } else if c1 { .. } ... else { .. }`
    pub fn if_chain(
        &mut self,
        arms: impl IntoIterator<Item = (ExprId, BlockId)>,
        else_body: Option<BlockId>,
    ) -> StmtId {
        let arms = arms
            .into_iter()
            .map(|(cond, body)| IfArm { cond, body })
            .collect();
        self.stmt(StmtKind::If { arms, else_body })
    }

    pub fn static_if(
        &mut self,
        cond: ExprId,
        then_body: BlockId,
        else_body: Option<BlockId>,
    ) -> StmtId {
        self.stmt(StmtKind::StaticIf {
            cond,
            then_body,
            else_body,
        })
    }

    /// A `case v0, v1: body` arm for [`AstBuilder::switch`].
    pub fn case_arm(&self, values: impl IntoIterator<Item = ExprId>, body: BlockId) -> SwitchCase {
        SwitchCase {
            span: self.span,
            values: values.into_iter().collect(),
            body,
            is_default: false,
        }
    }

    /// A `default: body` arm for [`AstBuilder::switch`].
    pub fn default_arm(&self, body: BlockId) -> SwitchCase {
        SwitchCase {
            span: self.span,
            values: Vec::new(),
            body,
            is_default: true,
        }
    }

    pub fn switch(
        &mut self,
        scrutinee: ExprId,
        cases: impl IntoIterator<Item = SwitchCase>,
    ) -> StmtId {
        self.stmt(StmtKind::Switch {
            scrutinee,
            cases: cases.into_iter().collect(),
        })
    }

    pub fn while_(&mut self, cond: ExprId, body: BlockId) -> StmtId {
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn block_stmt(&mut self, body: BlockId) -> StmtId {
        self.stmt(StmtKind::Block(body))
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        self.ast.stmts.push(Stmt {
            span: self.span,
            kind,
        })
    }

    pub fn block(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> BlockId {
        self.ast.blocks.push(Block {
            span: self.span,
            stmts: stmts.into_iter().collect(),
        })
    }
}

fn empty_function() -> FunctionDecl {
    FunctionDecl {
        generics: Vec::new(),
        params: Vec::new(),
        ret: None,
        body: None,
    }
}
