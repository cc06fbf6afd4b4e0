//! Generic parameter substitution.
//!
//! Open types mention generic parameters through `TypeKind::Param`. An
//! iteration closes them by replacing each parameter of the instantiated
//! declaration with the iteration's argument at the same position.

use kiln_ast::{GenericParamId, Type, TypeKind};

/// Replace every occurrence of `params[i]` in `ty` with `args[i]`.
///
/// Parameters not listed in `params`, and listed parameters without a
/// corresponding argument, are left in place.
pub fn substitute<'db>(
    db: &'db dyn salsa::Database,
    ty: Type<'db>,
    params: &[GenericParamId],
    args: &[Type<'db>],
) -> Type<'db> {
    if params.is_empty() || !ty.is_open(db) {
        return ty;
    }
    subst_rec(db, ty, params, args)
}

fn subst_rec<'db>(
    db: &'db dyn salsa::Database,
    ty: Type<'db>,
    params: &[GenericParamId],
    args: &[Type<'db>],
) -> Type<'db> {
    let kind = match ty.kind(db) {
        TypeKind::Param(p) => {
            return params
                .iter()
                .position(|q| q == p)
                .and_then(|i| args.get(i).copied())
                .unwrap_or(ty);
        }
        TypeKind::Primitive(_) | TypeKind::Literal(_) | TypeKind::Unknown => return ty,
        TypeKind::Linked { decl, args: inner } => TypeKind::Linked {
            decl: *decl,
            args: inner
                .iter()
                .map(|a| subst_rec(db, *a, params, args))
                .collect(),
        },
        TypeKind::Pointer(inner) => TypeKind::Pointer(subst_rec(db, *inner, params, args)),
        TypeKind::Reference(inner) => TypeKind::Reference(subst_rec(db, *inner, params, args)),
        TypeKind::Array { elem, len } => TypeKind::Array {
            elem: subst_rec(db, *elem, params, args),
            len: *len,
        },
        TypeKind::Function { params: ps, ret } => TypeKind::Function {
            params: ps.iter().map(|p| subst_rec(db, *p, params, args)).collect(),
            ret: subst_rec(db, *ret, params, args),
        },
    };
    Type::new(db, kind)
}

/// Substitute a whole list of types.
pub fn substitute_all<'db>(
    db: &'db dyn salsa::Database,
    types: &[Type<'db>],
    params: &[GenericParamId],
    args: &[Type<'db>],
) -> Vec<Type<'db>> {
    types
        .iter()
        .map(|ty| substitute(db, *ty, params, args))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use kiln_ast::DeclId;

    #[test]
    fn test_substitute_nested() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let t = GenericParamId::new(0);
        let u = GenericParamId::new(1);
        let boxed = DeclId::new(0);
        // Box<*T>, with U untouched
        let open = Type::linked(
            db,
            boxed,
            vec![Type::new(db, TypeKind::Pointer(Type::param(db, t))), Type::param(db, u)],
        );
        let closed = substitute(db, open, &[t], &[Type::int(db)]);
        assert_eq!(
            closed,
            Type::linked(
                db,
                boxed,
                vec![Type::new(db, TypeKind::Pointer(Type::int(db))), Type::param(db, u)],
            )
        );
    }

    #[test]
    fn test_closed_type_is_returned_as_is() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let ty = Type::str(db);
        assert_eq!(substitute(db, ty, &[GenericParamId::new(0)], &[Type::int(db)]), ty);
    }
}
