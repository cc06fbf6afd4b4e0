//! Unrecoverable link errors.
//!
//! User mistakes are reported as diagnostics and never abort linking. A
//! [`LinkError`] means the AST handed to the linker is not well formed.

use derive_more::{Display, Error};
use kiln_ast::{DeclId, MalformedAst};

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Display, Debug, Error)]
#[display("{kind}")]
pub struct LinkError {
    kind: Box<LinkErrorKind>,
}

impl<E> From<E> for LinkError
where
    LinkErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        LinkError {
            kind: Box::new(LinkErrorKind::from(error)),
        }
    }
}

impl LinkError {
    pub(crate) fn unexpected_decl(decl: DeclId, expected: &'static str) -> Self {
        LinkErrorKind::UnexpectedDecl { decl, expected }.into()
    }

    pub fn kind(&self) -> &LinkErrorKind {
        &self.kind
    }
}

#[derive(Display, Debug, Error)]
pub enum LinkErrorKind {
    #[display("malformed AST: {_0}")]
    Malformed(#[error(not(source))] MalformedAst),

    #[display("{decl} is not a {expected}")]
    UnexpectedDecl {
        decl: DeclId,
        expected: &'static str,
    },
}

impl From<MalformedAst> for LinkErrorKind {
    fn from(error: MalformedAst) -> Self {
        LinkErrorKind::Malformed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn test_display() {
        let err: LinkError = MalformedAst {
            what: "missing block",
            node: "block7".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "malformed AST: missing block (block7)");

        let err = LinkError::unexpected_decl(DeclId::new(2), "function");
        assert_eq!(err.to_string(), "decl2 is not a function");
        assert!(matches!(err.kind(), LinkErrorKind::UnexpectedDecl { .. }));
    }
}
