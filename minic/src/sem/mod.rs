pub mod binder;
pub mod intrinsic;
pub mod typecheck;

use crate::error::Diagnostic;
use crate::grammer::ast::{NodeId, Program, Type};
use binder::Bindings;
use typecheck::TypeTable;

/// A program that passed name resolution and type checking.
/// Only [`analyze`] builds one, so code generation never sees an ill-typed tree.
pub struct Checked<'a> {
    program: &'a Program,
    bindings: Bindings,
    types: TypeTable,
}

impl<'a> Checked<'a> {
    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.types.get(id)
    }
}

/// Run the binder, then the type checker. Each stage runs only when the previous one was clean.
pub fn analyze(program: &Program) -> Result<Checked<'_>, Vec<Diagnostic>> {
    let (bindings, errors) = binder::bind(program);
    if !errors.is_empty() {
        log::debug!("binder reported {} error(s)", errors.len());
        return Err(errors);
    }
    let (types, errors) = typecheck::check(program, &bindings);
    if !errors.is_empty() {
        log::debug!("type checker reported {} error(s)", errors.len());
        return Err(errors);
    }
    Ok(Checked {
        program,
        bindings,
        types,
    })
}
