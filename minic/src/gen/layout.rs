use crate::error::Error;
use crate::grammer::ast::{StructTypeDecl, Type};
use indexmap::IndexMap;

pub const WORD: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructLayout {
    pub fields: IndexMap<String, usize>,
    pub size: usize,
}

/// Packed byte layout of every struct: fields in declaration order, no padding.
#[derive(Debug, Clone, Default)]
pub struct StructLayouts(IndexMap<String, StructLayout>);

impl StructLayouts {
    pub fn compute(decls: &[StructTypeDecl]) -> Result<Self, Error> {
        let mut layouts = StructLayouts::default();
        for decl in decls {
            let mut layout = StructLayout::default();
            for field in &decl.fields {
                layout.fields.insert(field.name.clone(), layout.size);
                layout.size += layouts.size_of(&field.ty)?;
            }
            log::trace!("layout struct {}: {:?}", decl.name, layout);
            layouts.0.insert(decl.name.clone(), layout);
        }
        Ok(layouts)
    }

    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        self.0.get(name)
    }

    pub fn size_of(&self, ty: &Type) -> Result<usize, Error> {
        match ty {
            Type::Int | Type::Pointer(_) => Ok(WORD),
            Type::Char => Ok(1),
            Type::Void => Ok(0),
            Type::Array(of, len) => Ok(self.size_of(of)? * len),
            Type::Struct(name) => self
                .get(name)
                .map(|layout| layout.size)
                .ok_or_else(|| Error::Internal(format!("no layout for struct {name}"))),
        }
    }

    pub fn offset_of(&self, name: &str, field: &str) -> Result<usize, Error> {
        self.get(name)
            .and_then(|layout| layout.fields.get(field).copied())
            .ok_or_else(|| Error::Internal(format!("no field {field} in struct {name}")))
    }
}

/// Round up to a whole number of words.
pub fn word_align(size: usize) -> usize {
    size.div_ceil(WORD) * WORD
}

/// Values passed and held in a single register.
pub fn is_word(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Char | Type::Pointer(_))
}
