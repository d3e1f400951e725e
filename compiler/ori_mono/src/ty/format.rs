//! Structural type rendering.
//!
//! Output depends only on type structure and item paths, never on handle
//! values, so it can feed stable symbol hashes.

use super::{Const, GenericArg, Mutability, Ty, TyKind};
use crate::ir::{Generics, ItemId};
use crate::provider::IrProvider;

/// Renders types and argument lists.
///
/// Parameters print with the names from `with_generics` when supplied and as
/// `^i` otherwise. `qualified` prefixes every item path with its crate name.
#[derive(Clone, Copy)]
pub struct TyPrinter<'a> {
    provider: &'a dyn IrProvider,
    generics: Option<&'a Generics>,
    qualified: bool,
}

impl<'a> TyPrinter<'a> {
    pub fn new(provider: &'a dyn IrProvider) -> Self {
        Self {
            provider,
            generics: None,
            qualified: false,
        }
    }

    #[must_use]
    pub fn with_generics(mut self, generics: &'a Generics) -> Self {
        self.generics = Some(generics);
        self
    }

    #[must_use]
    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    pub fn ty(&self, ty: Ty) -> String {
        let mut out = String::with_capacity(16);
        self.write_ty(&mut out, ty);
        out
    }

    /// `<A, u32>`, or the empty string for an empty list.
    pub fn args(&self, args: &[GenericArg]) -> String {
        let mut out = String::new();
        self.write_args(&mut out, args);
        out
    }

    pub fn item_path(&self, item: ItemId) -> String {
        let mut out = String::new();
        self.write_path(&mut out, item);
        out
    }

    fn write_path(&self, out: &mut String, item: ItemId) {
        if self.qualified {
            let origin = self.provider.provenance_of(item).origin;
            out.push_str(self.provider.crate_name(origin));
            out.push_str("::");
        }
        out.push_str(&self.provider.item(item).path);
    }

    fn write_param(&self, out: &mut String, index: u32) {
        match self
            .generics
            .and_then(|generics| generics.params.get(index as usize))
        {
            Some(param) => out.push_str(&param.name),
            None => {
                out.push('^');
                out.push_str(&index.to_string());
            }
        }
    }

    fn write_const(&self, out: &mut String, ct: Const) {
        match ct {
            Const::Value(value) => out.push_str(&value.to_string()),
            Const::Param(index) => self.write_param(out, index),
        }
    }

    fn write_args(&self, out: &mut String, args: &[GenericArg]) {
        if args.is_empty() {
            return;
        }
        out.push('<');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match *arg {
                GenericArg::Type(ty) => self.write_ty(out, ty),
                GenericArg::Const(ct) => self.write_const(out, ct),
            }
        }
        out.push('>');
    }

    fn write_list(&self, out: &mut String, tys: &[Ty]) {
        for (i, &ty) in tys.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_ty(out, ty);
        }
    }

    fn write_ty(&self, out: &mut String, ty: Ty) {
        match self.provider.types().kind(ty) {
            TyKind::Bool => out.push_str("bool"),
            TyKind::Char => out.push_str("char"),
            TyKind::Int(int) => out.push_str(int.name()),
            TyKind::Uint(uint) => out.push_str(uint.name()),
            TyKind::Float(float) => out.push_str(float.name()),
            TyKind::Str => out.push_str("str"),
            TyKind::Never => out.push('!'),
            TyKind::Tuple(elems) => {
                out.push('(');
                self.write_list(out, &elems);
                if elems.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            TyKind::Array(elem, len) => {
                out.push('[');
                self.write_ty(out, elem);
                out.push_str("; ");
                self.write_const(out, len);
                out.push(']');
            }
            TyKind::Slice(elem) => {
                out.push('[');
                self.write_ty(out, elem);
                out.push(']');
            }
            TyKind::Ref(elem, mutbl) => {
                out.push_str(match mutbl {
                    Mutability::Not => "&",
                    Mutability::Mut => "&mut ",
                });
                self.write_ty(out, elem);
            }
            TyKind::RawPtr(elem, mutbl) => {
                out.push_str(match mutbl {
                    Mutability::Not => "*const ",
                    Mutability::Mut => "*mut ",
                });
                self.write_ty(out, elem);
            }
            TyKind::Boxed(elem) => {
                out.push_str("Box<");
                self.write_ty(out, elem);
                out.push('>');
            }
            TyKind::Adt(adt, args) => {
                self.write_path(out, adt);
                self.write_args(out, &args);
            }
            TyKind::Dynamic(trait_id) => {
                out.push_str("dyn ");
                self.write_path(out, trait_id);
            }
            TyKind::FnDef(item, args) => {
                out.push_str("fn-item ");
                self.write_path(out, item);
                self.write_args(out, &args);
            }
            TyKind::FnPtr(inputs, output) => {
                out.push_str("fn(");
                self.write_list(out, &inputs);
                out.push_str(") -> ");
                self.write_ty(out, output);
            }
            TyKind::Closure(item, args) => {
                out.push_str("closure@");
                self.write_path(out, item);
                self.write_args(out, &args);
            }
            TyKind::Param(index) => self.write_param(out, index),
        }
    }
}
