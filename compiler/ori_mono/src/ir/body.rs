//! Reduced function bodies.

use ori_diagnostic::Span;

use super::ItemId;
use crate::ty::{GenericArgs, Ty};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LayoutOp {
    SizeOf,
    AlignOf,
    FieldOffset,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OpKind {
    /// Direct call. `callee` may be a trait method; it is resolved against
    /// the concrete `Self` type at collection time.
    Call { callee: ItemId, args: GenericArgs },
    /// A function item converted to a function pointer.
    ReifyFnPtr { callee: ItemId, args: GenericArgs },
    StaticRef { item: ItemId },
    /// Value of `ty` goes out of scope.
    Drop { ty: Ty },
    /// Pointer coercion `source -> target`, e.g. `&T -> &dyn Trait`.
    Unsize { source: Ty, target: Ty },
    Layout { op: LayoutOp, ty: Ty },
    /// Any other operand whose type is `ty`.
    Use { ty: Ty },
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Operation {
    pub kind: OpKind,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CallKind {
    Direct,
    FnPointer,
}

/// A call or reification site, as returned by [`Body::calls`].
#[derive(Copy, Clone, Debug)]
pub struct CallSite<'a> {
    pub callee: ItemId,
    pub args: &'a GenericArgs,
    pub kind: CallKind,
    pub span: Span,
}

/// A generic body: types in it may mention the item's parameters.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Body {
    pub locals: Vec<Ty>,
    pub ops: Vec<Operation>,
}

impl Body {
    pub fn builder() -> BodyBuilder {
        BodyBuilder::default()
    }

    /// Direct calls and function-pointer reifications, in body order.
    pub fn calls(&self) -> impl Iterator<Item = CallSite<'_>> + '_ {
        self.ops.iter().filter_map(|op| match &op.kind {
            OpKind::Call { callee, args } => Some(CallSite {
                callee: *callee,
                args,
                kind: CallKind::Direct,
                span: op.span,
            }),
            OpKind::ReifyFnPtr { callee, args } => Some(CallSite {
                callee: *callee,
                args,
                kind: CallKind::FnPointer,
                span: op.span,
            }),
            _ => None,
        })
    }

    pub fn static_refs(&self) -> impl Iterator<Item = (ItemId, Span)> + '_ {
        self.ops.iter().filter_map(|op| match op.kind {
            OpKind::StaticRef { item } => Some((item, op.span)),
            _ => None,
        })
    }

    pub fn drops(&self) -> impl Iterator<Item = (Ty, Span)> + '_ {
        self.ops.iter().filter_map(|op| match op.kind {
            OpKind::Drop { ty } => Some((ty, op.span)),
            _ => None,
        })
    }

    /// `(source, target, span)` for every unsizing coercion.
    pub fn unsize_coercions(&self) -> impl Iterator<Item = (Ty, Ty, Span)> + '_ {
        self.ops.iter().filter_map(|op| match op.kind {
            OpKind::Unsize { source, target } => Some((source, target, op.span)),
            _ => None,
        })
    }

    /// Rough codegen cost used by the partitioner.
    pub fn size_estimate(&self) -> usize {
        self.ops.len() + 1
    }
}

/// Builds a [`Body`] operation by operation.
#[derive(Default)]
pub struct BodyBuilder {
    body: Body,
}

impl BodyBuilder {
    #[must_use]
    pub fn local(mut self, ty: Ty) -> Self {
        self.body.locals.push(ty);
        self
    }

    #[must_use]
    pub fn op(mut self, kind: OpKind, span: Span) -> Self {
        self.body.ops.push(Operation { kind, span });
        self
    }

    #[must_use]
    pub fn call(self, callee: ItemId, args: GenericArgs) -> Self {
        self.call_at(callee, args, Span::DUMMY)
    }

    #[must_use]
    pub fn call_at(self, callee: ItemId, args: GenericArgs, span: Span) -> Self {
        self.op(OpKind::Call { callee, args }, span)
    }

    #[must_use]
    pub fn reify(self, callee: ItemId, args: GenericArgs) -> Self {
        self.op(OpKind::ReifyFnPtr { callee, args }, Span::DUMMY)
    }

    #[must_use]
    pub fn static_ref(self, item: ItemId) -> Self {
        self.op(OpKind::StaticRef { item }, Span::DUMMY)
    }

    #[must_use]
    pub fn drop_ty(self, ty: Ty) -> Self {
        self.op(OpKind::Drop { ty }, Span::DUMMY)
    }

    #[must_use]
    pub fn unsize(self, source: Ty, target: Ty) -> Self {
        self.op(OpKind::Unsize { source, target }, Span::DUMMY)
    }

    #[must_use]
    pub fn layout(self, op: LayoutOp, ty: Ty) -> Self {
        self.op(OpKind::Layout { op, ty }, Span::DUMMY)
    }

    #[must_use]
    pub fn use_ty(self, ty: Ty) -> Self {
        self.op(OpKind::Use { ty }, Span::DUMMY)
    }

    pub fn finish(self) -> Body {
        self.body
    }
}
