//! Monomorphization errors.
//!
//! Instances are carried as rendered strings (`peach<u64>`) so errors outlive
//! the provider and sort deterministically. Every variant renders into an
//! `ori_diagnostic::Diagnostic`.


use ori_diagnostic::{Diagnostic, ErrorCode, Span};
use thiserror::Error;

use crate::polymorphize::UnusedParamSet;
use crate::ty::SubstError;

/// Why an instance could not be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("`{self_ty}` does not implement `{trait_path}`")]
    NoImpl { trait_path: String, self_ty: String },
    #[error("no body is available to instantiate")]
    MissingBody,
    #[error("expected {expected} generic argument(s), found {found}")]
    ArgCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Subst(#[from] SubstError),
    #[error("item is not callable")]
    NotCallable,
    #[error("call is dispatched through a vtable")]
    VirtualCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MonoError {
    #[error("reached the recursion limit ({limit}) while instantiating `{instance}`")]
    InstantiationOverflow {
        instance: String,
        limit: usize,
        /// Instances from the root down to the one that overflowed.
        chain: Vec<String>,
        span: Span,
    },

    #[error("cannot instantiate `{instance}`: {reason}")]
    UnresolvedInstance {
        instance: String,
        reason: UnresolvedReason,
        span: Span,
    },

    #[error("type length of `{instance}` ({length}) exceeds the limit ({limit})")]
    TypeLengthLimit {
        instance: String,
        length: usize,
        limit: usize,
        span: Span,
    },

    #[error("unused parameters of `{item}` computed twice with different results: {first} and {second}")]
    AnalyzerInconsistency {
        item: String,
        first: UnusedParamSet,
        second: UnusedParamSet,
    },

    #[error("codegen unit partitioning broke an invariant: {detail}")]
    PartitionConstraintViolation { detail: String },

    #[error("symbol `{symbol}` was produced for both `{first}` and `{second}`")]
    SymbolCollision {
        symbol: String,
        first: String,
        second: String,
    },
}

impl MonoError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MonoError::InstantiationOverflow { .. } => ErrorCode::E7001,
            MonoError::UnresolvedInstance { .. } => ErrorCode::E7002,
            MonoError::TypeLengthLimit { .. } => ErrorCode::E7003,
            MonoError::AnalyzerInconsistency { .. } => ErrorCode::E9101,
            MonoError::PartitionConstraintViolation { .. } => ErrorCode::E9102,
            MonoError::SymbolCollision { .. } => ErrorCode::E9103,
        }
    }

    /// Source location, `Span::DUMMY` for internal errors.
    pub fn span(&self) -> Span {
        match self {
            MonoError::InstantiationOverflow { span, .. }
            | MonoError::UnresolvedInstance { span, .. }
            | MonoError::TypeLengthLimit { span, .. } => *span,
            MonoError::AnalyzerInconsistency { .. }
            | MonoError::PartitionConstraintViolation { .. }
            | MonoError::SymbolCollision { .. } => Span::DUMMY,
        }
    }

    /// Errors that stop collection immediately.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MonoError::UnresolvedInstance { .. })
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());

        let diag = match self {
            MonoError::InstantiationOverflow {
                instance,
                limit,
                chain,
                span,
            } => {
                let mut diag = diag.with_label(*span, format!("instantiating `{instance}`"));
                for (depth, link) in chain.iter().enumerate() {
                    diag = diag.with_note(format!("#{depth}: `{link}`"));
                }
                diag.with_suggestion(format!(
                    "a generic function calls itself with ever-growing type arguments; \
                     break the cycle or raise `recursion_limit` above {limit}"
                ))
            }
            MonoError::UnresolvedInstance { reason, span, .. } => {
                let diag = diag.with_label(*span, "required here");
                match reason {
                    UnresolvedReason::NoImpl { trait_path, .. } => diag.with_suggestion(format!(
                        "add an implementation of `{trait_path}` for this type"
                    )),
                    _ => diag,
                }
            }
            MonoError::TypeLengthLimit { limit, span, .. } => diag
                .with_label(*span, "instantiated here")
                .with_suggestion(format!("raise `type_length_limit` above {limit}")),
            MonoError::AnalyzerInconsistency { .. }
            | MonoError::PartitionConstraintViolation { .. }
            | MonoError::SymbolCollision { .. } => diag,
        };

        if self.code().is_internal_error() {
            diag.with_note("this is a bug in the compiler")
        } else {
            diag
        }
    }
}
