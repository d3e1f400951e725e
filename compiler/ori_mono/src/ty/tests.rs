use pretty_assertions::assert_eq;

use super::*;
use crate::ir::ItemId;
use crate::program::ProgramBuilder;
use crate::provider::IrProvider;

#[test]
fn test_primitives_pre_interned() {
    let types = TyInterner::new();
    assert_eq!(types.intern(TyKind::Bool), Ty::BOOL);
    assert_eq!(types.intern(TyKind::Uint(UintTy::U64)), Ty::U64);
    assert_eq!(types.intern(TyKind::Tuple(TyList::new())), Ty::UNIT);
    assert_eq!(types.kind(Ty::F32), TyKind::Float(FloatTy::F32));
    assert_eq!(types.len(), Ty::PRIMITIVE_COUNT as usize);
    assert!(types.is_empty());
}

#[test]
fn test_intern_is_structural() {
    let types = TyInterner::new();
    let a = types.mk_tuple(&[Ty::U8, Ty::BOOL]);
    let b = types.mk_tuple(&[Ty::U8, Ty::BOOL]);
    let c = types.mk_tuple(&[Ty::BOOL, Ty::U8]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(types.len(), Ty::PRIMITIVE_COUNT as usize + 2);
    assert!(!types.is_empty());
}

#[test]
fn test_flags_and_length() {
    let types = TyInterner::new();
    let param = types.mk_param(0);
    let boxed = types.mk_box(param);
    let adt = types.mk_adt(ItemId::new(3), ty_args(&[boxed, Ty::U32]));

    assert!(types.flags(Ty::I32).contains(TyFlags::IS_PRIMITIVE));
    assert!(types.has_params(param));
    assert!(types.flags(adt).contains(TyFlags::HAS_BOX | TyFlags::HAS_ADT));
    assert!(!types.flags(adt).contains(TyFlags::IS_PRIMITIVE));
    // Adt + Box + Param + u32
    assert_eq!(types.type_length(adt), 4);
    assert_eq!(types.type_depth(adt), 3);
    assert_eq!(types.type_depth(Ty::I32), 1);

    let array = types.mk_array(Ty::U8, Const::Param(1));
    assert!(types.flags(array).contains(TyFlags::HAS_CONST_PARAM));
    assert_eq!(types.type_length(array), 3);
    assert_eq!(types.type_depth(array), 2);
}

#[test]
fn test_subst_replaces_params() {
    let types = TyInterner::new();
    let t = types.mk_param(0);
    let u = types.mk_param(1);
    let generic = types.mk_tuple(&[types.mk_ref(t), types.mk_array(u, Const::Param(2))]);

    let args: GenericArgs = [
        GenericArg::Type(Ty::U64),
        GenericArg::Type(Ty::BOOL),
        GenericArg::Const(Const::Value(4)),
    ]
    .into_iter()
    .collect();

    let expected = types.mk_tuple(&[
        types.mk_ref(Ty::U64),
        types.mk_array(Ty::BOOL, Const::Value(4)),
    ]);
    assert_eq!(subst(&types, generic, &args), Ok(expected));
}

#[test]
fn test_subst_without_params_is_identity() {
    let types = TyInterner::new();
    let concrete = types.mk_slice(Ty::CHAR);
    assert_eq!(subst(&types, concrete, &[]), Ok(concrete));
}

#[test]
fn test_subst_errors() {
    let types = TyInterner::new();
    let escaping = types.mk_param(2);
    assert_eq!(
        subst(&types, escaping, &ty_args(&[Ty::U8])),
        Err(SubstError::EscapingParam {
            index: 2,
            arg_count: 1
        })
    );

    let mismatch = types.mk_param(0);
    let const_arg: GenericArgs = std::iter::once(GenericArg::Const(Const::Value(1))).collect();
    assert_eq!(
        subst(&types, mismatch, &const_arg),
        Err(SubstError::KindMismatch { index: 0 })
    );
}

#[test]
fn test_subst_args() {
    let types = TyInterner::new();
    let t = types.mk_param(0);
    let inner = ty_args(&[types.mk_box(t), Ty::STR]);
    let result = subst_args(&types, &inner, &ty_args(&[Ty::I8]));
    assert_eq!(result, Ok(ty_args(&[types.mk_box(Ty::I8), Ty::STR])));
}

#[test]
fn test_args_helpers() {
    let types = TyInterner::new();
    let generic = ty_args(&[Ty::U8, types.mk_param(0)]);
    let concrete = ty_args(&[Ty::U8, types.mk_ref(Ty::U8)]);

    assert!(args_have_params(&types, &generic));
    assert!(!args_have_params(&types, &concrete));
    assert_eq!(args_type_length(&types, &concrete), 3);
    assert_eq!(args_type_depth(&types, &concrete), 2);
    assert_eq!(args_type_depth(&types, &GenericArgs::new()), 0);
}

#[test]
fn test_printer_renders_structure() {
    let mut b = ProgramBuilder::new("app");
    let dep = b.add_crate("core");
    let vec = b.adt("Vec").type_params(&["T"]).in_crate(dep).finish();
    let show = b.trait_def("Show").finish();
    let program = b.finish();
    let types = program.types();

    let vec_u8 = types.mk_adt(vec, ty_args(&[Ty::U8]));
    let printer = TyPrinter::new(&program);

    assert_eq!(printer.ty(vec_u8), "Vec<u8>");
    assert_eq!(printer.qualified().ty(vec_u8), "core::Vec<u8>");
    assert_eq!(printer.ty(types.mk_tuple(&[Ty::I32])), "(i32,)");
    assert_eq!(printer.ty(types.mk_mut_ref(Ty::STR)), "&mut str");
    assert_eq!(printer.ty(types.mk_box(types.mk_dyn(show))), "Box<dyn Show>");
    assert_eq!(
        printer.ty(types.mk_fn_ptr(&[Ty::BOOL], Ty::UNIT)),
        "fn(bool) -> ()"
    );
    assert_eq!(
        printer.ty(types.mk_array(Ty::U8, Const::Value(16))),
        "[u8; 16]"
    );
    assert_eq!(printer.ty(types.mk_param(1)), "^1");
    assert_eq!(printer.args(&[]), "");
}

#[test]
fn test_printer_uses_param_names() {
    let mut b = ProgramBuilder::new("app");
    let foo = b.function("foo").type_params(&["A", "B"]).finish();
    let program = b.finish();
    let types = program.types();
    let generics = &program.item(foo).generics;

    let args = ty_args(&[types.mk_param(0), Ty::U32]);
    let printer = TyPrinter::new(&program).with_generics(generics);
    assert_eq!(printer.args(&args), "<A, u32>");
}

#[test]
fn test_concurrent_interning_agrees() {
    use rayon::prelude::*;

    let types = TyInterner::new();
    let handles: Vec<Ty> = (0..64u32)
        .into_par_iter()
        .map(|i| types.mk_ref(types.mk_param(i % 8)))
        .collect();

    for (i, &handle) in handles.iter().enumerate() {
        assert_eq!(handle, handles[i % 8]);
    }
    // Eight params and eight references.
    assert_eq!(types.len(), Ty::PRIMITIVE_COUNT as usize + 16);
}
