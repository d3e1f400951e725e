use pretty_assertions::assert_eq;

use super::*;
use crate::ir::{Body, Visibility};
use crate::ty::{ty_args, Ty};

struct ShowFixture {
    program: Program,
    vec: ItemId,
    show_fmt: ItemId,
    show_name: ItemId,
    vec_fmt: ItemId,
    show: ItemId,
}

/// `trait Show { fn fmt(&self); fn name(&self) { .. } }`
/// `impl<T> Show for Vec<T> { fn fmt(&self) { .. } }`
fn show_fixture() -> ShowFixture {
    let mut b = ProgramBuilder::new("app");
    let vec = b.adt("Vec").type_params(&["T"]).finish();
    let show = b.trait_def("Show").finish();
    let show_fmt = b.trait_method(show, "fmt").finish();
    let show_name = b.trait_method(show, "name").body(Body::default()).finish();

    let vec_t = b.types().mk_adt(vec, ty_args(&[b.types().mk_param(0)]));
    let impl_id = b.impl_block(show, vec_t).type_params(&["T"]).finish();
    let vec_fmt = b.impl_method(impl_id, show_fmt).body(Body::default()).finish();

    ShowFixture {
        program: b.finish(),
        vec,
        show_fmt,
        show_name,
        vec_fmt,
        show,
    }
}

#[test]
fn test_resolve_plain_function() {
    let mut b = ProgramBuilder::new("app");
    let foo = b.function("foo").type_params(&["T"]).finish();
    let program = b.finish();

    let args = ty_args(&[Ty::U8]);
    assert_eq!(program.resolve(foo, &args), Resolution::Item(foo, args.clone()));
}

#[test]
fn test_resolve_through_impl() {
    let f = show_fixture();
    let types = f.program.types();
    let vec_u8 = types.mk_adt(f.vec, ty_args(&[Ty::U8]));

    assert_eq!(
        f.program.resolve(f.show_fmt, &ty_args(&[vec_u8])),
        Resolution::Item(f.vec_fmt, ty_args(&[Ty::U8]))
    );
}

#[test]
fn test_resolve_default_method() {
    let f = show_fixture();
    let types = f.program.types();
    let args = ty_args(&[types.mk_adt(f.vec, ty_args(&[Ty::BOOL]))]);

    assert_eq!(
        f.program.resolve(f.show_name, &args),
        Resolution::Item(f.show_name, args.clone())
    );
}

#[test]
fn test_resolve_dyn_is_virtual() {
    let f = show_fixture();
    let dyn_show = f.program.types().mk_dyn(f.show);
    assert_eq!(
        f.program.resolve(f.show_fmt, &ty_args(&[dyn_show])),
        Resolution::Virtual
    );
}

#[test]
fn test_resolve_missing_impl() {
    let f = show_fixture();
    assert_eq!(
        f.program.resolve(f.show_fmt, &ty_args(&[Ty::U32])),
        Resolution::Unresolved
    );
    let param = f.program.types().mk_param(0);
    assert_eq!(
        f.program.resolve(f.show_fmt, &ty_args(&[param])),
        Resolution::Unresolved
    );
}

#[test]
fn test_builder_paths_and_generics() {
    let f = show_fixture();
    let program = &f.program;

    assert_eq!(program.item(f.show_fmt).path, "Show::fmt");
    assert_eq!(program.item(f.show_fmt).generics.count(), 1);
    assert_eq!(program.item(f.show_fmt).generics.own_count(), 0);
    assert_eq!(program.item(f.vec_fmt).path, "impl-Show-0::fmt");
    assert_eq!(program.item(f.vec_fmt).generics.parent_count, 1);
    assert_eq!(program.find(CrateId::LOCAL, "Show::name"), Some(f.show_name));
    assert_eq!(program.find(CrateId::LOCAL, "missing"), None);

    let ItemKind::Trait { methods } = &program.item(f.show).kind else {
        panic!("Show should be a trait");
    };
    assert_eq!(methods, &vec![f.show_fmt, f.show_name]);
}

#[test]
fn test_crates_regions_and_provenance() {
    let mut b = ProgramBuilder::new("app");
    let net = b.add_region("net::http");
    let dep = b.add_crate("core");
    let local = b.function("serve").in_region(net).public().forced_linkage().finish();
    let external = b.function("helper").in_crate(dep).inline().finish();
    let droppable = b.adt("Guard").finish();
    let drop_method = b.function("Guard::drop").finish();
    b.add_drop_impl(droppable, drop_method);
    let program = b.finish();

    assert_eq!(program.crate_count(), 2);
    assert_eq!(program.crate_name(dep), "core");
    assert_eq!(program.region_name(program.module_region_of(local)), "net::http");
    assert_eq!(program.region_name(program.module_region_of(external)), "core");

    let provenance = program.provenance_of(local);
    assert_eq!(provenance.visibility, Visibility::Public);
    assert!(provenance.forced_linkage);
    assert!(provenance.is_local());

    let provenance = program.provenance_of(external);
    assert_eq!(provenance.origin, dep);
    assert!(provenance.inline_eligible);

    assert_eq!(program.drop_impl_of(droppable), Some(drop_method));
    assert_eq!(program.drop_impl_of(local), None);
    assert!(program.body_of(local).is_none());
    assert_eq!(program.items().len(), 4);
}
