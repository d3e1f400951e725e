//! End-to-end monomorphization runs over small programs.
//!
//! Each test builds a program, runs collection and partitioning, and checks
//! the rendered report or the returned errors.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use ori_diagnostic::ErrorCode;
use ori_mono::ir::Body;
use ori_mono::program::{Program, ProgramBuilder};
use ori_mono::ty::{ty_args, Ty};
use ori_mono::{collect_and_partition, init_tracing, CollectionMode, MonoConfig, MonoError};
use pretty_assertions::assert_eq;

fn config() -> MonoConfig {
    MonoConfig::new().with_jobs(1)
}

fn report(program: &Program, config: &MonoConfig) -> String {
    init_tracing();
    let output = collect_and_partition(program, config).expect("monomorphization succeeds");
    output.render_report(program)
}

#[test]
fn unused_parameter_collapses_two_calls() {
    let mut b = ProgramBuilder::new("app");
    let foo = b.function("foo").type_params(&["A", "B"]).finish();
    let b_param = b.types().mk_param(1);
    b.set_body(foo, Body::builder().local(b_param).finish());
    let main = b
        .function("main")
        .body(
            Body::builder()
                .call(foo, ty_args(&[Ty::U16, Ty::U32]))
                .call(foo, ty_args(&[Ty::U64, Ty::U32]))
                .finish(),
        )
        .finish();
    b.entry_point(main);
    let program = b.finish();

    assert_eq!(
        report(&program, &config()),
        "MONO_ITEM foo<A, u32> @@ app.app-volatile[External]\n\
         MONO_ITEM main @@ app.app[External]\n"
    );

    let output = collect_and_partition(&program, &config()).unwrap();
    assert_eq!(output.unused_params.get(foo).unwrap().to_string(), "{0}");
}

#[test]
fn fruit_chain_places_generic_in_volatile_unit() {
    let mut b = ProgramBuilder::new("app");
    let fruit = b.add_region("fruit");
    let peach = b.function("peach").type_params(&["T"]).in_region(fruit).finish();
    let t = b.types().mk_param(0);
    b.set_body(peach, Body::builder().local(t).use_ty(t).finish());
    let banana = b.function("banana").in_region(fruit).finish();
    b.set_body(banana, Body::builder().call(peach, ty_args(&[Ty::U64])).finish());
    let main = b.function("main").in_region(fruit).finish();
    b.set_body(main, Body::builder().call(banana, ty_args(&[])).finish());
    b.entry_point(main);
    let program = b.finish();

    assert_eq!(
        report(&program, &config()),
        "MONO_ITEM banana @@ app.fruit[Internal]\n\
         MONO_ITEM main @@ app.fruit[External]\n\
         MONO_ITEM peach<u64> @@ app.fruit-volatile[External]\n"
    );
}

#[test]
fn external_non_inline_function_is_linked_not_generated() {
    let mut b = ProgramBuilder::new("app");
    let core = b.add_crate("core");
    let strlen = b.function("strlen").in_crate(core).public().finish();
    let main = b
        .function("main")
        .body(Body::builder().call(strlen, ty_args(&[])).finish())
        .finish();
    b.entry_point(main);
    let program = b.finish();

    let output = collect_and_partition(&program, &config()).unwrap();
    assert_eq!(output.items.len(), 2);
    assert_eq!(output.units.len(), 1);
    assert_eq!(
        output.render_report(&program),
        "MONO_ITEM main @@ app.app[External]\nMONO_ITEM strlen\n"
    );
}

#[test]
fn runaway_recursion_hits_the_default_limit() {
    let mut b = ProgramBuilder::new("app");
    let grow = b.function("grow").type_params(&["T"]).finish();
    let t = b.types().mk_param(0);
    let boxed_t = b.types().mk_box(t);
    b.set_body(grow, Body::builder().call(grow, ty_args(&[boxed_t])).finish());
    let main = b
        .function("main")
        .body(Body::builder().call(grow, ty_args(&[Ty::U8])).finish())
        .finish();
    b.entry_point(main);
    let program = b.finish();

    let errors = collect_and_partition(&program, &config()).unwrap_err();
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert!(matches!(error, MonoError::InstantiationOverflow { limit: 128, .. }));

    let diag = error.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E7001);
    // `main`, 128 instances of `grow`, and the one that overflowed.
    assert_eq!(diag.notes.len(), 130);
    assert_eq!(diag.notes[0], "#0: `main`");
    assert_eq!(diag.notes[1], "#1: `grow<u8>`");
}

#[test]
fn raising_the_limit_is_not_enough_for_unbounded_growth() {
    let mut b = ProgramBuilder::new("app");
    let grow = b.function("grow").type_params(&["T"]).finish();
    let t = b.types().mk_param(0);
    let pair = b.types().mk_tuple(&[t, t]);
    b.set_body(grow, Body::builder().call(grow, ty_args(&[pair])).finish());
    let main = b
        .function("main")
        .body(Body::builder().call(grow, ty_args(&[Ty::U8])).finish())
        .finish();
    b.entry_point(main);
    let program = b.finish();

    let config = config().with_recursion_limit(10_000).with_type_length_limit(1_000);
    let errors = collect_and_partition(&program, &config).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), ErrorCode::E7003);
}

/// Library-style program: nothing is an entry point.
fn library() -> Program {
    let mut b = ProgramBuilder::new("lib");
    let helper = b.function("helper").body(Body::default()).finish();
    b.function("api")
        .public()
        .body(Body::builder().call(helper, ty_args(&[])).finish())
        .finish();
    let map = b.function("map").type_params(&["T"]).public().finish();
    let t = b.types().mk_param(0);
    b.set_body(map, Body::builder().use_ty(t).finish());
    b.finish()
}

#[test]
fn eager_mode_collects_every_non_generic_function() {
    let program = library();

    let lazy = collect_and_partition(&program, &config()).unwrap();
    assert!(lazy.items.is_empty());
    assert!(lazy.units.is_empty());

    let eager = config().with_collection_mode(CollectionMode::Eager);
    assert_eq!(
        report(&program, &eager),
        "MONO_ITEM api @@ lib.lib[External]\n\
         MONO_ITEM helper @@ lib.lib[External]\n"
    );
}

#[test]
fn reports_do_not_depend_on_thread_count() {
    let mut b = ProgramBuilder::new("app");
    let net = b.add_region("net");
    let shared = b.function("shared").type_params(&["T"]).in_region(net).finish();
    let t = b.types().mk_param(0);
    b.set_body(shared, Body::builder().use_ty(t).drop_ty(t).finish());

    let pool = [Ty::U8, Ty::U16, Ty::U32, Ty::BOOL, Ty::CHAR];
    for i in 0..24 {
        let boxed = b.types().mk_box(pool[i % pool.len()]);
        let root = b
            .function(&format!("task{i}"))
            .forced_linkage()
            .body(
                Body::builder()
                    .call(shared, ty_args(&[boxed]))
                    .call(shared, ty_args(&[pool[(i + 1) % pool.len()]]))
                    .finish(),
            )
            .finish();
        b.entry_point(root);
    }
    let program = b.finish();

    let sequential = report(&program, &config().with_codegen_units(3));
    for jobs in [2, 4, 8] {
        let parallel = report(&program, &config().with_codegen_units(3).with_jobs(jobs));
        assert_eq!(sequential, parallel, "jobs = {jobs}");
    }
}
