//! Property-based tests for collection and partitioning.
//!
//! Random programs are generated from small shape descriptions and checked
//! for the laws every run must satisfy:
//! 1. Instantiations differing only in unused parameters share one instance.
//! 2. Every locally generated instance lands in exactly one unit.
//! 3. The output does not depend on the number of worker threads.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use std::collections::BTreeSet;

use ori_mono::ir::{Body, ItemId};
use ori_mono::program::{Program, ProgramBuilder};
use ori_mono::ty::{ty_args, Ty};
use ori_mono::{collect_and_partition, MonoConfig};
use proptest::prelude::*;

const POOL: [Ty; 6] = [Ty::BOOL, Ty::U8, Ty::U16, Ty::U32, Ty::I64, Ty::CHAR];

/// `fn foo<A, B>() { let _: B; }` called once per pair.
fn collapse_program(pairs: &[(usize, usize)]) -> Program {
    let mut b = ProgramBuilder::new("app");
    let foo = b.function("foo").type_params(&["A", "B"]).finish();
    let b_param = b.types().mk_param(1);
    b.set_body(foo, Body::builder().local(b_param).finish());

    let body = pairs
        .iter()
        .fold(Body::builder(), |body, &(a, second)| {
            body.call(foo, ty_args(&[POOL[a], POOL[second]]))
        })
        .finish();
    let main = b.function("main").body(body).finish();
    b.entry_point(main);
    b.finish()
}

/// Shape of one generated function: region, callees, argument of `shared`.
type FnShape = (usize, Vec<usize>, usize);

fn fn_shape() -> impl Strategy<Value = FnShape> {
    (0usize..3, prop::collection::vec(0usize..16, 0..4), 0usize..POOL.len())
}

/// Functions `f0..fn` spread over three regions; every third one is an
/// entry point and every function calls `shared<Box<_>>`.
fn random_program(shapes: &[FnShape]) -> Program {
    let mut b = ProgramBuilder::new("app");
    let regions = [b.add_region("a"), b.add_region("b::c"), b.add_region("d")];

    let shared = b.function("shared").type_params(&["T"]).in_region(regions[0]).finish();
    let t = b.types().mk_param(0);
    b.set_body(shared, Body::builder().use_ty(t).drop_ty(t).finish());

    let fns: Vec<ItemId> = shapes
        .iter()
        .enumerate()
        .map(|(i, (region, _, _))| b.function(&format!("f{i}")).in_region(regions[*region]).finish())
        .collect();

    for (i, (_, callees, arg)) in shapes.iter().enumerate() {
        let boxed = b.types().mk_box(POOL[*arg]);
        let body = callees
            .iter()
            .fold(Body::builder(), |body, &callee| {
                body.call(fns[callee % fns.len()], ty_args(&[]))
            })
            .call(shared, ty_args(&[boxed]))
            .finish();
        b.set_body(fns[i], body);
    }
    for &root in fns.iter().step_by(3) {
        b.entry_point(root);
    }
    b.finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unused_params_collapse(pairs in prop::collection::vec((0usize..POOL.len(), 0usize..POOL.len()), 1..12)) {
        let program = collapse_program(&pairs);
        let distinct_used: BTreeSet<usize> = pairs.iter().map(|&(_, second)| second).collect();
        let distinct_pairs: BTreeSet<(usize, usize)> = pairs.iter().copied().collect();

        let collapsed = collect_and_partition(&program, &MonoConfig::new().with_jobs(1)).unwrap();
        prop_assert_eq!(collapsed.items.len(), distinct_used.len() + 1);

        let separate = MonoConfig::new().with_jobs(1).with_polymorphize(false);
        let separate = collect_and_partition(&program, &separate).unwrap();
        prop_assert_eq!(separate.items.len(), distinct_pairs.len() + 1);
    }

    #[test]
    fn every_local_instance_is_placed_once(
        shapes in prop::collection::vec(fn_shape(), 1..10),
        codegen_units in 1usize..6,
    ) {
        let program = random_program(&shapes);
        let config = MonoConfig::new().with_jobs(1).with_codegen_units(codegen_units);
        let output = collect_and_partition(&program, &config).unwrap();

        prop_assert!(output.units.len() <= codegen_units);
        for id in output.items.node_ids() {
            let instance = output.items.instance(id);
            let homes = output.units.iter().filter(|unit| unit.contains(instance)).count();
            prop_assert_eq!(homes, usize::from(output.items.info(id).codegen_locally));
        }
        for unit in &output.units {
            let cost: usize = unit.items().iter().map(|(_, data)| data.size_estimate).sum();
            prop_assert_eq!(unit.cost(), cost);
            prop_assert!(unit.items().windows(2).all(|pair| pair[0].1.symbol < pair[1].1.symbol));
        }
        for pair in output.units.windows(2) {
            prop_assert!(pair[0].cost() >= pair[1].cost());
        }
    }

    #[test]
    fn output_is_independent_of_jobs(
        shapes in prop::collection::vec(fn_shape(), 1..10),
        jobs in 2usize..6,
    ) {
        let program = random_program(&shapes);
        let sequential = collect_and_partition(&program, &MonoConfig::new().with_jobs(1)).unwrap();
        let parallel = collect_and_partition(&program, &MonoConfig::new().with_jobs(jobs)).unwrap();

        prop_assert_eq!(
            sequential.render_report(&program),
            parallel.render_report(&program)
        );
        let names = |units: &[ori_mono::CodegenUnit]| {
            units.iter().map(|unit| unit.name().to_owned()).collect::<Vec<_>>()
        };
        prop_assert_eq!(names(&sequential.units), names(&parallel.units));
    }
}
