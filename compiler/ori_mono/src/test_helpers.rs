//! Program shorthands shared by the unit tests.

use crate::collector::{collect, MonoItems};
use crate::config::MonoConfig;
use crate::error::MonoError;
use crate::ir::{Body, ItemId};
use crate::polymorphize::Polymorphizer;
use crate::program::{Program, ProgramBuilder};
use crate::provider::IrProvider;
use crate::ty::{ty_args, Ty};
use crate::{collect_and_partition, MonoOutput};

/// Single-threaded defaults, so failures reproduce exactly.
pub(crate) fn config() -> MonoConfig {
    MonoConfig::new().with_jobs(1)
}

pub(crate) fn collect_items(program: &Program, config: &MonoConfig) -> Result<MonoItems, Vec<MonoError>> {
    let poly = Polymorphizer::new(program, config);
    collect(program, &poly, config)
}

pub(crate) fn run(program: &Program, config: &MonoConfig) -> MonoOutput {
    collect_and_partition(program, config)
        .unwrap_or_else(|errors| panic!("monomorphization failed: {errors:?}"))
}

/// Rendered instances, sorted.
pub(crate) fn instance_names(program: &Program, items: &MonoItems) -> Vec<String> {
    let mut names: Vec<String> = items
        .instances()
        .map(|instance| instance.display(program).to_string())
        .collect();
    names.sort();
    names
}

pub(crate) struct Fruit {
    pub program: Program,
    pub main: ItemId,
    pub banana: ItemId,
    pub peach: ItemId,
}

/// `main -> banana -> peach::<u64>`, all in region `fruit` of crate `app`.
pub(crate) fn fruit_program() -> Fruit {
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

    Fruit {
        program: b.finish(),
        main,
        banana,
        peach,
    }
}

/// Path of an item, for assertions that read like source.
pub(crate) fn path(program: &Program, item: ItemId) -> String {
    program.item(item).path.clone()
}
