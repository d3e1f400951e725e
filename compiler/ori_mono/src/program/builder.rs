//! Incremental construction of a [`Program`].
//!
//! Items are declared first and given bodies later (`set_body`), so mutually
//! recursive functions and self-referential ADTs can be expressed.
//!
//! ```ignore
//! let mut b = ProgramBuilder::new("app");
//! let peach = b.function("peach").type_params(&["T"]).finish();
//! let main = b.function("main").finish();
//! b.set_body(main, Body::builder().call(peach, ty_args(&[Ty::U64])).finish());
//! b.entry_point(main);
//! let program = b.finish();
//! ```

use ori_diagnostic::Span;
use rustc_hash::FxHashMap;

use super::{ItemRecord, Program};
use crate::ir::{
    Body, CrateId, GenericParamDef, GenericParamKind, Generics, ItemDef, ItemId, ItemKind,
    Predicate, Provenance, RegionId, Visibility,
};
use crate::ty::{Ty, TyInterner};

pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// Start a program whose local crate is `local_crate`.
    pub fn new(local_crate: &str) -> Self {
        let mut builder = Self {
            program: Program {
                types: TyInterner::new(),
                crates: Vec::new(),
                crate_regions: Vec::new(),
                regions: Vec::new(),
                records: Vec::new(),
                ids: Vec::new(),
                entry_points: Vec::new(),
                impls: FxHashMap::default(),
                impl_methods: FxHashMap::default(),
                drop_impls: FxHashMap::default(),
            },
        };
        builder.add_crate(local_crate);
        builder
    }

    pub fn types(&self) -> &TyInterner {
        &self.program.types
    }

    /// Register a dependency crate. Its root region is named after it.
    pub fn add_crate(&mut self, name: &str) -> CrateId {
        let krate = CrateId::new(index_u32(self.program.crates.len()));
        self.program.crates.push(name.to_owned());
        let root = self.add_region(name);
        self.program.crate_regions.push(root);
        krate
    }

    pub fn add_region(&mut self, name: &str) -> RegionId {
        let region = RegionId::new(index_u32(self.program.regions.len()));
        self.program.regions.push(name.to_owned());
        region
    }

    pub fn crate_region(&self, krate: CrateId) -> RegionId {
        self.program.crate_regions[krate.index()]
    }

    pub fn function(&mut self, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(self, name, ItemKind::Fn)
    }

    /// A closure nested in `parent`; it starts with the parent's generics.
    pub fn closure(&mut self, parent: ItemId, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(self, name, ItemKind::Closure).child_of(parent)
    }

    pub fn static_item(&mut self, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(self, name, ItemKind::Static)
    }

    pub fn adt(&mut self, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(self, name, ItemKind::Adt { fields: Vec::new() })
    }

    /// A trait. Its only generic parameter is `Self`.
    pub fn trait_def(&mut self, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(
            self,
            name,
            ItemKind::Trait {
                methods: Vec::new(),
            },
        )
        .type_params(&["Self"])
    }

    pub fn trait_method(&mut self, trait_id: ItemId, name: &str) -> ItemDecl<'_> {
        ItemDecl::new(self, name, ItemKind::TraitMethod { trait_id }).child_of(trait_id)
    }

    /// `impl Trait for self_ty`; declare the impl's own parameters with
    /// `type_params` and mention them in `self_ty` as `Param(i)`.
    pub fn impl_block(&mut self, trait_id: ItemId, self_ty: Ty) -> ItemDecl<'_> {
        let ordinal = self.program.impls.get(&trait_id).map_or(0, Vec::len);
        let name = format!(
            "impl-{}-{ordinal}",
            self.program.records[trait_id.index()].def.name
        );
        ItemDecl::new(self, &name, ItemKind::Impl { trait_id, self_ty })
    }

    pub fn impl_method(&mut self, impl_id: ItemId, trait_method: ItemId) -> ItemDecl<'_> {
        let name = self.program.records[trait_method.index()].def.name.clone();
        ItemDecl::new(self, &name, ItemKind::ImplMethod { trait_method }).child_of(impl_id)
    }

    pub fn set_body(&mut self, item: ItemId, body: Body) {
        self.program.records[item.index()].body = Some(body);
    }

    /// Replace an ADT's field types. Fields may mention the ADT itself.
    pub fn set_fields(&mut self, adt: ItemId, fields: Vec<Ty>) {
        if let ItemKind::Adt { fields: slot } = &mut self.program.records[adt.index()].def.kind {
            *slot = fields;
        }
    }

    /// Register `method` as the `Drop` implementation of `adt`. The method
    /// takes the same generic parameters as the ADT.
    pub fn add_drop_impl(&mut self, adt: ItemId, method: ItemId) {
        self.program.drop_impls.insert(adt, method);
    }

    pub fn entry_point(&mut self, item: ItemId) {
        self.program.entry_points.push(item);
    }

    pub fn finish(self) -> Program {
        self.program
    }

    fn register(&mut self, record: ItemRecord) -> ItemId {
        let id = ItemId::new(index_u32(self.program.records.len()));
        match record.def.kind {
            ItemKind::TraitMethod { trait_id } => {
                if let ItemKind::Trait { methods } =
                    &mut self.program.records[trait_id.index()].def.kind
                {
                    methods.push(id);
                }
            }
            ItemKind::Impl { trait_id, .. } => {
                self.program.impls.entry(trait_id).or_default().push(id);
            }
            ItemKind::ImplMethod { trait_method } => {
                if let Some(parent) = record.def.generics.parent {
                    self.program.impl_methods.insert((parent, trait_method), id);
                }
            }
            _ => {}
        }
        self.program.records.push(record);
        self.program.ids.push(id);
        id
    }
}

/// An item being declared. Call [`ItemDecl::finish`] to add it.
pub struct ItemDecl<'b> {
    builder: &'b mut ProgramBuilder,
    def: ItemDef,
    body: Option<Body>,
    provenance: Provenance,
    region: Option<RegionId>,
}

impl<'b> ItemDecl<'b> {
    fn new(builder: &'b mut ProgramBuilder, name: &str, kind: ItemKind) -> Self {
        Self {
            builder,
            def: ItemDef {
                name: name.to_owned(),
                path: name.to_owned(),
                kind,
                generics: Generics::default(),
                predicates: Vec::new(),
                span: Span::DUMMY,
            },
            body: None,
            provenance: Provenance {
                origin: CrateId::LOCAL,
                visibility: Visibility::Private,
                inline_eligible: false,
                forced_linkage: false,
            },
            region: None,
        }
    }

    /// Inherit the parent's generics, crate, region and path prefix.
    fn child_of(mut self, parent: ItemId) -> Self {
        let record = &self.builder.program.records[parent.index()];
        self.def.generics = Generics {
            parent: Some(parent),
            parent_count: record.def.generics.count(),
            params: record.def.generics.params.clone(),
        };
        self.def.path = format!("{}::{}", record.def.path, self.def.name);
        self.provenance.origin = record.provenance.origin;
        self.provenance.inline_eligible = record.provenance.inline_eligible;
        self.region = Some(record.region);
        self
    }

    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        path.clone_into(&mut self.def.path);
        self
    }

    /// Declare the item in a dependency crate, in that crate's root region.
    #[must_use]
    pub fn in_crate(mut self, krate: CrateId) -> Self {
        self.provenance.origin = krate;
        self.region = Some(self.builder.crate_region(krate));
        self
    }

    #[must_use]
    pub fn in_region(mut self, region: RegionId) -> Self {
        self.region = Some(region);
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.provenance.visibility = visibility;
        self
    }

    #[must_use]
    pub fn public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    #[must_use]
    pub fn inline(mut self) -> Self {
        self.provenance.inline_eligible = true;
        self
    }

    #[must_use]
    pub fn forced_linkage(mut self) -> Self {
        self.provenance.forced_linkage = true;
        self
    }

    #[must_use]
    pub fn type_params(self, names: &[&str]) -> Self {
        self.params(names, GenericParamKind::Type)
    }

    #[must_use]
    pub fn const_params(self, names: &[&str]) -> Self {
        self.params(names, GenericParamKind::Const)
    }

    fn params(mut self, names: &[&str], kind: GenericParamKind) -> Self {
        self.def
            .generics
            .params
            .extend(names.iter().map(|&name| GenericParamDef {
                name: name.to_owned(),
                kind,
            }));
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.def.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: Vec<Ty>) -> Self {
        if let ItemKind::Adt { fields: slot } = &mut self.def.kind {
            *slot = fields;
        }
        self
    }

    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.def.span = span;
        self
    }

    pub fn finish(self) -> ItemId {
        let region = self
            .region
            .unwrap_or_else(|| self.builder.crate_region(self.provenance.origin));
        let record = ItemRecord {
            def: self.def,
            body: self.body,
            provenance: self.provenance,
            region,
        };
        self.builder.register(record)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "program tables are far below u32::MAX entries"
)]
fn index_u32(index: usize) -> u32 {
    index as u32
}
