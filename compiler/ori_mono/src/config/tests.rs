use super::*;

#[test]
fn defaults() {
    let config = MonoConfig::default();
    assert_eq!(config.recursion_limit, 128);
    assert_eq!(config.type_length_limit, 1_048_576);
    assert!(config.polymorphize);
    assert_eq!(config.collection_mode, CollectionMode::Lazy);
    assert_eq!(config.codegen_units, 16);
    assert!(config.human_readable_cgu_names);
    assert_eq!(config.jobs, 0);
}

#[test]
fn builder_methods() {
    let config = MonoConfig::new()
        .with_recursion_limit(8)
        .with_type_length_limit(100)
        .with_polymorphize(false)
        .with_collection_mode(CollectionMode::Eager)
        .with_codegen_units(4)
        .with_human_readable_cgu_names(false)
        .with_jobs(2);
    assert_eq!(config.recursion_limit, 8);
    assert_eq!(config.type_length_limit, 100);
    assert!(!config.polymorphize);
    assert_eq!(config.collection_mode, CollectionMode::Eager);
    assert_eq!(config.codegen_units, 4);
    assert!(!config.human_readable_cgu_names);
    assert_eq!(config.effective_jobs(), 2);
}

#[test]
fn zero_codegen_units_clamps_to_one() {
    assert_eq!(MonoConfig::new().with_codegen_units(0).codegen_units, 1);
}

#[test]
fn auto_jobs_is_at_least_one() {
    assert!(MonoConfig::new().with_jobs(0).effective_jobs() >= 1);
}
