//! Tests for ambiguity enumeration: candidate combinations, version chains,
//! tie-breaks, and best-effort fallbacks.

mod common;

use common::*;
use phz_ast::DeclFlags;
use phz_common::diagnostics::diagnostic_codes;
use phz_resolver::{ResolverOptions, SymbolTable};

fn table() -> SymbolTable {
    init_tracing();
    SymbolTable::new(ResolverOptions::default())
}

/// Two conditional declarations of `Foo` in different branches/files, one
/// implementing `I1`, the other `I2`.
fn conditional_foo_fixture(table: &SymbolTable) {
    table.add_file(file(
        "src/interfaces.phz",
        vec![interface(table, "I1"), interface(table, "I2")],
    ));
    let mut first = class(table, "Foo");
    first.flags |= DeclFlags::CONDITIONAL;
    first.interfaces.push(type_ref(table, "I1", 40));
    table.add_file(file("src/foo_a.phz", vec![first]));
    let mut second = class(table, "Foo");
    second.flags |= DeclFlags::CONDITIONAL;
    second.interfaces.push(type_ref(table, "I2", 40));
    table.add_file(file("src/foo_b.phz", vec![second]));
}

#[test]
fn test_two_conditional_declarations_carry_ordinals() {
    let table = table();
    conditional_foo_fixture(&table);

    let reachable = table.reachable_versions(name(&table, "Foo"));
    assert_eq!(reachable.len(), 2);
    assert_eq!(table.symbol(reachable[0]).version(), 1);
    assert_eq!(table.symbol(reachable[1]).version(), 2);

    // Each version keeps its own interface list.
    let i1 = sole(&table, "I1");
    let i2 = sole(&table, "I2");
    assert_eq!(table.interfaces(reachable[0]).as_slice(), &[i1]);
    assert_eq!(table.interfaces(reachable[1]).as_slice(), &[i2]);
}

#[test]
fn test_referencing_an_ambiguous_name_splits_versions() {
    let table = table();
    conditional_foo_fixture(&table);
    let mut user = class(&table, "User");
    user.base = Some(type_ref(&table, "Foo", 22));
    table.add_file(file("src/user.phz", vec![user]));

    let chain = table.version_chain(name(&table, "User"));
    assert_eq!(chain.len(), 2);
    // One version per Foo candidate, in registry order.
    let bases: Vec<_> = chain
        .iter()
        .map(|&id| table.base_type(id).unwrap())
        .collect();
    let foos = table.lookup_types(name(&table, "Foo"));
    assert_eq!(bases, vec![foos[0], foos[1]]);

    let warnings: Vec<_> = table
        .take_diagnostics()
        .into_iter()
        .filter(|d| d.code == diagnostic_codes::AMBIGUOUS_DECLARATION)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_cartesian_product_across_independent_slots() {
    let table = table();
    // Base name and trait name each have two conditional candidates.
    let mut base_a = class(&table, "B");
    base_a.flags |= DeclFlags::CONDITIONAL;
    let mut base_b = class(&table, "B");
    base_b.flags |= DeclFlags::CONDITIONAL;
    let mut trait_a = trait_decl(&table, "T");
    trait_a.flags |= DeclFlags::CONDITIONAL;
    let mut trait_b = trait_decl(&table, "T");
    trait_b.flags |= DeclFlags::CONDITIONAL;
    table.add_file(file("src/one.phz", vec![base_a, trait_a]));
    table.add_file(file("src/two.phz", vec![base_b, trait_b]));

    let mut user = class(&table, "D");
    user.base = Some(type_ref(&table, "B", 18));
    user.trait_uses.push(uses(&table, "T", 36));
    table.add_file(file("src/d.phz", vec![user]));

    let chain = table.version_chain(name(&table, "D"));
    assert_eq!(chain.len(), 4);
    for (position, &id) in chain.iter().enumerate() {
        assert_eq!(table.symbol(id).version(), position as u32 + 1);
    }
}

#[test]
fn test_invalid_combinations_are_discarded_with_diagnostics() {
    let table = table();
    // Two candidates for the base name; one is an interface and can never
    // be extended.
    let mut good = class(&table, "B");
    good.flags |= DeclFlags::CONDITIONAL;
    let mut bad = interface(&table, "B");
    bad.flags |= DeclFlags::CONDITIONAL;
    table.add_file(file("src/good.phz", vec![good]));
    table.add_file(file("src/bad.phz", vec![bad]));

    let mut user = class(&table, "D");
    user.base = Some(type_ref(&table, "B", 18));
    table.add_file(file("src/d.phz", vec![user]));

    let chain = table.version_chain(name(&table, "D"));
    // Only the class candidate survives validation.
    assert_eq!(chain.len(), 1);
    assert_eq!(table.symbol(chain[0]).version(), 0);
    assert!(table.symbol(chain[0]).has_valid_version());

    let diagnostics = table.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::CANNOT_EXTEND_FROM);
}

#[test]
fn test_local_unconditional_candidate_wins_its_slot() {
    let table = table();
    let mut elsewhere = class(&table, "Helper");
    elsewhere.flags |= DeclFlags::CONDITIONAL;
    table.add_file(file("src/elsewhere.phz", vec![elsewhere]));

    // The referencing file declares Helper unconditionally; that local
    // declaration wins over the same-named conditional one elsewhere.
    let mut user = class(&table, "App");
    user.base = Some(type_ref(&table, "Helper", 20));
    table.add_file(file("src/app.phz", vec![class(&table, "Helper"), user]));

    let app = sole(&table, "App");
    let chain = table.version_chain(name(&table, "App"));
    assert_eq!(chain.len(), 1);
    assert_eq!(table.symbol(app).version(), 0);

    let base = table.base_type(app).unwrap();
    let base_symbol = table.symbol(base);
    assert!(!base_symbol.decl.as_ref().unwrap().is_conditional());
    assert!(table.take_diagnostics().is_empty());
}

#[test]
fn test_no_valid_combination_publishes_best_effort_version() {
    let table = table();
    // Both candidates for the base name are interfaces.
    let mut first = interface(&table, "B");
    first.flags |= DeclFlags::CONDITIONAL;
    let mut second = interface(&table, "B");
    second.flags |= DeclFlags::CONDITIONAL;
    table.add_file(file("src/one.phz", vec![first]));
    table.add_file(file("src/two.phz", vec![second]));

    let mut user = class(&table, "D");
    user.base = Some(type_ref(&table, "B", 18));
    table.add_file(file("src/d.phz", vec![user]));

    let d = sole(&table, "D");
    // The raw slot resolution is published so later passes still have a
    // symbol: the first candidate in registry order.
    let base = table.base_type(d).expect("best-effort base");
    assert_eq!(base, table.lookup_types(name(&table, "B"))[0]);
    assert!(!table.symbol(d).has_valid_version());
    assert_eq!(table.version_chain(name(&table, "D")).len(), 1);

    let diagnostics = table.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::CANNOT_EXTEND_FROM);
}

#[test]
fn test_next_version_walks_the_chain_in_order() {
    let table = table();
    conditional_foo_fixture(&table);

    let chain = table.version_chain(name(&table, "Foo"));
    assert_eq!(chain.len(), 2);
    assert_eq!(table.next_version(chain[0]), Some(chain[1]));
    assert_eq!(table.next_version(chain[1]), None);
}

#[test]
fn test_declaration_versions_follow_any_member_of_the_chain() {
    let table = table();
    conditional_foo_fixture(&table);
    let mut user = class(&table, "User");
    user.base = Some(type_ref(&table, "Foo", 22));
    table.add_file(file("src/user.phz", vec![user]));

    let chain = table.version_chain(name(&table, "User"));
    assert_eq!(chain.len(), 2);
    // Both versions belong to the same declaration.
    assert_eq!(table.declaration_versions(chain[1]).as_slice(), chain.as_slice());
}

#[test]
fn test_unreachable_versions_are_dropped_from_reachable_queries() {
    let table = table();
    conditional_foo_fixture(&table);

    let chain = table.version_chain(name(&table, "Foo"));
    table.mark_unreachable(chain[0]);
    let reachable = table.reachable_versions(name(&table, "Foo"));
    assert_eq!(reachable.as_slice(), &[chain[1]]);
}
