//! Inheritance and cycle-detection tests across the facade.

use rolegate::{AccessControl, AclConfig, AuthzError, RoleDefinition};
use std::collections::HashMap;

fn mapping(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(child, parents)| {
            (
                child.to_string(),
                parents.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

fn newsroom_acl() -> AccessControl {
    let config = AclConfig::builder()
        .role("ADMIN", RoleDefinition::new().allow("News", ["CREATE", "UPDATE", "DELETE"]))
        .role("EDITOR", RoleDefinition::new().allow("News", ["READ"]))
        .role("CLIENT", RoleDefinition::new().allow("Bookings", ["CREATE"]))
        .build()
        .unwrap();
    AccessControl::with_defaults(config)
}

// ============================================================================
// INHERITANCE
// ============================================================================

#[test]
fn editor_inherits_update_from_admin() {
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN"])])).unwrap();

    assert!(acl.can("EDITOR", "News", "UPDATE").unwrap());
    // Direct grants still apply.
    assert!(acl.can("EDITOR", "News", "READ").unwrap());
    // Inheritance flows child → parent only.
    assert!(!acl.can("ADMIN", "News", "READ").unwrap());
}

#[test]
fn inheritance_is_transitive_at_any_depth() {
    let config = AclConfig::builder()
        .role("L0", RoleDefinition::new().allow("Vault", ["OPEN"]))
        .role("L1", RoleDefinition::new())
        .role("L2", RoleDefinition::new())
        .role("L3", RoleDefinition::new())
        .role("L4", RoleDefinition::new())
        .build()
        .unwrap();
    let acl = AccessControl::with_defaults(config);
    acl.set_role_hierarchy(mapping(&[
        ("L1", &["L0"]),
        ("L2", &["L1"]),
        ("L3", &["L2"]),
        ("L4", &["L3"]),
    ]))
    .unwrap();

    assert!(acl.can("L4", "Vault", "OPEN").unwrap());
}

#[test]
fn first_matching_parent_wins_but_all_are_consulted() {
    let acl = newsroom_acl();
    // CLIENT holds nothing on News; ADMIN does. Order must not matter for
    // the outcome, only for traversal.
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["CLIENT", "ADMIN"])])).unwrap();
    assert!(acl.can("EDITOR", "News", "DELETE").unwrap());
    assert!(acl.can("EDITOR", "Bookings", "CREATE").unwrap());
}

#[test]
fn diamond_hierarchy_resolves_once_and_correctly() {
    let config = AclConfig::builder()
        .role("BASE", RoleDefinition::new().allow("Files", ["READ"]))
        .role("LEFT", RoleDefinition::new())
        .role("RIGHT", RoleDefinition::new())
        .role("TOP", RoleDefinition::new())
        .build()
        .unwrap();
    let acl = AccessControl::with_defaults(config);
    acl.set_role_hierarchy(mapping(&[
        ("TOP", &["LEFT", "RIGHT"]),
        ("LEFT", &["BASE"]),
        ("RIGHT", &["BASE"]),
    ]))
    .unwrap();

    assert!(acl.can("TOP", "Files", "READ").unwrap());
    assert!(!acl.can("TOP", "Files", "WRITE").unwrap());
}

#[test]
fn permissions_for_unions_across_ancestors() {
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN"])])).unwrap();

    let permissions = acl.permissions_for("EDITOR", "News").unwrap();
    let expected: Vec<&str> = vec!["CREATE", "DELETE", "READ", "UPDATE"];
    assert_eq!(
        permissions.iter().map(String::as_str).collect::<Vec<_>>(),
        expected
    );
}

#[test]
fn resources_for_reaches_through_ancestors() {
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN", "CLIENT"])])).unwrap();

    let resources = acl.resources_for("EDITOR").unwrap();
    assert!(resources.contains("News"));
    assert!(resources.contains("Bookings"));
}

// ============================================================================
// CYCLE REJECTION
// ============================================================================

#[test]
fn self_loop_is_rejected() {
    let acl = newsroom_acl();
    let err = acl
        .set_role_hierarchy(mapping(&[("ADMIN", &["ADMIN"])]))
        .unwrap_err();
    assert_eq!(
        err,
        AuthzError::CircularHierarchy {
            role: "ADMIN".to_string()
        }
    );
}

#[test]
fn two_node_and_n_node_cycles_are_rejected() {
    let acl = newsroom_acl();
    assert!(matches!(
        acl.set_role_hierarchy(mapping(&[("A", &["B"]), ("B", &["A"])])),
        Err(AuthzError::CircularHierarchy { .. })
    ));
    assert!(matches!(
        acl.set_role_hierarchy(mapping(&[
            ("A", &["B"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("D", &["A"]),
        ])),
        Err(AuthzError::CircularHierarchy { .. })
    ));
}

#[test]
fn rejected_hierarchy_never_partially_applies() {
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN"])])).unwrap();
    assert!(acl.can("EDITOR", "News", "DELETE").unwrap());

    // A cyclic replacement fails...
    assert!(acl
        .set_role_hierarchy(mapping(&[
            ("EDITOR", &["CLIENT"]),
            ("CLIENT", &["EDITOR"]),
        ]))
        .is_err());

    // ...and the previous hierarchy is still in force.
    assert!(acl.can("EDITOR", "News", "DELETE").unwrap());
    assert!(!acl.can("EDITOR", "Bookings", "CREATE").unwrap());
}

// ============================================================================
// DANGLING PARENTS (explicit policy)
// ============================================================================

#[test]
fn parent_missing_from_config_resolves_to_deny() {
    // Installing an edge to an undefined role is accepted; the edge simply
    // contributes no permissions at query time.
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["GHOST"])])).unwrap();

    assert!(acl.can("EDITOR", "News", "READ").unwrap());
    assert!(!acl.can("EDITOR", "News", "DELETE").unwrap());
}

#[test]
fn remove_role_leaves_dangling_edge_that_denies() {
    let acl = newsroom_acl();
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN"])])).unwrap();
    assert!(acl.can("EDITOR", "News", "DELETE").unwrap());

    acl.remove_role("ADMIN").unwrap();

    // The hierarchy still holds the edge; it now grants nothing.
    assert!(!acl.can("EDITOR", "News", "DELETE").unwrap());
    assert!(acl.can("EDITOR", "News", "READ").unwrap());
}

#[test]
fn strict_mode_still_raises_for_unknown_query_root_with_hierarchy() {
    use rolegate::AclOptions;

    let config = AclConfig::builder()
        .role("ADMIN", RoleDefinition::new().allow("News", ["UPDATE"]))
        .build()
        .unwrap();
    let acl = AccessControl::new(
        config,
        AclOptions {
            strict: true,
            ..Default::default()
        },
    );
    acl.set_role_hierarchy(mapping(&[("EDITOR", &["ADMIN"])])).unwrap();

    // EDITOR is a hierarchy child but not a configured role: the query
    // root is unknown, so strict mode raises.
    assert_eq!(
        acl.can("EDITOR", "News", "UPDATE"),
        Err(AuthzError::UnknownRole("EDITOR".to_string()))
    );
}
