mod common;

use common::{child_names, holder_with_group, open_editor, seed_area, setup, FailRule};
use constructor_core::{
    ConstructorGateway, EditorError, GatewayError, GatewayErrorKind, NodeRef,
    SqliteConstructorGateway, ValidationError,
};

fn persistence_kind(err: EditorError) -> GatewayErrorKind {
    match err {
        EditorError::Persistence(inner) => inner.kind(),
        other => panic!("expected persistence error, got {other}"),
    }
}

#[test]
fn failed_insert_reports_original_kind_and_reloads() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    editor.add_holder(root, Some("A")).unwrap();
    editor.gateway().fail_on(FailRule {
        method: "insert_constructor_holder",
        skip: 0,
        error: GatewayError::ConnectionFailure("disk unplugged".to_string()),
    });
    editor.gateway().clear_calls();

    let err = editor.add_holder(root, Some("B")).unwrap_err();

    assert_eq!(persistence_kind(err), GatewayErrorKind::ConnectionFailure);
    let calls = editor.gateway().calls();
    assert_eq!(calls[0], "insert_constructor_holder");
    assert!(calls[1..].contains(&"list_areas"));
    assert_eq!(child_names(&editor, root), vec!["A"]);

    editor.add_holder(root, Some("B")).unwrap();
    assert_eq!(child_names(&editor, root), vec!["A", "B"]);
}

#[test]
fn partial_group_move_is_visible_after_reload() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    let (_, source) = holder_with_group(&mut editor, root, "Source");
    let (_, target) = holder_with_group(&mut editor, root, "Target");
    for name in ["X", "Y", "Z"] {
        editor.add_holder(source, Some(name)).unwrap();
    }
    editor.gateway().fail_on(FailRule {
        method: "update_constructor_holder_group_id",
        skip: 1,
        error: GatewayError::ConstraintViolation("injected".to_string()),
    });

    let err = editor
        .move_node(NodeRef::group(source), NodeRef::group(target))
        .unwrap_err();

    assert_eq!(persistence_kind(err), GatewayErrorKind::ConstraintViolation);
    assert_eq!(child_names(&editor, target), vec!["X"]);
    assert_eq!(child_names(&editor, source), vec!["Y", "Z"]);
    editor.forest().check_integrity().unwrap();
}

#[test]
fn edit_on_externally_removed_holder_refreshes_the_session() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    editor.add_holder(root, Some("Keep")).unwrap();
    let gone = editor.add_holder(root, Some("Gone")).unwrap();

    SqliteConstructorGateway::try_new(&conn)
        .unwrap()
        .remove_constructor_object_with_sub_tree(NodeRef::holder(gone))
        .unwrap();

    let err = editor.rename_holder(gone, "Back").unwrap_err();
    assert_eq!(persistence_kind(err), GatewayErrorKind::NotFound);
    assert!(editor.forest().holder(gone).is_none());

    match editor.rename_holder(gone, "Back").unwrap_err() {
        EditorError::StaleReference(node) => assert_eq!(node, NodeRef::holder(gone)),
        other => panic!("expected stale reference, got {other}"),
    }
}

#[test]
fn ids_never_loaded_are_plain_validation_failures() {
    let conn = setup();
    let (area, _) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    let unknown = constructor_core::HolderId(999);

    match editor.rename_holder(unknown, "Back").unwrap_err() {
        EditorError::Validation(inner) => {
            assert_eq!(inner, ValidationError::NodeNotFound(NodeRef::holder(unknown)))
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn reload_failure_does_not_mask_the_write_error() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    editor.add_holder(root, Some("Keep")).unwrap();
    let gone = editor.add_holder(root, Some("Gone")).unwrap();

    SqliteConstructorGateway::try_new(&conn)
        .unwrap()
        .remove_constructor_object_with_sub_tree(NodeRef::holder(gone))
        .unwrap();
    editor.gateway().fail_on(FailRule {
        method: "list_areas",
        skip: 0,
        error: GatewayError::ConnectionFailure("reload failed".to_string()),
    });

    let err = editor.rename_holder(gone, "Back").unwrap_err();

    assert_eq!(persistence_kind(err), GatewayErrorKind::NotFound);
    assert!(editor.forest().holder(gone).is_some());
    editor.notify_data_changed().unwrap();
    assert!(editor.forest().holder(gone).is_none());
}

#[test]
fn failed_reference_swap_leaves_holder_without_sub_object() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    let (holder, old_group) = holder_with_group(&mut editor, root, "H");
    editor.add_holder(old_group, Some("Old")).unwrap();
    let (_, target) = holder_with_group(&mut editor, root, "Target");
    editor.gateway().fail_on(FailRule {
        method: "update_constructor_holder_sub_reference",
        skip: 0,
        error: GatewayError::ConnectionFailure("injected".to_string()),
    });

    let err = editor.create_group_reference(holder, target).unwrap_err();

    assert_eq!(persistence_kind(err), GatewayErrorKind::ConnectionFailure);
    assert_eq!(editor.forest().holder(holder).unwrap().sub_object, None);
    assert!(editor.forest().group(old_group).is_none());
    assert_eq!(child_names(&editor, target), Vec::<String>::new());
}

#[test]
fn failed_paste_keeps_already_inserted_holders() {
    let conn = setup();
    let (area, root) = seed_area(&conn, "Home");
    let mut editor = open_editor(&conn, area);
    let (_, source) = holder_with_group(&mut editor, root, "Source");
    let (_, target) = holder_with_group(&mut editor, root, "Target");
    for name in ["A", "B"] {
        editor.add_holder(source, Some(name)).unwrap();
    }
    editor.gateway().fail_on(FailRule {
        method: "insert_constructor_holder_sub_tree",
        skip: 1,
        error: GatewayError::DuplicateKey("injected".to_string()),
    });

    let err = editor
        .paste(
            NodeRef::group(source),
            NodeRef::group(target),
            &mut constructor_core::NumberedCopies,
        )
        .unwrap_err();

    assert_eq!(persistence_kind(err), GatewayErrorKind::DuplicateKey);
    assert_eq!(child_names(&editor, target), vec!["A"]);
    assert_eq!(child_names(&editor, source), vec!["A", "B"]);
}
