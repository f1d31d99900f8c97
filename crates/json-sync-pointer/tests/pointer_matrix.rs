use json_sync_pointer::{
    format_json_pointer, is_child, is_list_step, parent, parse_json_pointer,
    validate_json_pointer, JsonPointerError, PathPattern,
};

#[test]
fn pointer_parse_format_roundtrip_matrix() {
    let cases = [
        "",
        "/",
        "/foo",
        "/foo/bar",
        "/a~0b/c~1d",
        "/arr/0",
        "/arr/-",
        "/~0/~1",
    ];

    for pointer in cases {
        let path = parse_json_pointer(pointer);
        let out = format_json_pointer(&path);
        assert_eq!(out, pointer);
    }
}

#[test]
fn pointer_relations_matrix() {
    let root = parse_json_pointer("");
    let list = parse_json_pointer("/matrix/1");
    let slot = parse_json_pointer("/matrix/1/-");

    assert!(is_child(&root, &list));
    assert!(is_child(&list, &slot));
    assert!(!is_child(&slot, &list));
    assert_eq!(parent(&slot).unwrap(), list);
    assert_eq!(parent(&root), Err(JsonPointerError::NoParent));
    assert!(is_list_step(slot.last().unwrap()));
}

#[test]
fn pointer_validation_matrix() {
    assert!(validate_json_pointer("").is_ok());
    assert!(validate_json_pointer("/x").is_ok());
    assert!(validate_json_pointer("x").is_err());
}

#[test]
fn patterns_deserialize_from_json_strings() {
    let patterns: Vec<PathPattern> =
        serde_json::from_str(r#"["/secret", "/users/*/role"]"#).unwrap();
    assert_eq!(patterns.len(), 2);
    assert!(patterns[1].covers(&parse_json_pointer("/users/abc/role")));
    assert_eq!(
        serde_json::to_string(&patterns[0]).unwrap(),
        r#""/secret""#
    );
}
