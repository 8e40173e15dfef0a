use jsv_pointer::{
    format_json_pointer, get, parse_json_pointer, parse_uri_fragment_pointer,
    validate_json_pointer, validate_relative_json_pointer, JsonPointer,
};
use serde_json::json;

#[test]
fn pointer_parse_format_roundtrip_matrix() {
    let cases = ["", "/", "/foo", "/foo/bar", "/a~0b/c~1d", "/arr/0", "/~0/~1"];

    for pointer in cases {
        let path = parse_json_pointer(pointer);
        assert_eq!(format_json_pointer(&path), pointer);
        let typed: JsonPointer = pointer.parse().expect("valid pointer");
        assert_eq!(typed.to_string(), pointer);
    }
}

#[test]
fn pointer_get_matrix() {
    let doc = json!({"foo": {"bar": [10, 20, null]}, "": {"": 1}});

    assert_eq!(get(&doc, &parse_json_pointer("/foo/bar/0")), Some(&json!(10)));
    assert_eq!(get(&doc, &parse_json_pointer("/foo/bar/2")), Some(&json!(null)));
    assert_eq!(get(&doc, &parse_json_pointer("/foo/bar/3")), None);
    assert_eq!(get(&doc, &parse_json_pointer("//")), Some(&json!(1)));
}

#[test]
fn pointer_uri_fragment_matrix() {
    let doc = json!({"definitions": {"a b": {"c%d": 7}}});
    let path = parse_uri_fragment_pointer("#/definitions/a%20b/c%25d").expect("fragment");
    assert_eq!(get(&doc, &path), Some(&json!(7)));

    let ptr = JsonPointer::from_tokens(path);
    assert_eq!(ptr.to_uri_fragment(), "#/definitions/a%20b/c%25d");
}

#[test]
fn pointer_validation_matrix() {
    assert!(validate_json_pointer("/foo/bar").is_ok());
    assert!(validate_json_pointer("foo/bar").is_err());
    assert!(validate_relative_json_pointer("0/foo").is_ok());
    assert!(validate_relative_json_pointer("foo").is_err());
}
