use json_pilot_expr::{evaluate, ExprError};
use serde_json::{json, Value};

fn eval(source: &str, doc: Value) -> Option<Value> {
    evaluate(source, "data", &doc).unwrap().into_json()
}

#[test]
fn test_identifier_returns_document() {
    assert_eq!(eval("data", json!({"a": 1})), Some(json!({"a": 1})));
}

#[test]
fn test_member_and_index_access() {
    let doc = json!({"a": {"b": [10, 20]}});
    assert_eq!(eval("data.a.b[1]", doc.clone()), Some(json!(20)));
    assert_eq!(eval("data['a']['b'][0]", doc.clone()), Some(json!(10)));
    assert_eq!(eval("data.a.b[-1]", doc), Some(json!(20)));
}

#[test]
fn test_missing_member_is_undefined() {
    assert_eq!(eval("data.missing", json!({"a": 1})), None);
    assert_eq!(eval("data.missing == null", json!({"a": 1})), Some(json!(true)));
}

#[test]
fn test_length_member() {
    assert_eq!(eval("data.length", json!([1, 2, 3])), Some(json!(3)));
    assert_eq!(eval("data.name.length", json!({"name": "abc"})), Some(json!(3)));
}

#[test]
fn test_filter_with_lambda() {
    assert_eq!(eval("data.filter(i => i > 1)", json!([1, 2, 3])), Some(json!([2, 3])));
}

#[test]
fn test_map_with_member_access() {
    let doc = json!([{"n": "a"}, {"n": "b"}]);
    assert_eq!(eval("data.map(i => i.n)", doc), Some(json!(["a", "b"])));
}

#[test]
fn test_callback_receives_index() {
    assert_eq!(
        eval("data.map((v, i) => v + i)", json!([10, 20])),
        Some(json!([10, 21]))
    );
}

#[test]
fn test_find_and_some_and_every() {
    let doc = json!([1, 5, 9]);
    assert_eq!(eval("data.find(i => i > 3)", doc.clone()), Some(json!(5)));
    assert_eq!(eval("data.some(i => i > 8)", doc.clone()), Some(json!(true)));
    assert_eq!(eval("data.every(i => i > 0)", doc.clone()), Some(json!(true)));
    assert_eq!(eval("data.every(i => i > 1)", doc), Some(json!(false)));
}

#[test]
fn test_find_miss_is_undefined() {
    assert_eq!(eval("data.find(i => i > 99)", json!([1])), None);
}

#[test]
fn test_includes_index_of_slice_join() {
    let doc = json!(["a", "b", "c"]);
    assert_eq!(eval("data.includes('b')", doc.clone()), Some(json!(true)));
    assert_eq!(eval("data.indexOf('c')", doc.clone()), Some(json!(2)));
    assert_eq!(eval("data.slice(1)", doc.clone()), Some(json!(["b", "c"])));
    assert_eq!(eval("data.slice(0, -1)", doc.clone()), Some(json!(["a", "b"])));
    assert_eq!(eval("data.join('-')", doc), Some(json!("a-b-c")));
}

#[test]
fn test_concat_reverse_flat() {
    assert_eq!(eval("data.concat([3])", json!([1, 2])), Some(json!([1, 2, 3])));
    assert_eq!(eval("data.reverse()", json!([1, 2])), Some(json!([2, 1])));
    assert_eq!(eval("data.flat()", json!([[1], [2, [3]]])), Some(json!([1, 2, [3]])));
}

#[test]
fn test_object_keys_values() {
    let doc = json!({"z": 1, "a": 2});
    assert_eq!(eval("data.keys()", doc.clone()), Some(json!(["z", "a"])));
    assert_eq!(eval("data.values()", doc), Some(json!([1, 2])));
}

#[test]
fn test_string_methods() {
    let doc = json!({"s": " Hello "});
    assert_eq!(eval("data.s.trim()", doc.clone()), Some(json!("Hello")));
    assert_eq!(eval("data.s.trim().toUpperCase()", doc.clone()), Some(json!("HELLO")));
    assert_eq!(eval("data.s.includes('ell')", doc), Some(json!(true)));
    assert_eq!(eval("data.split(',')", json!("a,b")), Some(json!(["a", "b"])));
}

#[test]
fn test_arithmetic_and_string_concat() {
    assert_eq!(eval("1 + 2 * 3", json!(null)), Some(json!(7)));
    assert_eq!(eval("'n=' + 2", json!(null)), Some(json!("n=2")));
    assert_eq!(eval("10 % 3", json!(null)), Some(json!(1)));
    assert_eq!(eval("-data[0]", json!([5])), Some(json!(-5)));
}

#[test]
fn test_division_by_zero_is_null() {
    // JSON has no Infinity; serializing it would produce null anyway.
    assert_eq!(eval("1 / 0", json!(null)), Some(json!(null)));
}

#[test]
fn test_conditional_and_logic() {
    let doc = json!({"n": 5});
    assert_eq!(eval("data.n > 3 ? 'big' : 'small'", doc.clone()), Some(json!("big")));
    assert_eq!(eval("data.n > 3 && data.n < 10", doc.clone()), Some(json!(true)));
    assert_eq!(eval("data.missing || 'fallback'", doc), Some(json!("fallback")));
}

#[test]
fn test_invoked_lambda_form() {
    // The shape the query engine produces for function-like fragments.
    assert_eq!(
        eval("(i => i.filter(x => x > 1))(data)", json!([1, 2, 3])),
        Some(json!([2, 3]))
    );
}

#[test]
fn test_nested_lambda_scoping() {
    let doc = json!({"min": 2, "items": [1, 2, 3]});
    assert_eq!(
        eval("data.items.filter(i => i >= data.min)", doc),
        Some(json!([2, 3]))
    );
}

#[test]
fn test_unknown_identifier_errors() {
    assert!(matches!(
        evaluate("window", "data", &json!(null)),
        Err(ExprError::UnknownIdentifier(_))
    ));
}

#[test]
fn test_unknown_method_errors() {
    assert!(matches!(
        evaluate("data.eval('x')", "data", &json!([1])),
        Err(ExprError::UnknownMethod(_))
    ));
}

#[test]
fn test_scalar_is_not_callable() {
    assert!(matches!(
        evaluate("data()", "data", &json!(1)),
        Err(ExprError::NotCallable(_))
    ));
}

#[test]
fn test_filter_requires_function_argument() {
    assert!(matches!(
        evaluate("data.filter(1)", "data", &json!([1])),
        Err(ExprError::ArityError(_))
    ));
}
