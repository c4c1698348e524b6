use facet_deepcopy::coerce::{to_bool, to_f64, to_i64, to_string, to_u64};
use serde_json::json;

#[test]
fn strings() {
    assert_eq!(to_string(&json!(null)), "");
    assert_eq!(to_string(&json!("as is")), "as is");
    assert_eq!(to_string(&json!(true)), "true");
    assert_eq!(to_string(&json!(-3)), "-3");
    assert_eq!(to_string(&json!(2.5)), "2.5");
    assert_eq!(to_string(&json!(100.0)), "100");
    assert_eq!(to_string(&json!(-3.0)), "-3");
    assert_eq!(to_string(&json!(1e21)), "1e21");
    assert_eq!(to_string(&json!([1, "a"])), r#"[1,"a"]"#);
    assert_eq!(to_string(&json!({ "k": 1 })), r#"{"k":1}"#);
}

#[test]
fn integers() {
    assert_eq!(to_i64(&json!("42")), 42);
    assert_eq!(to_i64(&json!("-42")), -42);
    assert_eq!(to_i64(&json!("4.2")), 0);
    assert_eq!(to_i64(&json!("abc")), 0);
    assert_eq!(to_i64(&json!(9.99)), 9);
    assert_eq!(to_i64(&json!(-9.99)), -9);
    assert_eq!(to_i64(&json!(1e30)), i64::MAX);
    assert_eq!(to_i64(&json!(u64::MAX)), -1);
    assert_eq!(to_i64(&json!(true)), 0);
    assert_eq!(to_i64(&json!(null)), 0);
    assert_eq!(to_i64(&json!([1])), 0);
    assert_eq!(to_i64(&json!({ "n": 1 })), 0);

    assert_eq!(to_u64(&json!("17")), 17);
    assert_eq!(to_u64(&json!("-17")), 0);
    assert_eq!(to_u64(&json!(-1)), u64::MAX);
    assert_eq!(to_u64(&json!(-1.5)), 0);
    assert_eq!(to_u64(&json!(u64::MAX)), u64::MAX);
}

#[test]
fn floats() {
    assert_eq!(to_f64(&json!("1.25")), 1.25);
    assert_eq!(to_f64(&json!(3)), 3.0);
    assert_eq!(to_f64(&json!("x")), 0.0);
    assert_eq!(to_f64(&json!(false)), 0.0);
}

#[test]
fn booleans() {
    for yes in ["1", "t", "T", "TRUE", "true", "True"] {
        assert!(to_bool(&json!(yes)), "{yes}");
    }
    for no in ["0", "f", "F", "FALSE", "false", "False", "yes", ""] {
        assert!(!to_bool(&json!(no)), "{no}");
    }
    assert!(to_bool(&json!(1)));
    assert!(to_bool(&json!(0.5)));
    assert!(!to_bool(&json!(0)));
    assert!(!to_bool(&json!(-2)));
    assert!(!to_bool(&json!(null)));
    assert!(!to_bool(&json!([true])));
}
