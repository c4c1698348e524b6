use std::collections::HashSet;

use facet::Facet;
use facet_deepcopy::{
    ConvertErrorKind, Options, field_keys, field_values, get_field, non_zero_fields, set_field,
    zero_fields,
};
use serde_json::json;

#[derive(Facet, Debug, PartialEq)]
struct Owner {
    #[facet(json = "owner_id")]
    owner_id: u32,
}

#[allow(non_snake_case)]
#[derive(Facet, Debug, PartialEq)]
struct Repo {
    #[facet(json = "repo_name")]
    name: String,
    #[facet(json = "stars,omitempty")]
    stars: u32,
    Topics: Vec<String>,
    license: Option<String>,
    #[facet(json = "-")]
    token: String,
    #[facet(flatten)]
    owner: Owner,
}

fn repo() -> Repo {
    Repo {
        name: "deepcopy".into(),
        stars: 0,
        Topics: vec!["reflection".into()],
        license: None,
        token: "t0k".into(),
        owner: Owner { owner_id: 42 },
    }
}

#[test]
fn get_field_by_any_name() {
    let repo = repo();
    let options = Options::default();

    assert_eq!(get_field(&repo, "name", &options).unwrap(), Some(json!("deepcopy")));
    assert_eq!(get_field(&repo, "repo_name", &options).unwrap(), Some(json!("deepcopy")));
    assert_eq!(get_field(&repo, "topics", &options).unwrap(), Some(json!(["reflection"])));
    assert_eq!(get_field(&repo, "license", &options).unwrap(), Some(json!(null)));
    assert_eq!(get_field(&repo, "owner_id", &options).unwrap(), Some(json!(42)));
    assert_eq!(get_field(&repo, "missing", &options).unwrap(), None);
}

#[test]
fn set_field_touches_one_field() {
    let mut repo = repo();
    let options = Options::default();

    assert!(set_field(&mut repo, "stars", &json!("12"), &options).unwrap());
    assert!(set_field(&mut repo, "repo_name", &json!("copier"), &options).unwrap());
    assert!(set_field(&mut repo, "owner_id", &json!(7), &options).unwrap());
    assert!(set_field(&mut repo, "license", &json!("MIT"), &options).unwrap());

    assert_eq!(
        repo,
        Repo {
            name: "copier".into(),
            stars: 12,
            Topics: vec!["reflection".into()],
            license: Some("MIT".into()),
            token: "t0k".into(),
            owner: Owner { owner_id: 7 },
        }
    );
}

#[test]
fn set_field_keeps_values_without_a_tree_form() {
    #[derive(Facet, Debug, PartialEq)]
    struct Ticket {
        serial: u128,
        code: [u8; 4],
        watchers: HashSet<String>,
        name: String,
    }

    let mut ticket = Ticket {
        serial: u128::MAX,
        code: [1, 2, 3, 4],
        watchers: HashSet::from(["ada".to_string()]),
        name: "a".into(),
    };
    assert!(set_field(&mut ticket, "name", &json!("b"), &Options::default()).unwrap());
    assert_eq!(
        ticket,
        Ticket {
            serial: u128::MAX,
            code: [1, 2, 3, 4],
            watchers: HashSet::from(["ada".to_string()]),
            name: "b".into(),
        }
    );
}

#[test]
fn omit_empty_sees_through_boxes() {
    #[derive(Facet, Debug, PartialEq)]
    struct Inner {
        x: u8,
    }

    #[derive(Facet, Debug, PartialEq)]
    struct Outer {
        #[facet(json = "in,omitempty")]
        inner: Box<Inner>,
        #[facet(json = "n,omitempty")]
        count: Box<u8>,
        y: u8,
    }

    let outer = Outer {
        inner: Box::new(Inner { x: 0 }),
        count: Box::new(0),
        y: 1,
    };
    assert_eq!(
        field_values(&outer, &Options::default()).unwrap(),
        vec![json!({ "x": 0 }), json!(1)]
    );
}

#[test]
fn set_field_without_match_leaves_target() {
    let mut repo = repo();
    let matched = set_field(&mut repo, "nope", &json!(1), &Options::default()).unwrap();
    assert!(!matched);
    assert_eq!(repo, self::repo());
}

#[test]
fn listing_fields() {
    let repo = repo();
    let options = Options::default();

    assert_eq!(
        field_keys(&repo, &options).unwrap(),
        vec!["repo_name", "stars", "topics", "license", "owner_id"]
    );
    assert_eq!(
        field_values(&repo, &options).unwrap(),
        vec![json!("deepcopy"), json!(["reflection"]), json!(null), json!(42)]
    );
    assert_eq!(
        zero_fields(&repo, &options).unwrap(),
        vec!["stars", "license"]
    );
    assert_eq!(
        non_zero_fields(&repo).unwrap(),
        vec!["name", "Topics", "token", "owner_id"]
    );
}

#[test]
fn accessors_need_a_record() {
    let err = get_field(&vec![1u8], "len", &Options::default()).unwrap_err();
    assert!(matches!(err.kind(), ConvertErrorKind::NotARecord(_)));
}
