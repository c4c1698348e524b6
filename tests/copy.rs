use std::collections::HashSet;

use facet::Facet;
use facet_deepcopy::{ConvertErrorKind, CopyStats, Options, copy_struct};

#[allow(non_snake_case)]
#[derive(Facet, Debug, PartialEq)]
struct WideSource {
    Num: i64,
}

#[allow(non_snake_case)]
#[derive(Facet, Debug, PartialEq)]
struct NarrowTarget {
    Num: i32,
}

#[test]
fn wider_integer_into_narrower() {
    let mut dst = NarrowTarget { Num: 0 };
    let stats = copy_struct(&mut dst, &WideSource { Num: 123 }, &Options::default()).unwrap();
    assert_eq!(dst.Num, 123);
    assert_eq!(stats, CopyStats { hit: 1, miss: 0 });
}

#[derive(Facet, Debug, PartialEq)]
struct Address {
    city: String,
    zip: u32,
}

#[derive(Facet, Debug, PartialEq)]
struct Source {
    id: i64,
    count: i32,
    ratio: f64,
    name: String,
    active: bool,
    tags: Vec<i32>,
    scores: Vec<i32>,
    nickname: Option<String>,
    address: Address,
}

#[derive(Facet, Debug, PartialEq)]
struct Target {
    id: i16,
    count: u32,
    ratio: f32,
    name: String,
    active: bool,
    tags: Vec<i32>,
    scores: Vec<i64>,
    nickname: String,
    address: Address,
    extra: u8,
}

fn source() -> Source {
    Source {
        id: 9,
        count: 5,
        ratio: 0.5,
        name: "ada".into(),
        active: true,
        tags: vec![1, 2],
        scores: vec![10],
        nickname: None,
        address: Address {
            city: "Paris".into(),
            zip: 75001,
        },
    }
}

fn target() -> Target {
    Target {
        id: 0,
        count: 77,
        ratio: 0.0,
        name: String::new(),
        active: false,
        tags: vec![],
        scores: vec![3],
        nickname: "keep".into(),
        address: Address {
            city: String::new(),
            zip: 0,
        },
        extra: 8,
    }
}

#[test]
fn compatible_fields_copy_others_stay() {
    let mut dst = target();
    let stats = copy_struct(&mut dst, &source(), &Options::default()).unwrap();

    assert_eq!(
        dst,
        Target {
            id: 9,
            count: 77,
            ratio: 0.5,
            name: "ada".into(),
            active: true,
            tags: vec![1, 2],
            scores: vec![3],
            nickname: "keep".into(),
            address: Address {
                city: "Paris".into(),
                zip: 75001,
            },
            extra: 8,
        }
    );
    // count: signedness differs; scores: element types differ;
    // nickname: None in the source; extra: absent from the source.
    assert_eq!(stats, CopyStats { hit: 7, miss: 4 });
}

#[test]
fn unmatched_fields_keep_values_without_a_tree_form() {
    #[derive(Facet, Debug, PartialEq)]
    struct Badge {
        serial: u128,
        code: [u8; 4],
        holders: HashSet<String>,
        name: String,
        level: Level,
    }

    #[derive(Facet, Debug, PartialEq)]
    struct Level {
        rank: u8,
        history: [u16; 2],
    }

    #[derive(Facet)]
    struct Rename {
        name: String,
        serial: i64,
        level: RankOnly,
    }

    #[derive(Facet)]
    struct RankOnly {
        rank: u8,
    }

    let mut badge = Badge {
        serial: u128::MAX,
        code: [1, 2, 3, 4],
        holders: HashSet::from(["ada".to_string()]),
        name: "a".into(),
        level: Level {
            rank: 1,
            history: [7, 8],
        },
    };
    let src = Rename {
        name: "z".into(),
        serial: 5,
        level: RankOnly { rank: 3 },
    };
    let stats = copy_struct(&mut badge, &src, &Options::default()).unwrap();

    assert_eq!(
        badge,
        Badge {
            serial: u128::MAX,
            code: [1, 2, 3, 4],
            holders: HashSet::from(["ada".to_string()]),
            name: "z".into(),
            level: Level {
                rank: 3,
                history: [7, 8],
            },
        }
    );
    // serial: signedness differs; code, holders and history: not in the source.
    assert_eq!(stats, CopyStats { hit: 2, miss: 4 });
}

#[test]
fn some_copies_into_plain_field() {
    #[derive(Facet)]
    struct WithNick {
        nickname: Option<String>,
    }
    #[derive(Facet)]
    struct Plain {
        nickname: String,
    }

    let mut dst = Plain {
        nickname: String::new(),
    };
    let src = WithNick {
        nickname: Some("bo".into()),
    };
    let stats = copy_struct(&mut dst, &src, &Options::default()).unwrap();
    assert_eq!(dst.nickname, "bo");
    assert_eq!(stats.hit, 1);
}

#[test]
fn options_do_not_change_matching() {
    let mut dst = target();
    let options = Options::default().exclude(["name", "ratio"]).omit_empty(true);
    let stats = copy_struct(&mut dst, &source(), &options).unwrap();
    assert_eq!(dst.name, "ada");
    assert_eq!(stats, CopyStats { hit: 7, miss: 4 });
}

#[test]
fn copy_needs_records() {
    let mut dst = target();
    let err = copy_struct(&mut dst, &vec![1], &Options::default()).unwrap_err();
    assert!(matches!(err.kind(), ConvertErrorKind::NotARecord(_)));
    assert_eq!(dst, target());
}
