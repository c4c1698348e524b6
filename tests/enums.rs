use facet::Facet;
use facet_deepcopy::{Options, from_value, to_value};
use serde_json::json;

#[derive(Facet, Debug, Clone, PartialEq, Default)]
#[repr(u8)]
#[allow(dead_code)]
enum Shape {
    #[default]
    Empty,
    Circle(f64),
    Rect {
        #[facet(json = "w")]
        width: u32,
        #[facet(json = "h")]
        height: u32,
    },
}

#[derive(Facet, Debug, PartialEq)]
struct Drawing {
    name: String,
    shapes: Vec<Shape>,
    focus: Shape,
}

#[test]
fn variants_round_trip() {
    let drawing = Drawing {
        name: "sketch".into(),
        shapes: vec![
            Shape::Empty,
            Shape::Circle(1.5),
            Shape::Rect {
                width: 3,
                height: 4,
            },
        ],
        focus: Shape::Circle(2.0),
    };
    let options = Options::default();

    let value = to_value(&drawing, &options).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "sketch",
            "shapes": ["Empty", { "Circle": 1.5 }, { "Rect": { "w": 3, "h": 4 } }],
            "focus": { "Circle": 2.0 },
        })
    );

    let decoded: Drawing = from_value(&value, &options).unwrap();
    assert_eq!(decoded, drawing);
}

#[test]
fn loose_variant_payloads() {
    let decoded: Drawing = from_value(
        &json!({
            "shapes": [
                { "Circle": "0.25" },
                { "Rect": { "w": "7" } },
                { "Rect": 5 },
            ],
            "focus": "Empty",
        }),
        &Options::default(),
    )
    .unwrap();
    assert_eq!(
        decoded.shapes,
        vec![
            Shape::Circle(0.25),
            Shape::Rect {
                width: 7,
                height: 0
            },
            Shape::Rect {
                width: 0,
                height: 0
            },
        ]
    );
    assert_eq!(decoded.focus, Shape::Empty);
}

#[test]
fn unknown_variants_default() {
    let decoded: Drawing = from_value(
        &json!({
            "shapes": ["Triangle", { "Hexagon": {} }, "Circle", 3, { "Circle": 1, "Rect": {} }],
            "focus": { "Nope": 1 },
        }),
        &Options::default(),
    )
    .unwrap();
    assert_eq!(decoded.shapes, vec![Shape::Empty; 5]);
    assert_eq!(decoded.focus, Shape::Empty);
}
