use chrono::{DateTime, TimeZone, Utc};
use facet::Facet;
use facet_deepcopy::{Options, TimeRepr, from_value, to_value};
use serde_json::json;

#[derive(Facet, Debug, PartialEq)]
struct Event {
    #[facet(json = "at")]
    at: DateTime<Utc>,
    #[facet(json = "seen,omitempty")]
    seen: DateTime<Utc>,
}

fn march_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

#[test]
fn decode_accepted_forms() {
    let options = Options::default();
    let cases = [
        json!("2024-03-01 09:30:00"),
        json!("2024-03-01T09:30:00Z"),
        json!("2024-03-01T11:30:00+02:00"),
        json!(1709285400),
        json!("1709285400"),
    ];
    for case in cases {
        let event: Event = from_value(&json!({ "at": case }), &options).unwrap();
        assert_eq!(event.at, march_first(), "{case}");
    }
}

#[test]
fn unparseable_is_epoch() {
    let event: Event = from_value(
        &json!({ "at": "yesterday", "seen": true }),
        &Options::default(),
    )
    .unwrap();
    assert_eq!(event.at, DateTime::<Utc>::default());
    assert_eq!(event.seen, DateTime::<Utc>::default());
}

#[test]
fn custom_layout() {
    let options = Options::default().time_format("%d/%m/%Y %H:%M");
    let event: Event = from_value(&json!({ "at": "01/03/2024 09:30" }), &options).unwrap();
    assert_eq!(event.at, march_first());

    let value = to_value(&event, &options).unwrap();
    assert_eq!(value["at"], json!("01/03/2024 09:30"));
}

#[test]
fn encode_string_and_numeric() {
    let event = Event {
        at: march_first(),
        seen: DateTime::<Utc>::default(),
    };

    let value = to_value(&event, &Options::default()).unwrap();
    assert_eq!(value, json!({ "at": "2024-03-01 09:30:00" }));

    let value = to_value(&event, &Options::default().time_repr(TimeRepr::Numeric)).unwrap();
    assert_eq!(value, json!({ "at": 1709285400 }));

    let value = to_value(
        &Event {
            at: DateTime::<Utc>::default(),
            seen: march_first(),
        },
        &Options::default().time_repr(TimeRepr::Numeric),
    )
    .unwrap();
    assert_eq!(value, json!({ "at": 0, "seen": 1709285400 }));
}
