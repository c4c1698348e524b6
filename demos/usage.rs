//! Walk through decoding, encoding and copying a small record.
//!
//! Run with: cargo run --example usage

use chrono::{DateTime, Utc};
use facet::Facet;
use facet_deepcopy::{Naming, Options, TimeRepr, copy_struct, from_str, to_value};

#[derive(Facet, Debug, Default)]
struct Audit {
    #[facet(json = "created_at")]
    created: DateTime<Utc>,
    #[facet(json = "created_by,omitempty")]
    creator: String,
}

#[derive(Facet, Debug)]
struct Order {
    #[facet(json = "order_id")]
    id: u64,
    #[facet(gorm = "column:total_cents")]
    total: i64,
    #[facet(xorm = "varchar(32) 'customer'")]
    customer_name: String,
    tags: Vec<String>,
    #[facet(flatten)]
    audit: Audit,
}

#[derive(Facet, Debug)]
struct OrderSummary {
    id: u32,
    total: i32,
    customer_name: String,
    tags: Vec<String>,
}

fn main() {
    let input = r#"{
        "order_id": "1042",
        "total_cents": 1999.0,
        "customer": "Ada",
        "tags": ["rush", "gift"],
        "created_at": "2024-03-01 09:30:00"
    }"#;

    let order: Order = from_str(input, &Options::default()).expect("decode");
    println!("decoded: {order:#?}");

    let cascade = to_value(&order, &Options::default().omit_empty(true)).expect("encode");
    println!("cascade keys: {cascade:#}");

    let declared = to_value(
        &order,
        &Options::default()
            .naming(Naming::Declared)
            .time_repr(TimeRepr::Numeric),
    )
    .expect("encode");
    println!("declared keys: {declared:#}");

    let mut summary = OrderSummary {
        id: 0,
        total: 0,
        customer_name: String::new(),
        tags: Vec::new(),
    };
    let stats = copy_struct(&mut summary, &order, &Options::default()).expect("copy");
    println!("copied {stats:?} into {summary:#?}");
}
