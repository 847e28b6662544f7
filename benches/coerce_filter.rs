use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use json_sift::classify::InferenceOptions;
use json_sift::coerce::coerce;
use json_sift::filter::WhereClause;
use json_sift::query::query_with_schema;
use json_sift::records::RecordCollection;
use json_sift::schema::build_schema;
use serde_json::{Value, json};

fn generate_orders(rows: usize) -> Value {
    let orders: Vec<Value> = (0..rows)
        .map(|i| {
            let status = match i % 3 {
                0 => "shipped",
                1 => "Pending",
                _ => "processing",
            };
            let day = (i % 28) + 1;
            // Every fifth amount arrives as a string, as exports often do.
            let amount = if i % 5 == 0 {
                json!(format!("{}.25", i % 500))
            } else {
                json!((i % 500) as f64 + 0.5)
            };
            json!({
                "Order Id": i,
                "Ordered At": format!("2024-01-{day:02}"),
                "Amount": amount,
                "Status": status,
                "Gift": i % 7 == 0,
            })
        })
        .collect();
    Value::Array(orders)
}

fn bench_coerce_and_filter(c: &mut Criterion) {
    let data = generate_orders(20_000);
    let records = RecordCollection::from_json(&data).expect("orders collection");
    let schema = build_schema(&records);
    let clause = WhereClause::parse(&json!({
        "amount": {"gt": 100},
        "status": {"eq": "pending"},
        "orderId": {"lt": 15_000}
    }))
    .expect("where clause");

    let mut group = c.benchmark_group("orders");

    group.bench_function("build_schema", |b| {
        b.iter(|| build_schema(&records));
    });

    group.bench_function("coerce", |b| {
        b.iter(|| coerce(&records, &schema));
    });

    group.bench_function("query_with_schema", |b| {
        b.iter_batched(
            || (),
            |_| query_with_schema(&records, &schema, &clause).expect("query orders"),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("describe_from_json", |b| {
        b.iter(|| {
            json_sift::query::describe_schema(&data, &InferenceOptions::default())
                .expect("describe orders")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_coerce_and_filter);
criterion_main!(benches);
