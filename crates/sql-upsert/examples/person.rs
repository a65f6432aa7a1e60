//! Builds an upsert for one `Person` and logs the statement and arguments.
//!
//! Run with: `cargo run -p sql-upsert --example person`

use sql_upsert::{Record, UpsertBuilder, UpsertOptions};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Record)]
struct Person {
    #[db("id,primary")]
    id: String,
    #[db("name")]
    name: String,
    #[db("age")]
    age: Option<i32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let builder = UpsertBuilder::<Person>::new();
    let (sql, args) = builder
        .build_upsert(&Person {
            id: String::from("1001"),
            name: String::from("pureugong"),
            age: None,
        })?
        .into_parts();
    info!("{sql}");
    info!("{args:?}");

    let options: UpsertOptions = serde_json::from_str(r#"{ "duplicate_policy": "skip" }"#)?;
    let builder = UpsertBuilder::<Person>::with_options(options)?;
    let batch = vec![
        Person {
            id: String::from("1001"),
            name: String::from("Tom"),
            age: Some(3),
        },
        Person {
            id: String::from("1001"),
            name: String::from("Tom"),
            age: Some(4),
        },
    ];
    let upsert = builder.build_upsert(&batch)?;
    info!(rows = upsert.args.len() / builder.columns().len(), "{}", upsert.sql);

    Ok(())
}
