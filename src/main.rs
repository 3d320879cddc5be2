use std::{collections::HashMap, env::vars};

use log::info;

use sticker_records::{DataStore, StoreError};

#[tokio::main]
async fn main() -> Result<(), StoreError> {
    pretty_env_logger::init();
    info!("Preparing sticker records database");

    // get db url from environment
    let db_url = vars()
        .collect::<HashMap<_, _>>()
        .get("DB_URL")
        .expect("DB_URL to be set")
        .clone();

    // connecting creates both tables if they are missing
    let _store = DataStore::connect(db_url).await?;
    info!("Schema is ready");

    Ok(())
}
