#[macro_use]
extern crate rocket;

mod entrypoints;

use opensourcehire_server::db;
use opensourcehire_server::sync::{DataSource, SyncContext};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    github_fallback_token: Option<String>,
    data_source: Option<DataSource>,
}

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let source = env.data_source.unwrap_or_default();
    if source == DataSource::Fixture {
        tracing::warn!("running with the fixture data source; no live GitHub calls will be made");
    }

    rocket::build()
        .attach(db::stage())
        .manage(SyncContext::new(env.github_fallback_token, source))
        .attach(entrypoints::stage())
}
