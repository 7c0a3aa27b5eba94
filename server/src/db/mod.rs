use rocket::{
    fairing::{self, AdHoc},
    Build, Rocket,
};
use rocket_db_pools::Database;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

pub mod types;

use types::{DashboardDocument, GithubIdentityDocument, ProfileDocument};

#[derive(Database, Clone, Debug)]
#[database("opensourcehire")]
pub struct DB(PgPool);

impl DB {
    /// Writes the synthesized triple in one transaction: either all three
    /// documents land, or the previously persisted state stays untouched.
    /// Each write is a merge-upsert, so fields absent from the new document
    /// survive from earlier syncs.
    pub async fn upsert_documents(
        &self,
        identity: &str,
        profile: &ProfileDocument,
        dashboard: &DashboardDocument,
        github: &GithubIdentityDocument,
    ) -> anyhow::Result<()> {
        let mut tx = self.0.begin().await?;

        merge_upsert(&mut tx, identity, "profile", profile).await?;
        merge_upsert(&mut tx, identity, "dashboard", dashboard).await?;
        merge_upsert(&mut tx, identity, "github", github).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_document(
        &self,
        identity: &str,
        collection: &str,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        let record: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT doc
            FROM documents
            WHERE identity = $1 AND collection = $2
            "#,
        )
        .bind(identity)
        .bind(collection)
        .fetch_optional(&self.0)
        .await?;

        Ok(record.map(|(doc,)| doc))
    }
}

async fn merge_upsert<T: Serialize>(
    tx: &mut Transaction<'static, Postgres>,
    identity: &str,
    collection: &str,
    document: &T,
) -> anyhow::Result<()> {
    let doc = serde_json::to_value(document)?;

    // JSONB || overlays only the fields the new document mentions.
    sqlx::query(
        r#"
        INSERT INTO documents (identity, collection, doc, synced_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (identity, collection)
        DO UPDATE SET doc = documents.doc || EXCLUDED.doc, synced_at = now()
        "#,
    )
    .bind(identity)
    .bind(collection)
    .bind(doc)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                rocket::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
    })
}
