use opensourcehire_server::{
    db::DB,
    sync::{run_sync, SyncContext, SyncError, SyncOptions},
};
use rocket::{http::Status, serde::json::Json, State};

use super::types::{SyncRequest, SyncResponse};

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Run a full GitHub sync for the identity", body = SyncResponse),
    (status = 401, description = "No usable GitHub credential"),
    (status = 409, description = "A sync for this identity is already in flight")
))]
#[post("/<identity>/sync", data = "<request>")]
async fn sync_user(
    identity: &str,
    request: Json<SyncRequest>,
    db: &State<DB>,
    context: &State<SyncContext>,
) -> Result<Json<SyncResponse>, Status> {
    let Some(_permit) = context.guard.acquire(identity) else {
        rocket::info!("sync already in flight for {identity}, coalescing to a no-op");
        return Err(Status::Conflict);
    };

    let result = run_sync(
        db,
        context,
        SyncOptions {
            identity,
            access_token: request.access_token.as_deref(),
            fallback_name: request.fallback_name.as_deref(),
            fallback_email: request.fallback_email.as_deref(),
        },
    )
    .await;

    match result {
        Ok(summary) => Ok(Json(summary.into())),
        Err(SyncError::NoCredential(_)) => Err(Status::Unauthorized),
        Err(e) => {
            rocket::error!("sync failed for {identity}: {e:#}");
            Err(Status::InternalServerError)
        }
    }
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Last synthesized dashboard document")
))]
#[get("/<identity>/dashboard")]
async fn get_dashboard(identity: &str, db: &State<DB>) -> Option<Json<serde_json::Value>> {
    get_document(identity, "dashboard", db).await
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Last synthesized profile document")
))]
#[get("/<identity>/profile")]
async fn get_profile(identity: &str, db: &State<DB>) -> Option<Json<serde_json::Value>> {
    get_document(identity, "profile", db).await
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "GitHub identity summary")
))]
#[get("/<identity>/github")]
async fn get_github(identity: &str, db: &State<DB>) -> Option<Json<serde_json::Value>> {
    get_document(identity, "github", db).await
}

async fn get_document(
    identity: &str,
    collection: &str,
    db: &State<DB>,
) -> Option<Json<serde_json::Value>> {
    match db.get_document(identity, collection).await {
        Ok(doc) => doc.map(Json),
        Err(e) => {
            rocket::error!("failed to read {collection} document for {identity}: {e:#}");
            None
        }
    }
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing user entrypoints", |rocket| async {
        rocket.mount(
            "/api/users/",
            rocket::routes![sync_user, get_dashboard, get_profile, get_github],
        )
    })
}
