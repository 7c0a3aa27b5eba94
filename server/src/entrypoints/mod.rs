use rocket::fairing::AdHoc;

pub mod types;
pub mod users;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.attach(users::stage())
    })
}
