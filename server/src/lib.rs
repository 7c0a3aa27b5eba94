pub mod collect;
pub mod db;
pub mod fixture;
pub mod github;
pub mod sync;
pub mod token;
