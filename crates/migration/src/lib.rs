pub use sea_orm_migration::prelude::*;

mod m20260802_000001_users;
mod m20260802_000002_notes_and_tags;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260802_000001_users::Migration),
            Box::new(m20260802_000002_notes_and_tags::Migration),
        ]
    }
}
