use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "usage: migration [up|down|fresh|status]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let db_url = std::env::var("EXPENSA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite:./expensa.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match command.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, Some(1)).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        other => return Err(format!("unknown command {other:?}; {USAGE}").into()),
    }

    Ok(())
}
