use clap::Parser;
use engine::{LocalBlobStore, users};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue};
use server::{ServerOptions, ServerState};
use settings::{AddUserArgs, Cli, Command, Database, Settings};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expensa={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    match cli.command {
        Some(Command::AddUser(args)) => add_user(&db, args).await,
        Some(Command::Serve) | None => serve(settings, db).await,
    }
}

async fn serve(
    settings: Settings,
    db: sea_orm::DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if settings.server.database == Database::Memory {
        tracing::warn!("using an in-memory database, expenses are lost on exit");
    }

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;
    let blobs = LocalBlobStore::new(settings.storage.root.clone(), &settings.public_base_url());
    tracing::info!("storing attachments under {}", blobs.root().display());

    let options = ServerOptions {
        page_size: settings.display.page_size,
        page_siblings: settings.display.page_siblings,
    };
    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(ServerState::new(engine, db, blobs, options), listener).await?;
    Ok(())
}

async fn add_user(
    db: &sea_orm::DatabaseConnection,
    args: AddUserArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let username = users::validate_username(&args.username)?;
    if args.password.is_empty() {
        return Err("password must not be empty".into());
    }

    users::ActiveModel {
        username: ActiveValue::Set(username.to_string()),
        password: ActiveValue::Set(args.password),
    }
    .insert(db)
    .await?;

    tracing::info!("created user {username}");
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
