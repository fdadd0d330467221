//! Maintenance tasks run against the configured database.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use mongodb::bson::doc;

use connecto::config::Config;
use connecto::db;
use connecto::error::{AppError, AppResult};
use connecto::models::user::{Role, UserModel, Verification, VerificationStatus};
use connecto::models::{new_id, timestamp};
use connecto::services::{auth_service, verification_service};
use connecto::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates an admin account, or promotes the existing account with that email.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Admin User")]
        name: String,
    },
    /// Drops stale geospatial indexes on jobs and ensures the application indexes.
    FixIndexes {
        #[arg(long)]
        dry_run: bool,
    },
    /// Approves every pending verification request.
    ApproveVerifications {
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args.command).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> AppResult<()> {
    let config = Config::from_env()?;
    let client = db::init_db(&config.mongo_uri).await?;
    let database = client.database(&config.mongo_db_name);
    db::ping(&database).await?;
    let state = AppState::new(database, config);

    match command {
        Command::CreateAdmin {
            email,
            password,
            name,
        } => create_admin(&state, &email, &password, &name).await,
        Command::FixIndexes { dry_run } => fix_indexes(&state, dry_run).await,
        Command::ApproveVerifications { dry_run } => approve_verifications(&state, dry_run).await,
    }
}

async fn create_admin(state: &AppState, email: &str, password: &str, name: &str) -> AppResult<()> {
    if let Some(existing) = auth_service::get_user(&state.users_collection, email).await? {
        if existing.role == Role::Admin {
            log::info!("{} is already an admin", existing.email);
        } else {
            state
                .users_collection
                .update_one(
                    doc! { "_id": existing.id.as_str() },
                    doc! { "$set": {
                        "role": Role::Admin.as_str(),
                        "updatedAt": timestamp::format(&timestamp::now()),
                    } },
                    None,
                )
                .await?;
            log::info!("promoted {} to admin", existing.email);
        }
        return Ok(());
    }

    let hashed_password = auth_service::get_password_hash(password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    let now = timestamp::now();
    let admin = UserModel {
        id: new_id(),
        full_name: name.to_string(),
        email: email.trim().to_lowercase(),
        hashed_password,
        role: Role::Admin,
        phone: None,
        city: None,
        area: None,
        profile_picture: None,
        verification: Verification {
            status: VerificationStatus::Verified,
            verified_at: Some(now),
            ..Default::default()
        },
        email_verified: true,
        verification_code: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.users_collection.insert_one(&admin, None).await?;
    log::info!("created admin {} ({})", admin.email, admin.id);
    Ok(())
}

async fn fix_indexes(state: &AppState, dry_run: bool) -> AppResult<()> {
    let dropped = db::drop_geo_indexes(&state.db, dry_run).await?;
    if dropped.is_empty() {
        log::info!("no geospatial indexes on jobs");
    }
    for name in &dropped {
        log::info!("{} index {}", if dry_run { "would drop" } else { "dropped" }, name);
    }
    if !dry_run {
        db::ensure_indexes(&state.db).await?;
        log::info!("application indexes ensured");
    }
    Ok(())
}

async fn approve_verifications(state: &AppState, dry_run: bool) -> AppResult<()> {
    let pending = verification_service::list_by_status(state, VerificationStatus::Pending).await?;
    log::info!("{} pending verification request(s)", pending.len());

    for user in pending {
        if dry_run {
            log::info!("would approve {} <{}>", user.full_name, user.email);
            continue;
        }
        match verification_service::approve(state, &user.id).await {
            Ok(user) => log::info!("approved {} <{}>", user.full_name, user.email),
            Err(e) => log::warn!("could not approve {}: {}", user.email, e),
        }
    }
    Ok(())
}
