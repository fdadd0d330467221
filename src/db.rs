use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::Error;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

pub async fn init_db(uri: &str) -> Result<Client, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("ConnectO".to_string());
    Client::with_options(client_options)
}

/// Round-trips a `ping` to the server.
pub async fn ping(db: &Database) -> Result<(), Error> {
    db.run_command(doc! { "ping": 1 }, None).await.map(|_| ())
}

fn index(keys: Document, unique: bool) -> IndexModel {
    let options = IndexOptions::builder().unique(unique).build();
    IndexModel::builder().keys(keys).options(options).build()
}

/// Creates the indexes the query paths rely on. Safe to run repeatedly.
pub async fn ensure_indexes(db: &Database) -> Result<(), Error> {
    let plan: Vec<(&str, Vec<IndexModel>)> = vec![
        ("users", vec![index(doc! { "email": 1 }, true)]),
        (
            "messages",
            vec![
                index(doc! { "conversation": 1, "createdAt": 1 }, false),
                index(doc! { "receiver": 1, "isRead": 1 }, false),
            ],
        ),
        (
            "conversations",
            vec![index(doc! { "participants": 1, "lastMessageAt": -1 }, false)],
        ),
        (
            "jobs",
            vec![
                index(doc! { "client": 1, "createdAt": -1 }, false),
                index(doc! { "status": 1, "category": 1 }, false),
            ],
        ),
        (
            "proposals",
            vec![index(doc! { "job": 1, "provider": 1 }, false)],
        ),
        (
            "orders",
            vec![
                index(doc! { "client": 1, "status": 1 }, false),
                index(doc! { "provider": 1, "status": 1 }, false),
                index(doc! { "job": 1 }, false),
            ],
        ),
        ("wallets", vec![index(doc! { "user": 1 }, true)]),
        (
            "transactions",
            vec![index(doc! { "user": 1, "createdAt": -1 }, false)],
        ),
        (
            "community_posts",
            vec![index(doc! { "isApproved": 1, "createdAt": -1 }, false)],
        ),
        (
            "notifications",
            vec![index(doc! { "user": 1, "createdAt": -1 }, false)],
        ),
    ];

    for (collection, indexes) in plan {
        db.collection::<Document>(collection)
            .create_indexes(indexes, None)
            .await?;
        log::debug!("indexes ensured on {}", collection);
    }
    Ok(())
}

/// Drops every `2dsphere` index on `jobs`. Old deployments carried one on
/// `location` which rejects documents without coordinates.
pub async fn drop_geo_indexes(db: &Database, dry_run: bool) -> Result<Vec<String>, Error> {
    let jobs = db.collection::<Document>("jobs");
    let indexes: Vec<IndexModel> = jobs.list_indexes(None).await?.try_collect().await?;

    let mut dropped = Vec::new();
    for model in indexes {
        let is_geo = model
            .keys
            .values()
            .any(|v| v.as_str() == Some("2dsphere"));
        let name = model.options.as_ref().and_then(|o| o.name.clone());
        if let (true, Some(name)) = (is_geo, name) {
            if !dry_run {
                jobs.drop_index(name.as_str(), None).await?;
            }
            dropped.push(name);
        }
    }
    Ok(dropped)
}
