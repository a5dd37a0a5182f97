use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

pub const PARCELS: &str = "parcels";
pub const PAYMENTS: &str = "payments";
pub const USERS: &str = "users";
pub const TRACKING: &str = "tracking";

/// Process-wide store handle. Cloning is cheap: the driver pools connections
/// internally and every clone shares the pool.
#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
    use_transactions: bool,
}

impl MongoDB {
    /// Connect, ping and make sure the indexes exist
    pub async fn new(uri: &str, db_name: &str, use_transactions: bool) -> Result<Self, mongodb::error::Error> {
        let mongodb = Self::lazy(uri, db_name, use_transactions).await?;

        mongodb.ping().await?;
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Build the handle without touching the server. The driver connects on
    /// first use.
    pub async fn lazy(uri: &str, db_name: &str, use_transactions: bool) -> Result<Self, mongodb::error::Error> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.app_name = Some("parcel-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        Ok(Self { client, db, use_transactions })
    }

    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Creates the indexes the queries rely on. Failures are logged, not fatal.
    async fn ensure_indexes(&self) {
        log::info!("🔧 Creating database indexes...");

        let users_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match self.users().create_index(users_email).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::warn!("   ⚠️  Could not create users(email) index: {}", e),
        }

        let parcels_owner = IndexModel::builder()
            .keys(doc! { "created_by": 1, "createdAt": -1 })
            .build();
        match self.parcels().create_index(parcels_owner).await {
            Ok(_) => log::info!("   ✅ Index created: parcels(created_by, createdAt)"),
            Err(e) => log::debug!("   ℹ️  parcels index not created: {}", e),
        }

        let payments_owner = IndexModel::builder()
            .keys(doc! { "email": 1, "paid_At": -1 })
            .build();
        match self.payments().create_index(payments_owner).await {
            Ok(_) => log::info!("   ✅ Index created: payments(email, paid_At)"),
            Err(e) => log::debug!("   ℹ️  payments index not created: {}", e),
        }

        let tracking_id = IndexModel::builder()
            .keys(doc! { "tracking_id": 1 })
            .build();
        match self.tracking().create_index(tracking_id).await {
            Ok(_) => log::info!("   ✅ Index created: tracking(tracking_id)"),
            Err(e) => log::debug!("   ℹ️  tracking index not created: {}", e),
        }

        log::info!("✅ Database indexes ready");
    }

    pub fn parcels(&self) -> Collection<Document> {
        self.db.collection(PARCELS)
    }

    pub fn payments(&self) -> Collection<Document> {
        self.db.collection(PAYMENTS)
    }

    pub fn users(&self) -> Collection<Document> {
        self.db.collection(USERS)
    }

    pub fn tracking(&self) -> Collection<Document> {
        self.db.collection(TRACKING)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn use_transactions(&self) -> bool {
        self.use_transactions
    }
}
