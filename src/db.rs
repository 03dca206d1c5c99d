use anyhow::{Context, Result};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{
    Client, Collection, Database as MongoDatabase, IndexModel,
    bson::{Document, doc, oid::ObjectId, to_document},
};
use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::{CONFIG, DefaultAdmin};
use crate::data_models::{
    Admin, Applicant, ApplicantStatus, ContactMessage, Internship, SiteSettings,
};

/// Global database instance
static DB: OnceCell<Database> = OnceCell::new();

/// Collection names as constants for consistency
pub mod collections {
    pub const ADMINS: &str = "admins";
    pub const INTERNSHIPS: &str = "internships";
    pub const APPLICANTS: &str = "applicants";
    pub const SITE_SETTINGS: &str = "site_settings";
    pub const CONTACT_MESSAGES: &str = "contact_messages";
}

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Create a new Database instance with custom URI and database name.
    /// Useful for testing with a different database.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let database = Self::connect_lazy(uri, db_name).await?;

        // Ping the database to verify connection
        database
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        Ok(database)
    }

    /// Build a client without touching the server. The driver connects on first use.
    pub async fn connect_lazy(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Create a Database instance using environment configuration
    pub async fn from_config() -> Result<Self> {
        Self::new(&CONFIG.mongo_uri, &CONFIG.mongo_db_name).await
    }

    /// Initialize the global database instance.
    /// Call this once at application startup.
    pub async fn init_global() -> Result<&'static Database> {
        let db = Self::from_config().await?;
        DB.set(db)
            .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
        DB.get()
            .ok_or_else(|| anyhow::anyhow!("Database missing right after initialization"))
    }

    /// Get a typed collection by name
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    /// Get the underlying MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn internships(&self) -> Collection<Internship> {
        self.collection(collections::INTERNSHIPS)
    }

    pub fn applicants(&self) -> Collection<Applicant> {
        self.collection(collections::APPLICANTS)
    }

    pub fn admins(&self) -> Collection<Admin> {
        self.collection(collections::ADMINS)
    }

    pub fn site_settings(&self) -> Collection<SiteSettings> {
        self.collection(collections::SITE_SETTINGS)
    }

    pub fn contact_messages(&self) -> Collection<ContactMessage> {
        self.collection(collections::CONTACT_MESSAGES)
    }

    /// Create unique indexes and seed the default admin and site settings.
    /// Safe to run repeatedly.
    pub async fn init_defaults(&self, default_admin: &DefaultAdmin) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();
        self.internships()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "slug": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .context("Failed to create internship slug index")?;
        self.admins()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique)
                    .build(),
            )
            .await
            .context("Failed to create admin username index")?;

        let admins = AdminRepo::new(self);
        if admins.count().await? == 0 {
            let admin = Admin::new(
                default_admin.username.clone(),
                crate::auth::hash_password(&default_admin.password)?,
                default_admin.email.clone(),
            );
            admins.insert(&admin).await?;
            log::info!("Created default admin {}", admin.username);
        }

        SiteSettingsRepo::new(self).get_or_create().await?;
        log::info!("Database initialized successfully");
        Ok(())
    }
}

// =============================================================================
// Pagination
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
            pages: total.div_ceil(per_page.max(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// Pages are 1-based; anything lower is treated as the first page.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.max(1).saturating_sub(1).saturating_mul(per_page)
}

// =============================================================================
// Generic CRUD operations
// =============================================================================

/// Generic repository for common CRUD operations.
pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    /// Insert a single document
    pub async fn insert(&self, doc: &T) -> Result<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .context("Failed to insert document")?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Failed to get inserted ObjectId"))
    }

    /// Find a document by ObjectId
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>> {
        let filter = doc! { "_id": id };
        self.collection
            .find_one(filter)
            .await
            .context("Failed to find document by id")
    }

    /// Find a single document matching a filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.collection
            .find_one(filter)
            .await
            .context("Failed to find document")
    }

    /// Find all documents matching a filter, in natural (insertion) order
    pub async fn find(&self, filter: Document) -> Result<Vec<T>> {
        self.find_with(filter, None).await
    }

    pub async fn find_with(&self, filter: Document, options: Option<FindOptions>) -> Result<Vec<T>> {
        use futures::TryStreamExt;

        let cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .context("Failed to execute find query")?;

        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }

    /// Find all documents in the collection
    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.find(doc! {}).await
    }

    /// Newest-first listing capped at `limit`, sorted on `field`
    pub async fn find_latest(&self, filter: Document, field: &str, limit: i64) -> Result<Vec<T>> {
        let options = FindOptions::builder()
            .sort(doc! { field: -1 })
            .limit(limit)
            .build();
        self.find_with(filter, Some(options)).await
    }

    /// One page of documents matching `filter`, sorted by `sort`
    pub async fn find_page(
        &self,
        filter: Document,
        sort: Document,
        page: u64,
        per_page: u64,
    ) -> Result<Paginated<T>> {
        let page = page.max(1);
        let total = self.count(filter.clone()).await?;
        let options = FindOptions::builder()
            .sort(sort)
            .skip(page_offset(page, per_page))
            .limit(per_page as i64)
            .build();
        let items = self.find_with(filter, Some(options)).await?;
        Ok(Paginated::new(items, page, per_page, total))
    }

    /// Update a document by ObjectId
    pub async fn update_by_id(&self, id: ObjectId, update: Document) -> Result<bool> {
        let filter = doc! { "_id": id };
        let result = self
            .collection
            .update_one(filter, doc! { "$set": update })
            .await
            .context("Failed to update document")?;

        Ok(result.matched_count > 0)
    }

    /// Delete a document by ObjectId
    pub async fn delete_by_id(&self, id: ObjectId) -> Result<bool> {
        let filter = doc! { "_id": id };
        let result = self
            .collection
            .delete_one(filter)
            .await
            .context("Failed to delete document")?;

        Ok(result.deleted_count > 0)
    }

    /// Delete multiple documents matching a filter
    pub async fn delete_many(&self, filter: Document) -> Result<u64> {
        let result = self
            .collection
            .delete_many(filter)
            .await
            .context("Failed to delete documents")?;

        Ok(result.deleted_count)
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.collection
            .count_documents(filter)
            .await
            .context("Failed to count documents")
    }

    /// Check if a document exists
    pub async fn exists(&self, filter: Document) -> Result<bool> {
        Ok(self.count(filter).await? > 0)
    }
}

// =============================================================================
// Internships
// =============================================================================

pub struct InternshipRepo {
    repo: Repository<Internship>,
    applicants: Repository<Applicant>,
}

impl InternshipRepo {
    pub const PUBLIC_PER_PAGE: u64 = 9;
    pub const ADMIN_PER_PAGE: u64 = 10;

    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.internships()),
            applicants: Repository::new(db.applicants()),
        }
    }

    pub async fn insert(&self, internship: &Internship) -> Result<ObjectId> {
        self.repo.insert(internship).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Internship>> {
        self.repo.find_by_id(id).await
    }

    /// Find by slug, optionally only among postings still open to the public
    pub async fn find_by_slug(&self, slug: &str, active_only: bool) -> Result<Option<Internship>> {
        let mut filter = doc! { "slug": slug };
        if active_only {
            filter.insert("is_active", true);
        }
        self.repo.find_one(filter).await
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.repo.exists(doc! { "slug": slug }).await
    }

    /// Every internship in storage order
    pub async fn list_all(&self) -> Result<Vec<Internship>> {
        self.repo.find_all().await
    }

    /// Public listing: active postings, newest first, optionally narrowed to one location type
    pub async fn list_active_page(
        &self,
        location_type: Option<&str>,
        page: u64,
    ) -> Result<Paginated<Internship>> {
        let mut filter = doc! { "is_active": true };
        if let Some(location_type) = location_type {
            filter.insert("location_type", location_type);
        }
        self.repo
            .find_page(filter, doc! { "created_at": -1 }, page, Self::PUBLIC_PER_PAGE)
            .await
    }

    pub async fn admin_page(&self, page: u64) -> Result<Paginated<Internship>> {
        self.repo
            .find_page(doc! {}, doc! { "created_at": -1 }, page, Self::ADMIN_PER_PAGE)
            .await
    }

    pub async fn featured(&self, limit: i64) -> Result<Vec<Internship>> {
        self.repo
            .find_latest(doc! { "is_active": true }, "created_at", limit)
            .await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Internship>> {
        self.repo.find_latest(doc! {}, "created_at", limit).await
    }

    /// Replace the editable fields of an internship
    pub async fn update(&self, internship: &Internship) -> Result<bool> {
        let mut serialized = to_document(internship)?;
        // _id is immutable in MongoDB
        serialized.remove("_id");
        self.repo.update_by_id(internship.id, serialized).await
    }

    /// Delete an internship together with every application filed against it
    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let removed = self
            .applicants
            .delete_many(doc! { "internship_id": id })
            .await?;
        log::info!("Removed {} applicants of internship {}", removed, id);
        self.repo.delete_by_id(id).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repo.count(doc! {}).await
    }

    pub async fn count_active(&self) -> Result<u64> {
        self.repo.count(doc! { "is_active": true }).await
    }
}

// =============================================================================
// Applicants
// =============================================================================

pub struct ApplicantRepo {
    repo: Repository<Applicant>,
}

impl ApplicantRepo {
    pub const PER_PAGE: u64 = 20;

    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.applicants()),
        }
    }

    pub async fn insert(&self, applicant: &Applicant) -> Result<ObjectId> {
        self.repo.insert(applicant).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Applicant>> {
        self.repo.find_by_id(id).await
    }

    /// Every applicant in storage order
    pub async fn list_all(&self) -> Result<Vec<Applicant>> {
        self.repo.find_all().await
    }

    pub async fn list_page(
        &self,
        internship_id: Option<ObjectId>,
        status: Option<ApplicantStatus>,
        page: u64,
    ) -> Result<Paginated<Applicant>> {
        let mut filter = doc! {};
        if let Some(internship_id) = internship_id {
            filter.insert("internship_id", internship_id);
        }
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        self.repo
            .find_page(filter, doc! { "applied_at": -1 }, page, Self::PER_PAGE)
            .await
    }

    pub async fn newest_first(&self) -> Result<Vec<Applicant>> {
        let options = FindOptions::builder().sort(doc! { "applied_at": -1 }).build();
        self.repo.find_with(doc! {}, Some(options)).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Applicant>> {
        self.repo.find_latest(doc! {}, "applied_at", limit).await
    }

    pub async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Applicant>> {
        self.repo.find(doc! { "_id": { "$in": ids.to_vec() } }).await
    }

    pub async fn set_status(&self, id: ObjectId, status: ApplicantStatus) -> Result<bool> {
        self.repo
            .update_by_id(id, doc! { "status": status.as_str() })
            .await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repo.count(doc! {}).await
    }

    pub async fn count_pending(&self) -> Result<u64> {
        self.repo
            .count(doc! { "status": ApplicantStatus::Pending.as_str() })
            .await
    }
}

// =============================================================================
// Contact messages
// =============================================================================

pub struct ContactMessageRepo {
    repo: Repository<ContactMessage>,
}

impl ContactMessageRepo {
    pub const PER_PAGE: u64 = 20;

    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.contact_messages()),
        }
    }

    pub async fn insert(&self, message: &ContactMessage) -> Result<ObjectId> {
        self.repo.insert(message).await
    }

    pub async fn page(&self, page: u64) -> Result<Paginated<ContactMessage>> {
        self.repo
            .find_page(doc! {}, doc! { "created_at": -1 }, page, Self::PER_PAGE)
            .await
    }

    /// Opening a message marks it read
    pub async fn open(&self, id: ObjectId) -> Result<Option<ContactMessage>> {
        let Some(mut message) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        if !message.is_read {
            self.repo.update_by_id(id, doc! { "is_read": true }).await?;
            message.is_read = true;
        }
        Ok(Some(message))
    }

    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        self.repo.delete_by_id(id).await
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repo.count(doc! {}).await
    }

    pub async fn count_unread(&self) -> Result<u64> {
        self.repo.count(doc! { "is_read": false }).await
    }
}

// =============================================================================
// Admins
// =============================================================================

pub struct AdminRepo {
    repo: Repository<Admin>,
}

impl AdminRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.admins()),
        }
    }

    pub async fn insert(&self, admin: &Admin) -> Result<ObjectId> {
        self.repo.insert(admin).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        self.repo.find_one(doc! { "username": username }).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.repo.count(doc! {}).await
    }
}

// =============================================================================
// Site settings
// =============================================================================

pub struct SiteSettingsRepo {
    repo: Repository<SiteSettings>,
}

impl SiteSettingsRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.site_settings()),
        }
    }

    /// The first settings record, created with defaults when none exists
    pub async fn get_or_create(&self) -> Result<SiteSettings> {
        if let Some(settings) = self.repo.find_one(doc! {}).await? {
            return Ok(settings);
        }
        let settings = SiteSettings::default();
        self.repo.insert(&settings).await?;
        Ok(settings)
    }

    pub async fn update(&self, settings: &SiteSettings) -> Result<bool> {
        let mut serialized = to_document(settings)?;
        serialized.remove("_id");
        self.repo.update_by_id(settings.id, serialized).await
    }
}

// =============================================================================
// Test utilities
// =============================================================================
