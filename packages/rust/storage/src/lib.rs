//! Turso Embedded / libSQL storage layer for the shop catalog.
//!
//! The [`Storage`] struct wraps a libSQL database holding categories, their
//! attribute rows, article memberships and the denormalized membership table.
//!
//! **Access rules:**
//! - Importer / CLI: read-write (sole writer) via [`Storage::open`]
//! - Reporting tools: read-only via [`Storage::open_readonly`]

mod migrations;

use std::collections::HashSet;
use std::path::Path;

use catalog_import_shared::{
    ArticleCategoryLink, ArticleId, CatalogImportError, Category, CategoryAttributes, CategoryId,
    DenormalizedAssignment, Result,
};
use chrono::Utc;
use libsql::{Connection, Database, Value, params};

/// Columns selected for every category query, in [`row_to_category`] order.
const CATEGORY_COLUMNS: &str = "id, parent_id, name, position, active, blog, external, \
     external_target, hide_filter, hide_top, hide_sortings, cms_headline, cms_text, meta_title, \
     meta_keywords, meta_description, template, product_box_layout, added, changed";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogImportError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        CatalogImportError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CatalogImportError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Category operations
    // -----------------------------------------------------------------------

    /// Find a category by identifier.
    pub async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_category(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Find the first category stored under `parent_id` with exactly `name`.
    pub async fn find_category_by_parent_and_name(
        &self,
        parent_id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE parent_id = ?1 AND name = ?2
             ORDER BY id
             LIMIT 1"
        );
        let mut rows = self
            .conn
            .query(&sql, params![parent_id, name])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_category(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Persist a category and commit.
    ///
    /// New categories are inserted and receive their identifier; existing ones
    /// are updated in place. `changed` is stamped on every save. A category
    /// without a name violates the `NOT NULL` constraint and nothing is written.
    pub async fn save_category(&self, category: &mut Category) -> Result<CategoryId> {
        self.check_writable()?;
        category.changed = Utc::now();

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let id = match category.id {
            None => {
                tx.execute(
                    "INSERT INTO categories (parent_id, name, position, active, blog, external,
                       external_target, hide_filter, hide_top, hide_sortings, cms_headline,
                       cms_text, meta_title, meta_keywords, meta_description, template,
                       product_box_layout, added, changed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19)",
                    params![
                        category.parent_id,
                        category.name.as_deref(),
                        category.position,
                        i64::from(category.active),
                        i64::from(category.blog),
                        category.external.as_deref(),
                        category.external_target.as_deref(),
                        i64::from(category.hide_filter),
                        i64::from(category.hide_top),
                        i64::from(category.hide_sortings),
                        category.cms_headline.as_deref(),
                        category.cms_text.as_deref(),
                        category.meta_title.as_deref(),
                        category.meta_keywords.as_deref(),
                        category.meta_description.as_deref(),
                        category.template.as_deref(),
                        category.product_box_layout.as_deref(),
                        category.added.to_rfc3339(),
                        category.changed.to_rfc3339(),
                    ],
                )
                .await
                .map_err(storage_err)?;
                tx.last_insert_rowid()
            }
            Some(id) => {
                tx.execute(
                    "UPDATE categories SET parent_id = ?1, name = ?2, position = ?3, active = ?4,
                       blog = ?5, external = ?6, external_target = ?7, hide_filter = ?8,
                       hide_top = ?9, hide_sortings = ?10, cms_headline = ?11, cms_text = ?12,
                       meta_title = ?13, meta_keywords = ?14, meta_description = ?15,
                       template = ?16, product_box_layout = ?17, changed = ?18
                     WHERE id = ?19",
                    params![
                        category.parent_id,
                        category.name.as_deref(),
                        category.position,
                        i64::from(category.active),
                        i64::from(category.blog),
                        category.external.as_deref(),
                        category.external_target.as_deref(),
                        i64::from(category.hide_filter),
                        i64::from(category.hide_top),
                        i64::from(category.hide_sortings),
                        category.cms_headline.as_deref(),
                        category.cms_text.as_deref(),
                        category.meta_title.as_deref(),
                        category.meta_keywords.as_deref(),
                        category.meta_description.as_deref(),
                        category.template.as_deref(),
                        category.product_box_layout.as_deref(),
                        category.changed.to_rfc3339(),
                        id,
                    ],
                )
                .await
                .map_err(storage_err)?;
                id
            }
        };
        tx.commit().await.map_err(storage_err)?;

        category.id = Some(id);
        Ok(id)
    }

    /// Total number of stored categories.
    pub async fn count_categories(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM categories", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).map_err(storage_err)? as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Walk the parent chain of `id`, nearest parent first.
    ///
    /// Stops at a root, a dangling parent reference, or the first repeated
    /// node, so malformed cyclic trees terminate.
    pub async fn category_ancestors(&self, id: CategoryId) -> Result<Vec<CategoryId>> {
        let mut seen = HashSet::from([id]);
        let mut ancestors = Vec::new();
        let mut current = id;

        loop {
            let mut rows = self
                .conn
                .query(
                    "SELECT parent_id FROM categories WHERE id = ?1",
                    params![current],
                )
                .await
                .map_err(storage_err)?;

            let parent = match rows.next().await.map_err(storage_err)? {
                Some(row) => row.get::<i64>(0).ok(),
                None => None,
            };

            match parent {
                Some(parent) if seen.insert(parent) => {
                    ancestors.push(parent);
                    current = parent;
                }
                _ => break,
            }
        }
        Ok(ancestors)
    }

    // -----------------------------------------------------------------------
    // Attribute operations
    // -----------------------------------------------------------------------

    /// Row id of the attribute row for `category_id`, if one exists.
    pub async fn find_attributes_id(&self, category_id: CategoryId) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM categories_attributes WHERE category_id = ?1",
                params![category_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row.get::<i64>(0).map_err(storage_err)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Insert the attribute row for `category_id`. Unset slots are stored as NULL.
    pub async fn insert_attributes(
        &self,
        category_id: CategoryId,
        attributes: &CategoryAttributes,
    ) -> Result<()> {
        self.check_writable()?;

        let mut columns = vec!["category_id"];
        let mut values = vec![Value::Integer(category_id)];
        for (slot, value) in attributes.iter_set() {
            columns.push(slot.column());
            values.push(Value::Text(value.to_string()));
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO categories_attributes ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        self.conn
            .execute(&sql, libsql::params::Params::Positional(values))
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Update only the supplied attribute columns for `category_id`.
    ///
    /// Returns the number of rows changed; an empty attribute set is a no-op.
    pub async fn update_attributes(
        &self,
        category_id: CategoryId,
        attributes: &CategoryAttributes,
    ) -> Result<u64> {
        self.check_writable()?;
        if attributes.is_empty() {
            return Ok(0);
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (i, (slot, value)) in attributes.iter_set().enumerate() {
            assignments.push(format!("{} = ?{}", slot.column(), i + 1));
            values.push(Value::Text(value.to_string()));
        }
        values.push(Value::Integer(category_id));
        let sql = format!(
            "UPDATE categories_attributes SET {} WHERE category_id = ?{}",
            assignments.join(", "),
            values.len()
        );

        self.conn
            .execute(&sql, libsql::params::Params::Positional(values))
            .await
            .map_err(storage_err)
    }

    /// Read the attribute row for `category_id`.
    pub async fn get_attributes(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<CategoryAttributes>> {
        let mut rows = self
            .conn
            .query(
                "SELECT attribute1, attribute2, attribute3, attribute4, attribute5, attribute6
                 FROM categories_attributes WHERE category_id = ?1",
                params![category_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let mut attributes = CategoryAttributes::default();
                for slot in catalog_import_shared::AttributeSlot::all() {
                    if let Ok(value) = row.get::<String>(slot.number() as i32 - 1) {
                        attributes.set(slot, value);
                    }
                }
                Ok(Some(attributes))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Number of attribute rows stored for `category_id`.
    pub async fn count_attribute_rows(&self, category_id: CategoryId) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM categories_attributes WHERE category_id = ?1",
                params![category_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).map_err(storage_err)? as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Article link operations
    // -----------------------------------------------------------------------

    /// Link an article to a category if the category exists and the pair is new.
    ///
    /// Returns the number of rows inserted: 0 when the pair already exists or
    /// the category is missing, 1 otherwise.
    pub async fn link_article_to_category(
        &self,
        article_id: ArticleId,
        category_id: CategoryId,
    ) -> Result<u64> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO articles_categories (article_id, category_id)
                 SELECT ?1, c.id FROM categories c WHERE c.id = ?2",
                params![article_id, category_id],
            )
            .await
            .map_err(storage_err)
    }

    /// All article links, optionally restricted to one article.
    pub async fn list_article_links(
        &self,
        article_id: Option<ArticleId>,
    ) -> Result<Vec<ArticleCategoryLink>> {
        let mut rows = match article_id {
            Some(article_id) => self
                .conn
                .query(
                    "SELECT article_id, category_id FROM articles_categories
                     WHERE article_id = ?1 ORDER BY category_id",
                    params![article_id],
                )
                .await,
            None => self
                .conn
                .query(
                    "SELECT article_id, category_id FROM articles_categories
                     ORDER BY article_id, category_id",
                    params![],
                )
                .await,
        }
        .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(ArticleCategoryLink {
                article_id: row.get::<i64>(0).map_err(storage_err)?,
                category_id: row.get::<i64>(1).map_err(storage_err)?,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Denormalized membership operations
    // -----------------------------------------------------------------------

    /// Insert denormalized rows, ignoring ones that already exist.
    ///
    /// With `transactional` set the rows are written atomically; otherwise each
    /// row is applied as its own statement. Returns the number of new rows.
    pub async fn insert_denormalized(
        &self,
        rows: &[DenormalizedAssignment],
        transactional: bool,
    ) -> Result<u64> {
        self.check_writable()?;

        if !transactional {
            return insert_denormalized_rows(&self.conn, rows).await;
        }

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let inserted = insert_denormalized_rows(&tx, rows).await?;
        tx.commit().await.map_err(storage_err)?;
        Ok(inserted)
    }

    /// Denormalized rows for one article, ordered by category.
    pub async fn list_denormalized(
        &self,
        article_id: ArticleId,
    ) -> Result<Vec<DenormalizedAssignment>> {
        let mut rows = self
            .conn
            .query(
                "SELECT article_id, category_id, parent_category_id FROM articles_categories_ro
                 WHERE article_id = ?1 ORDER BY category_id, parent_category_id",
                params![article_id],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(DenormalizedAssignment {
                article_id: row.get::<i64>(0).map_err(storage_err)?,
                category_id: row.get::<i64>(1).map_err(storage_err)?,
                parent_category_id: row.get::<i64>(2).map_err(storage_err)?,
            });
        }
        Ok(results)
    }
}

async fn insert_denormalized_rows(
    conn: &Connection,
    rows: &[DenormalizedAssignment],
) -> Result<u64> {
    let mut inserted = 0;
    for row in rows {
        inserted += conn
            .execute(
                "INSERT OR IGNORE INTO articles_categories_ro
                   (article_id, category_id, parent_category_id)
                 VALUES (?1, ?2, ?3)",
                params![row.article_id, row.category_id, row.parent_category_id],
            )
            .await
            .map_err(storage_err)?;
    }
    Ok(inserted)
}

fn storage_err(e: libsql::Error) -> CatalogImportError {
    CatalogImportError::Storage(e.to_string())
}

/// Convert a database row to a [`Category`].
fn row_to_category(row: &libsql::Row) -> Result<Category> {
    let flag = |idx: i32| -> Result<bool> { Ok(row.get::<i64>(idx).map_err(storage_err)? != 0) };
    let timestamp = |idx: i32| -> Result<chrono::DateTime<Utc>> {
        let s: String = row.get(idx).map_err(storage_err)?;
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CatalogImportError::Storage(format!("invalid date: {e}")))
    };

    Ok(Category {
        id: Some(row.get::<i64>(0).map_err(storage_err)?),
        parent_id: row.get::<i64>(1).ok(),
        name: Some(row.get::<String>(2).map_err(storage_err)?),
        position: row.get::<i64>(3).map_err(storage_err)?,
        active: flag(4)?,
        blog: flag(5)?,
        external: row.get::<String>(6).ok(),
        external_target: row.get::<String>(7).ok(),
        hide_filter: flag(8)?,
        hide_top: flag(9)?,
        hide_sortings: flag(10)?,
        cms_headline: row.get::<String>(11).ok(),
        cms_text: row.get::<String>(12).ok(),
        meta_title: row.get::<String>(13).ok(),
        meta_keywords: row.get::<String>(14).ok(),
        meta_description: row.get::<String>(15).ok(),
        template: row.get::<String>(16).ok(),
        product_box_layout: row.get::<String>(17).ok(),
        added: timestamp(18)?,
        changed: timestamp(19)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_import_shared::AttributeSlot;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ci_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    async fn save(storage: &Storage, name: &str, parent_id: Option<CategoryId>) -> CategoryId {
        let mut category = Category {
            name: Some(name.into()),
            parent_id,
            ..Category::new()
        };
        storage.save_category(&mut category).await.expect("save category")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, migrations::latest_version());
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("ci_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, migrations::latest_version());
    }

    #[tokio::test]
    async fn category_insert_then_update() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;

        let mut category = Category {
            name: Some("Shoes".into()),
            parent_id: Some(root),
            cms_headline: Some("All shoes".into()),
            hide_top: true,
            ..Category::new()
        };
        let id = storage.save_category(&mut category).await.unwrap();
        assert_eq!(category.id, Some(id));

        let found = storage.find_category(id).await.unwrap().expect("stored");
        assert_eq!(found.name.as_deref(), Some("Shoes"));
        assert_eq!(found.parent_id, Some(root));
        assert_eq!(found.cms_headline.as_deref(), Some("All shoes"));
        assert!(found.hide_top);
        assert!(found.active);
        assert_eq!(found.meta_title, None);

        category.name = Some("Footwear".into());
        let same = storage.save_category(&mut category).await.unwrap();
        assert_eq!(same, id);
        assert_eq!(storage.count_categories().await.unwrap(), 2);
        let found = storage.find_category(id).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Footwear"));
    }

    #[tokio::test]
    async fn nameless_category_is_rejected() {
        let storage = test_storage().await;
        let mut category = Category::new();

        let result = storage.save_category(&mut category).await;
        assert!(matches!(result, Err(CatalogImportError::Storage(_))));
        assert_eq!(category.id, None);
        assert_eq!(storage.count_categories().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_parent_and_name() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;
        let other = save(&storage, "Other", None).await;
        let shoes = save(&storage, "Shoes", Some(root)).await;
        save(&storage, "Shoes", Some(other)).await;

        let found = storage
            .find_category_by_parent_and_name(root, "Shoes")
            .await
            .unwrap()
            .expect("match");
        assert_eq!(found.id, Some(shoes));

        let missing = storage
            .find_category_by_parent_and_name(root, "shoes")
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(storage.find_category(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ancestors_stop_on_cycles() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;
        let mid = save(&storage, "Mid", Some(root)).await;
        let leaf = save(&storage, "Leaf", Some(mid)).await;
        assert_eq!(storage.category_ancestors(leaf).await.unwrap(), vec![mid, root]);

        // Close the loop: root -> leaf
        let mut root_cat = storage.find_category(root).await.unwrap().unwrap();
        root_cat.parent_id = Some(leaf);
        storage.save_category(&mut root_cat).await.unwrap();
        assert_eq!(storage.category_ancestors(leaf).await.unwrap(), vec![mid, root]);
    }

    #[tokio::test]
    async fn attribute_insert_and_partial_update() {
        let storage = test_storage().await;
        let id = save(&storage, "Shoes", None).await;
        let slot = |n| AttributeSlot::new(n).unwrap();

        assert!(storage.find_attributes_id(id).await.unwrap().is_none());

        let mut attrs = CategoryAttributes::default();
        attrs.set(slot(1), "red");
        attrs.set(slot(2), "XL");
        storage.insert_attributes(id, &attrs).await.unwrap();
        assert!(storage.find_attributes_id(id).await.unwrap().is_some());

        let mut update = CategoryAttributes::default();
        update.set(slot(2), "XXL");
        update.set(slot(6), "sale");
        assert_eq!(storage.update_attributes(id, &update).await.unwrap(), 1);

        let stored = storage.get_attributes(id).await.unwrap().unwrap();
        assert_eq!(stored.get(slot(1)), Some("red"));
        assert_eq!(stored.get(slot(2)), Some("XXL"));
        assert_eq!(stored.get(slot(6)), Some("sale"));
        assert_eq!(stored.get(slot(3)), None);
        assert_eq!(storage.count_attribute_rows(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_attribute_row_is_rejected() {
        let storage = test_storage().await;
        let id = save(&storage, "Shoes", None).await;
        let mut attrs = CategoryAttributes::default();
        attrs.set(AttributeSlot::new(1).unwrap(), "red");

        storage.insert_attributes(id, &attrs).await.unwrap();
        assert!(storage.insert_attributes(id, &attrs).await.is_err());
        assert_eq!(storage.count_attribute_rows(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn article_links_are_a_set() {
        let storage = test_storage().await;
        let id = save(&storage, "Shoes", None).await;

        assert_eq!(storage.link_article_to_category(3, id).await.unwrap(), 1);
        assert_eq!(storage.link_article_to_category(3, id).await.unwrap(), 0);
        assert_eq!(storage.link_article_to_category(3, 9999).await.unwrap(), 0);

        let links = storage.list_article_links(Some(3)).await.unwrap();
        assert_eq!(
            links,
            vec![ArticleCategoryLink {
                article_id: 3,
                category_id: id
            }]
        );
        assert_eq!(storage.list_article_links(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn denormalized_rows_ignore_duplicates() {
        let storage = test_storage().await;
        let row = DenormalizedAssignment {
            article_id: 3,
            category_id: 1,
            parent_category_id: 2,
        };

        assert_eq!(storage.insert_denormalized(&[row], true).await.unwrap(), 1);
        assert_eq!(storage.insert_denormalized(&[row], false).await.unwrap(), 0);
        assert_eq!(storage.list_denormalized(3).await.unwrap(), vec![row]);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("ci_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        let id = save(&rw, "Root", None).await;
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert!(ro.find_category(id).await.unwrap().is_some());

        let result = ro.link_article_to_category(1, id).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }
}
