//! Category import from legacy export records.
//!
//! [`CategoryImporter::import`] turns one flat legacy record into a stored
//! category plus its attribute row. [`CategoryImporter::assign_articles_to_category`]
//! links an article to a category and hands the assignment to the injected
//! [`CategoryDenormalizer`].

use catalog_import_shared::{
    ArticleId, Category, CategoryAttributes, CategoryId, CategoryRecord, Result,
    extract_attributes, value_to_text,
};
use catalog_import_storage::Storage;
use tracing::{debug, error, info, instrument};

use crate::denormalize::CategoryDenormalizer;

/// Result of matching a record against existing categories.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryMatch {
    /// A category with the same parent and name already exists.
    Found(Category),
    /// No match; a new category will be created.
    NotFound,
}

/// Outcome of importing a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new category was inserted.
    Created(CategoryId),
    /// An existing category (matched by parent + name) was updated.
    Updated(CategoryId),
    /// The referenced parent does not exist; nothing was written.
    ParentNotFound(CategoryId),
}

impl ImportOutcome {
    /// Identifier of the stored category, `None` if the import failed.
    pub fn category_id(&self) -> Option<CategoryId> {
        match *self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            Self::ParentNotFound(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.category_id().is_some()
    }
}

/// What happened to the attribute row of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUpsert {
    /// No attribute slot was supplied.
    Skipped,
    Inserted,
    Updated,
}

/// Outcome of an article/category assignment.
///
/// `Inserted` and `Unchanged` both mean the link statement ran; the latter
/// covers an existing pair as well as a missing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// One of the identifiers was zero.
    Skipped,
    Inserted,
    Unchanged,
    /// The link statement failed; the denormalizer was not notified.
    Failed,
}

/// Running totals for a batch of imports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub parent_missing: usize,
}

impl ImportSummary {
    pub fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Created(_) => self.created += 1,
            ImportOutcome::Updated(_) => self.updated += 1,
            ImportOutcome::ParentNotFound(_) => self.parent_missing += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.parent_missing
    }
}

/// Imports legacy category records into the catalog.
pub struct CategoryImporter<'a, D> {
    storage: &'a Storage,
    denormalizer: D,
}

impl<'a, D: CategoryDenormalizer> CategoryImporter<'a, D> {
    pub fn new(storage: &'a Storage, denormalizer: D) -> Self {
        Self {
            storage,
            denormalizer,
        }
    }

    /// The injected denormalization collaborator.
    pub fn denormalizer(&self) -> &D {
        &self.denormalizer
    }

    /// Import one record.
    ///
    /// 1. Rename legacy keys
    /// 2. Match an existing category by parent + name
    /// 3. Resolve the parent (abort if missing)
    /// 4. Assign fields, persist and commit
    /// 5. Upsert the attribute row
    ///
    /// A missing parent is logged and reported as
    /// [`ImportOutcome::ParentNotFound`]; storage errors propagate, including
    /// the rejection of a new category that has no name.
    #[instrument(skip_all, fields(name = tracing::field::Empty, parent = tracing::field::Empty))]
    pub async fn import(&self, mut record: CategoryRecord) -> Result<ImportOutcome> {
        record.normalize_legacy_keys();

        let span = tracing::Span::current();
        if let Some(name) = record.name() {
            span.record("name", name.as_str());
        }
        if let Some(parent) = record.parent() {
            span.record("parent", parent);
        }

        let matched = self.find_match(&record).await?;

        let parent = match record.parent() {
            Some(parent_id) => match self.storage.find_category(parent_id).await? {
                Some(parent) => Some(parent),
                None => {
                    let raw = record.get("parent").map(value_to_text).unwrap_or_default();
                    error!(parent = parent_id, "Parent category {raw} not found!");
                    return Ok(ImportOutcome::ParentNotFound(parent_id));
                }
            },
            None => None,
        };

        let (mut category, created) = match matched {
            CategoryMatch::Found(existing) => (existing, false),
            CategoryMatch::NotFound => (Category::new(), true),
        };
        category.apply_record(&record);
        category.parent_id = parent.and_then(|p| p.id);

        let id = self.storage.save_category(&mut category).await?;
        info!(id, created, "category saved");

        let attributes = extract_attributes(&record);
        self.upsert_attributes(id, &attributes).await?;

        Ok(if created {
            ImportOutcome::Created(id)
        } else {
            ImportOutcome::Updated(id)
        })
    }

    /// Look for an existing category with the record's parent and name.
    ///
    /// Only attempted when both keys are present.
    pub async fn find_match(&self, record: &CategoryRecord) -> Result<CategoryMatch> {
        let (Some(parent), Some(name)) = (record.parent(), record.name()) else {
            return Ok(CategoryMatch::NotFound);
        };

        Ok(
            match self
                .storage
                .find_category_by_parent_and_name(parent, &name)
                .await?
            {
                Some(category) => CategoryMatch::Found(category),
                None => CategoryMatch::NotFound,
            },
        )
    }

    /// Insert or update the attribute row for `category_id`.
    ///
    /// Only the supplied slots are written on update.
    pub async fn upsert_attributes(
        &self,
        category_id: CategoryId,
        attributes: &CategoryAttributes,
    ) -> Result<AttributeUpsert> {
        if attributes.is_empty() {
            return Ok(AttributeUpsert::Skipped);
        }

        let result = match self.storage.find_attributes_id(category_id).await? {
            None => {
                self.storage
                    .insert_attributes(category_id, attributes)
                    .await?;
                AttributeUpsert::Inserted
            }
            Some(_) => {
                self.storage
                    .update_attributes(category_id, attributes)
                    .await?;
                AttributeUpsert::Updated
            }
        };
        debug!(category_id, ?result, "attributes upserted");
        Ok(result)
    }

    /// Link an article to a category, then notify the denormalizer.
    ///
    /// Zero identifiers are a silent no-op. A failing link statement is
    /// swallowed and reported as [`AssignOutcome::Failed`]. Once the statement
    /// has run, the denormalizer receives the assignment whether or not a
    /// row was inserted, and is switched to non-transactional writes.
    /// Only denormalizer errors are returned.
    #[instrument(skip(self))]
    pub async fn assign_articles_to_category(
        &mut self,
        article_id: ArticleId,
        category_id: CategoryId,
    ) -> Result<AssignOutcome> {
        if article_id == 0 || category_id == 0 {
            return Ok(AssignOutcome::Skipped);
        }

        let outcome = match self
            .storage
            .link_article_to_category(article_id, category_id)
            .await
        {
            Ok(0) => AssignOutcome::Unchanged,
            Ok(_) => AssignOutcome::Inserted,
            Err(e) => {
                debug!(error = %e, "article link insert failed");
                return Ok(AssignOutcome::Failed);
            }
        };

        self.denormalizer
            .add_assignment(article_id, category_id)
            .await?;
        self.denormalizer.disable_transactions();

        Ok(outcome)
    }
}
