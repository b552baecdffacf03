//! Denormalized article/category membership.
//!
//! After an article is linked to a category it must also become visible in
//! every ancestor of that category. The importer delegates this to a
//! [`CategoryDenormalizer`] handed in at construction time.

use std::future::Future;

use catalog_import_shared::{ArticleId, CategoryId, DenormalizedAssignment, Result};
use catalog_import_storage::Storage;
use tracing::debug;

/// Maintains the flattened article/category lookup rows.
pub trait CategoryDenormalizer {
    /// Record that `article_id` was assigned to `category_id`.
    fn add_assignment(
        &mut self,
        article_id: ArticleId,
        category_id: CategoryId,
    ) -> impl Future<Output = Result<()>>;

    /// Apply subsequent writes immediately instead of wrapping them in a
    /// transaction of their own.
    fn disable_transactions(&mut self);
}

/// A disabled denormalizer does nothing.
impl<D: CategoryDenormalizer> CategoryDenormalizer for Option<D> {
    async fn add_assignment(&mut self, article_id: ArticleId, category_id: CategoryId) -> Result<()> {
        match self {
            Some(inner) => inner.add_assignment(article_id, category_id).await,
            None => Ok(()),
        }
    }

    fn disable_transactions(&mut self) {
        if let Some(inner) = self {
            inner.disable_transactions();
        }
    }
}

/// Writes `articles_categories_ro` rows through [`Storage`].
///
/// One row is written for the assigned category and one per ancestor, all
/// pointing back at the assigned category. Unknown categories write nothing.
pub struct StorageDenormalizer<'a> {
    storage: &'a Storage,
    transactional: bool,
}

impl<'a> StorageDenormalizer<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            transactional: true,
        }
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }
}

impl CategoryDenormalizer for StorageDenormalizer<'_> {
    async fn add_assignment(&mut self, article_id: ArticleId, category_id: CategoryId) -> Result<()> {
        if self.storage.find_category(category_id).await?.is_none() {
            debug!(article_id, category_id, "category not found, nothing to denormalize");
            return Ok(());
        }

        let ancestors = self.storage.category_ancestors(category_id).await?;

        let rows: Vec<DenormalizedAssignment> = std::iter::once(category_id)
            .chain(ancestors)
            .map(|visible_in| DenormalizedAssignment {
                article_id,
                category_id: visible_in,
                parent_category_id: category_id,
            })
            .collect();

        let inserted = self
            .storage
            .insert_denormalized(&rows, self.transactional)
            .await?;
        debug!(
            article_id,
            category_id,
            rows = rows.len(),
            inserted,
            transactional = self.transactional,
            "denormalized assignment"
        );
        Ok(())
    }

    fn disable_transactions(&mut self) {
        self.transactional = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_import_shared::Category;
    use uuid::Uuid;

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ci_denorm_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    async fn save(storage: &Storage, name: &str, parent_id: Option<CategoryId>) -> CategoryId {
        let mut category = Category {
            name: Some(name.into()),
            parent_id,
            ..Category::new()
        };
        storage.save_category(&mut category).await.unwrap()
    }

    #[tokio::test]
    async fn assignment_is_visible_in_every_ancestor() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;
        let mid = save(&storage, "Clothing", Some(root)).await;
        let leaf = save(&storage, "Shirts", Some(mid)).await;

        let mut denormalizer = StorageDenormalizer::new(&storage);
        denormalizer.add_assignment(7, leaf).await.unwrap();

        let rows = storage.list_denormalized(7).await.unwrap();
        let mut visible: Vec<CategoryId> = rows.iter().map(|r| r.category_id).collect();
        visible.sort_unstable();
        assert_eq!(visible, vec![root, mid, leaf]);
        assert!(rows.iter().all(|r| r.parent_category_id == leaf));
    }

    #[tokio::test]
    async fn repeated_assignment_adds_nothing() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;

        let mut denormalizer = StorageDenormalizer::new(&storage);
        denormalizer.add_assignment(7, root).await.unwrap();
        denormalizer.disable_transactions();
        denormalizer.add_assignment(7, root).await.unwrap();

        assert!(!denormalizer.is_transactional());
        assert_eq!(storage.list_denormalized(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_category_writes_nothing() {
        let storage = test_storage().await;

        let mut denormalizer = StorageDenormalizer::new(&storage);
        denormalizer.add_assignment(3, 42).await.unwrap();

        assert!(storage.list_denormalized(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_denormalizer_writes_nothing() {
        let storage = test_storage().await;
        let root = save(&storage, "Root", None).await;

        let mut denormalizer: Option<StorageDenormalizer<'_>> = None;
        denormalizer.add_assignment(7, root).await.unwrap();
        denormalizer.disable_transactions();

        assert!(storage.list_denormalized(7).await.unwrap().is_empty());
    }
}
