//! Core catalog types: categories, attribute rows, article links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{CategoryRecord, value_to_bool, value_to_int, value_to_text};

/// Category identifier as stored in the catalog database.
pub type CategoryId = i64;

/// Article identifier as stored in the catalog database.
pub type ArticleId = i64;

/// Number of free-text attribute columns per category.
pub const ATTRIBUTE_SLOTS: usize = 6;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A node in the shop's category tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Assigned on first persist.
    pub id: Option<CategoryId>,
    /// Parent category, `None` for root nodes.
    pub parent_id: Option<CategoryId>,
    /// `None` until a record supplies one; the store rejects nameless rows.
    pub name: Option<String>,
    pub position: i64,
    pub active: bool,
    pub blog: bool,
    /// External link target URL.
    pub external: Option<String>,
    pub external_target: Option<String>,
    pub hide_filter: bool,
    pub hide_top: bool,
    pub hide_sortings: bool,
    pub cms_headline: Option<String>,
    pub cms_text: Option<String>,
    pub meta_title: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub template: Option<String>,
    pub product_box_layout: Option<String>,
    pub added: DateTime<Utc>,
    pub changed: DateTime<Utc>,
}

impl Default for Category {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            parent_id: None,
            name: None,
            position: 0,
            active: true,
            blog: false,
            external: None,
            external_target: None,
            hide_filter: false,
            hide_top: false,
            hide_sortings: false,
            cms_headline: None,
            cms_text: None,
            meta_title: None,
            meta_keywords: None,
            meta_description: None,
            template: None,
            product_box_layout: None,
            added: now,
            changed: now,
        }
    }
}

impl Category {
    /// A fresh, unsaved category.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign every recognised field from a normalized record.
    ///
    /// Keys are canonical (camelCase) names. Unknown keys, `id` and
    /// `parent` are ignored; the parent is set separately once resolved.
    /// `null` clears optional text fields and leaves the others untouched.
    pub fn apply_record(&mut self, record: &CategoryRecord) {
        for (key, value) in record.entries() {
            match key {
                "name" => set_with(&mut self.name, value, |v| Some(value_to_text(v))),
                "position" => set_with(&mut self.position, value, value_to_int),
                "active" => set_with(&mut self.active, value, value_to_bool),
                "blog" => set_with(&mut self.blog, value, value_to_bool),
                "external" => self.external = optional_text(value),
                "externalTarget" => self.external_target = optional_text(value),
                "hideFilter" => set_with(&mut self.hide_filter, value, value_to_bool),
                "hideTop" => set_with(&mut self.hide_top, value, value_to_bool),
                "hideSortings" => set_with(&mut self.hide_sortings, value, value_to_bool),
                "cmsHeadline" => self.cms_headline = optional_text(value),
                "cmsText" => self.cms_text = optional_text(value),
                "metaTitle" => self.meta_title = optional_text(value),
                "metaKeywords" => self.meta_keywords = optional_text(value),
                "metaDescription" => self.meta_description = optional_text(value),
                "template" => self.template = optional_text(value),
                "productBoxLayout" => self.product_box_layout = optional_text(value),
                _ => {}
            }
        }
    }
}

fn set_with<T>(field: &mut T, value: &Value, convert: fn(&Value) -> T) {
    if !value.is_null() {
        *field = convert(value);
    }
}

fn optional_text(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value_to_text(value))
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// One of the six attribute columns (`attribute1` .. `attribute6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeSlot(u8);

impl AttributeSlot {
    const COLUMNS: [&'static str; ATTRIBUTE_SLOTS] = [
        "attribute1",
        "attribute2",
        "attribute3",
        "attribute4",
        "attribute5",
        "attribute6",
    ];

    /// Slot for a 1-based index, `None` outside `1..=6`.
    pub fn new(number: usize) -> Option<Self> {
        (1..=ATTRIBUTE_SLOTS)
            .contains(&number)
            .then(|| Self(number as u8))
    }

    /// All slots in column order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=ATTRIBUTE_SLOTS as u8).map(Self)
    }

    /// 1-based slot number.
    pub fn number(self) -> usize {
        usize::from(self.0)
    }

    /// Database column name.
    pub fn column(self) -> &'static str {
        Self::COLUMNS[self.number() - 1]
    }
}

/// Values for the fixed-width attribute row of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAttributes {
    values: [Option<String>; ATTRIBUTE_SLOTS],
}

impl CategoryAttributes {
    pub fn get(&self, slot: AttributeSlot) -> Option<&str> {
        self.values[slot.number() - 1].as_deref()
    }

    pub fn set(&mut self, slot: AttributeSlot, value: impl Into<String>) {
        self.values[slot.number() - 1] = Some(value.into());
    }

    /// True when no slot carries a value.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Slots that carry a value, in column order.
    pub fn iter_set(&self) -> impl Iterator<Item = (AttributeSlot, &str)> {
        AttributeSlot::all().filter_map(|slot| self.get(slot).map(|v| (slot, v)))
    }
}

/// Pull the attribute slots out of a normalized record.
///
/// For each slot `ac_attr{n}` wins over `attr[n]`. `attr` may be an object
/// keyed `"1"`..`"6"` or an array indexed positionally. Slots with neither
/// source are left unset.
pub fn extract_attributes(record: &CategoryRecord) -> CategoryAttributes {
    let nested = record.get("attr");
    let mut attributes = CategoryAttributes::default();

    for slot in AttributeSlot::all() {
        let n = slot.number();
        let value = record
            .get(&format!("ac_attr{n}"))
            .or_else(|| nested.and_then(|attr| nested_slot(attr, n)));

        if let Some(value) = value {
            attributes.set(slot, value_to_text(value));
        }
    }
    attributes
}

fn nested_slot(attr: &Value, n: usize) -> Option<&Value> {
    let value = match attr {
        Value::Object(map) => map.get(&n.to_string()),
        Value::Array(items) => items.get(n),
        _ => None,
    };
    value.filter(|v| !v.is_null())
}

// ---------------------------------------------------------------------------
// Article links
// ---------------------------------------------------------------------------

/// An (article, category) membership pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleCategoryLink {
    #[serde(alias = "articleID", alias = "article")]
    pub article_id: ArticleId,
    #[serde(alias = "categoryID", alias = "category")]
    pub category_id: CategoryId,
}

/// A denormalized article/category row: the article is visible in
/// `category_id` because it was assigned to `parent_category_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenormalizedAssignment {
    pub article_id: ArticleId,
    pub category_id: CategoryId,
    pub parent_category_id: CategoryId,
}
