//! Collection tree types
//!
//! A collection is an ordered tree of folders and requests. Folders carry
//! the same variable/auth/event surface as the collection itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthConfig;
use crate::request::RequestSpec;
use crate::scripting::{Event, EventKind};
use crate::variables::VariableMap;

/// A folder containing requests and other folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier
    pub id: Uuid,
    /// Folder name
    pub name: String,
    /// Items in this folder
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Folder-declared variables
    #[serde(default)]
    pub variables: VariableMap,
    /// Folder-level auth, inherited by child requests without their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Folder-level events
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Folder {
    /// Creates a new empty folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            items: Vec::new(),
            variables: VariableMap::new(),
            auth: None,
            events: Vec::new(),
        }
    }

    /// Adds an item to this folder.
    pub fn add_item(&mut self, item: CollectionItem) {
        self.items.push(item);
    }
}

/// An item in a collection (either a folder or a request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectionItem {
    /// A folder containing other items
    Folder(Folder),
    /// A request specification
    Request(RequestSpec),
}

impl CollectionItem {
    /// Returns the ID of this item.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Folder(f) => f.id,
            Self::Request(r) => r.id,
        }
    }

    /// Returns the name of this item.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::Request(r) => &r.name,
        }
    }
}

/// A collection of requests organized in folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Schema version for migration support
    pub schema: u32,
    /// Unique identifier
    pub id: Uuid,
    /// Collection name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Items in this collection
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Collection-declared variables
    #[serde(default)]
    pub variables: VariableMap,
    /// Collection-level auth, inherited by requests without their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Collection-level events; pre-request scripts here run before each
    /// request's own. Test scripts are per-request only.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Collection {
    /// Current schema version.
    pub const SCHEMA_VERSION: u32 = 1;

    /// Creates a new empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Self::SCHEMA_VERSION,
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            items: Vec::new(),
            variables: VariableMap::new(),
            auth: None,
            events: Vec::new(),
        }
    }

    /// Adds an item to the collection root.
    pub fn add_item(&mut self, item: CollectionItem) {
        self.items.push(item);
    }

    /// Returns the total number of requests in the collection (recursive).
    #[must_use]
    pub fn request_count(&self) -> usize {
        fn count_in_items(items: &[CollectionItem]) -> usize {
            items.iter().fold(0, |acc, item| {
                acc + match item {
                    CollectionItem::Request(_) => 1,
                    CollectionItem::Folder(f) => count_in_items(&f.items),
                }
            })
        }
        count_in_items(&self.items)
    }

    /// Finds a request by name anywhere in the tree (depth-first).
    #[must_use]
    pub fn find_request(&self, name: &str) -> Option<&RequestSpec> {
        fn find_in_items<'a>(items: &'a [CollectionItem], name: &str) -> Option<&'a RequestSpec> {
            for item in items {
                match item {
                    CollectionItem::Request(r) if r.name == name => return Some(r),
                    CollectionItem::Folder(f) => {
                        if let Some(found) = find_in_items(&f.items, name) {
                            return Some(found);
                        }
                    }
                    CollectionItem::Request(_) => {}
                }
            }
            None
        }
        find_in_items(&self.items, name)
    }

    /// Finds a folder by name anywhere in the tree (depth-first).
    #[must_use]
    pub fn find_folder(&self, name: &str) -> Option<&Folder> {
        fn find_in_items<'a>(items: &'a [CollectionItem], name: &str) -> Option<&'a Folder> {
            for item in items {
                if let CollectionItem::Folder(f) = item {
                    if f.name == name {
                        return Some(f);
                    }
                    if let Some(found) = find_in_items(&f.items, name) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find_in_items(&self.items, name)
    }

    /// Returns the collection-level events of the given kind whose scripts
    /// should run.
    pub fn runnable_events(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |e| e.listen == kind && e.script.should_run())
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new("New Collection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_collection() -> Collection {
        let mut collection = Collection::new("Test");
        collection.add_item(CollectionItem::Request(RequestSpec::new("Request 1")));

        let mut folder = Folder::new("Users");
        folder.add_item(CollectionItem::Request(RequestSpec::new("Get Users")));
        folder.add_item(CollectionItem::Request(RequestSpec::new("Create User")));

        let mut nested = Folder::new("Admin");
        nested.add_item(CollectionItem::Request(RequestSpec::new("Delete User")));
        folder.add_item(CollectionItem::Folder(nested));

        collection.add_item(CollectionItem::Folder(folder));
        collection
    }

    #[test]
    fn test_collection_creation() {
        let collection = Collection::new("My API");
        assert_eq!(collection.name, "My API");
        assert_eq!(collection.schema, Collection::SCHEMA_VERSION);
        assert!(collection.items.is_empty());
    }

    #[test]
    fn test_request_count_recursive() {
        assert_eq!(sample_collection().request_count(), 4);
    }

    #[test]
    fn test_find_request_nested() {
        let collection = sample_collection();
        assert!(collection.find_request("Delete User").is_some());
        assert!(collection.find_request("Missing").is_none());
    }

    #[test]
    fn test_find_folder_nested() {
        let collection = sample_collection();
        assert_eq!(
            collection.find_folder("Admin").map(|f| f.name.as_str()),
            Some("Admin")
        );
    }
}
