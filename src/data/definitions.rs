use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::model::{Category, Tag, DEFAULT_NAME};

/// One entry under `categories:` in categories.yml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default, rename = "id_display")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub slot: Option<i32>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default, rename = "permission-see-category")]
    pub permission_see_category: bool,
    #[serde(default)]
    pub lore: Option<Vec<String>>,
}

/// One entry under `tags:` in tags.yml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDefinition {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default, rename = "displayname")]
    pub display_name: Option<String>,
    #[serde(default, rename = "display-item")]
    pub display_item: Option<String>,
    #[serde(default)]
    pub cost: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesFile {
    #[serde(default)]
    pub categories: Option<BTreeMap<String, CategoryDefinition>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagsFile {
    #[serde(default)]
    pub tags: Option<BTreeMap<String, TagDefinition>>,
}

/// Empty permission strings in the files mean "no permission".
fn permission_field(value: &Option<String>, fallback: Option<String>) -> Option<String> {
    match value {
        Some(node) if node.trim().is_empty() => None,
        Some(node) => Some(node.clone()),
        None => fallback,
    }
}

impl CategoryDefinition {
    pub fn builtin_default() -> Self {
        let category = Category::with_defaults(DEFAULT_NAME, None);
        Self {
            title: Some(category.title),
            material: Some(category.material),
            display_name: Some(category.display_name),
            slot: Some(11),
            permission: category.permission,
            permission_see_category: false,
            lore: Some(category.lore),
        }
    }

    pub fn to_category(&self, name: &str) -> Category {
        let base = Category::with_defaults(name, None);
        Category {
            id: 0,
            name: name.to_string(),
            title: self.title.clone().unwrap_or(base.title),
            material: self.material.clone().unwrap_or(base.material),
            display_name: self.display_name.clone().unwrap_or(base.display_name),
            slot_position: self.slot.unwrap_or(0),
            lore: self.lore.clone().unwrap_or(base.lore),
            permission: permission_field(&self.permission, base.permission),
            permission_see_category: self.permission_see_category,
            is_from_yaml: true,
        }
    }
}

impl TagDefinition {
    pub fn builtin_default(display_tag: &str) -> Self {
        Self {
            tag: Some(display_tag.to_string()),
            permission: Some(String::new()),
            description: Some("Default tag".to_string()),
            category: Some(DEFAULT_NAME.to_string()),
            order: Some(1),
            display_name: None,
            display_item: None,
            cost: 0,
        }
    }

    pub fn category_name(&self) -> &str {
        self.category
            .as_deref()
            .filter(|category| !category.trim().is_empty())
            .unwrap_or(DEFAULT_NAME)
    }

    pub fn to_tag(&self, name: &str) -> Tag {
        let base = Tag::with_defaults(name, self.category_name());
        Tag {
            id: 0,
            name: name.to_string(),
            display_tag: self.tag.clone().unwrap_or(base.display_tag),
            permission: permission_field(&self.permission, base.permission),
            description: self.description.clone().unwrap_or_default(),
            category: base.category,
            display_order: self.order.unwrap_or(0),
            display_name: self.display_name.clone().unwrap_or(base.display_name),
            display_item: self.display_item.clone().unwrap_or(base.display_item),
            cost: self.cost.max(0),
            is_from_yaml: true,
        }
    }
}
