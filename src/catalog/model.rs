use std::ops::RangeInclusive;

/// Name reserved for the fallback category and the fallback tag.
pub const DEFAULT_NAME: &str = "default";

pub const CATEGORY_NAME_LEN: RangeInclusive<usize> = 2..=15;
pub const TAG_NAME_LEN: RangeInclusive<usize> = 2..=20;

pub const PAGE_PLACEHOLDER: &str = "%page%";
pub const TAGS_AMOUNT_PLACEHOLDER: &str = "%tags_amount%";
pub const TAG_PLACEHOLDER: &str = "%tag%";

pub const DEFAULT_MATERIAL: &str = "NAME_TAG";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("{kind} name must be {min}-{max} characters long (got {len})")]
    Length {
        kind: &'static str,
        min: usize,
        max: usize,
        len: usize,
    },
    #[error("{kind} name may only contain letters, numbers and underscores")]
    Charset { kind: &'static str },
}

pub fn validate_category_name(name: &str) -> Result<(), NameError> {
    validate_name("category", name, CATEGORY_NAME_LEN)
}

pub fn validate_tag_name(name: &str) -> Result<(), NameError> {
    validate_name("tag", name, TAG_NAME_LEN)
}

fn validate_name(
    kind: &'static str,
    name: &str,
    bounds: RangeInclusive<usize>,
) -> Result<(), NameError> {
    let len = name.chars().count();
    if !bounds.contains(&len) {
        return Err(NameError::Length {
            kind,
            min: *bounds.start(),
            max: *bounds.end(),
            len,
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(NameError::Charset { kind });
    }
    Ok(())
}

/// Lookup key used by the catalogs. Entities keep their original casing.
pub fn catalog_key(name: &str) -> String {
    name.to_lowercase()
}

pub fn is_default(name: &str) -> bool {
    name.eq_ignore_ascii_case(DEFAULT_NAME)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Menu title; may contain `%page%`.
    pub title: String,
    pub material: String,
    pub display_name: String,
    pub slot_position: i32,
    /// Item lore; lines may contain `%tags_amount%`.
    pub lore: Vec<String>,
    pub permission: Option<String>,
    /// When set, players without `permission` do not see the category.
    pub permission_see_category: bool,
    pub is_from_yaml: bool,
}

impl Category {
    /// Category with the presentation defaults used by admin-created entries.
    pub fn with_defaults(name: &str, display_name: Option<&str>) -> Self {
        let label = display_name
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(name));
        Self {
            id: 0,
            name: name.to_string(),
            title: format!("&8{} Tags (Page {})", label, PAGE_PLACEHOLDER),
            material: DEFAULT_MATERIAL.to_string(),
            display_name: format!("&7&l{} Tags", label),
            slot_position: 0,
            lore: vec![
                "&8&m-----------------------------".to_string(),
                format!("&7{} tags: &7{}", label, TAGS_AMOUNT_PLACEHOLDER),
                "&8&m-----------------------------".to_string(),
            ],
            permission: Some(format!("grvtags.category.{}", catalog_key(name))),
            permission_see_category: false,
            is_from_yaml: false,
        }
    }

    pub fn key(&self) -> String {
        catalog_key(&self.name)
    }

    pub fn is_default(&self) -> bool {
        is_default(&self.name)
    }

    pub fn page_title(&self, page: usize) -> String {
        self.title.replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    pub fn rendered_lore(&self, tag_count: usize) -> Vec<String> {
        let amount = tag_count.to_string();
        self.lore
            .iter()
            .map(|line| line.replace(TAGS_AMOUNT_PLACEHOLDER, &amount))
            .collect()
    }

    pub fn visible_to(&self, has_permission: impl Fn(&str) -> bool) -> bool {
        if !self.permission_see_category {
            return true;
        }
        match self.permission.as_deref() {
            Some(node) if !node.is_empty() => has_permission(node),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    /// Text shown next to the player name.
    pub display_tag: String,
    pub permission: Option<String>,
    pub description: String,
    pub category: String,
    pub display_order: i32,
    /// Menu item name; may contain `%tag%`.
    pub display_name: String,
    pub display_item: String,
    /// Zero means the tag is granted by staff rather than bought.
    pub cost: i64,
    pub is_from_yaml: bool,
}

impl Tag {
    pub fn with_defaults(name: &str, category: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            display_tag: format!("&8[&7{}&8]", capitalize(name)),
            permission: Some(format!("grvtags.tag.{}", catalog_key(name))),
            description: "Automatically created tag".to_string(),
            category: category.to_string(),
            display_order: 0,
            display_name: format!("&7Tag: {}", TAG_PLACEHOLDER),
            display_item: DEFAULT_MATERIAL.to_string(),
            cost: 0,
            is_from_yaml: false,
        }
    }

    pub fn key(&self) -> String {
        catalog_key(&self.name)
    }

    pub fn is_default(&self) -> bool {
        is_default(&self.name)
    }

    pub fn rendered_display_name(&self) -> String {
        self.display_name.replace(TAG_PLACEHOLDER, &self.display_tag)
    }

    pub fn is_free(&self) -> bool {
        self.cost <= 0
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_length_and_charset_rules() {
        assert!(validate_category_name("vip").is_ok());
        assert!(validate_category_name("a_b_9").is_ok());
        assert!(validate_category_name("x").is_err());
        assert!(validate_category_name("sixteen_chars_xx").is_err());
        assert!(validate_tag_name("twenty_characters_ab").is_ok());
        assert!(validate_tag_name("twenty_one_characters").is_err());
        assert_eq!(
            validate_tag_name("no-dash"),
            Err(NameError::Charset { kind: "tag" })
        );
        assert!(validate_tag_name("ñandu").is_err());
    }

    #[test]
    fn placeholders_are_rendered() {
        let category = Category::with_defaults("vip", None);
        assert_eq!(category.page_title(2), "&8Vip Tags (Page 2)");
        assert_eq!(category.rendered_lore(4)[1], "&7Vip tags: &74");
        assert_eq!(
            category.permission.as_deref(),
            Some("grvtags.category.vip")
        );

        let tag = Tag::with_defaults("Gold", "vip");
        assert_eq!(tag.rendered_display_name(), "&7Tag: &8[&7Gold&8]");
        assert_eq!(tag.key(), "gold");
        assert!(tag.is_free());
    }

    #[test]
    fn hidden_categories_require_permission() {
        let mut category = Category::with_defaults("staff", None);
        assert!(category.visible_to(|_| false));
        category.permission_see_category = true;
        assert!(!category.visible_to(|_| false));
        assert!(category.visible_to(|node| node == "grvtags.category.staff"));
    }
}
