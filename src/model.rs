use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier generated locally for every mapped recipe. Only stable within
/// one process; use `DocumentId` to address a record in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(Uuid);

impl RecipeId {
    pub fn new() -> Self {
        RecipeId(Uuid::new_v4())
    }
}

impl Default for RecipeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier assigned by the remote store when a document is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId(id)
    }
}

/// Recipe category.
///
/// The nine named variants are the only values accepted on submission.
/// Documents written by other clients may carry arbitrary strings; those are
/// kept verbatim in `Other` instead of failing the read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Breakfast,
    Soup,
    Salad,
    Appetizer,
    Main,
    Side,
    Dessert,
    Snack,
    Drink,
    Other(String),
}

impl Category {
    /// Every category a user can pick, in display order
    pub const KNOWN: [Category; 9] = [
        Category::Breakfast,
        Category::Soup,
        Category::Salad,
        Category::Appetizer,
        Category::Main,
        Category::Side,
        Category::Dessert,
        Category::Snack,
        Category::Drink,
    ];

    /// The exact string stored in the `category` field
    pub fn as_str(&self) -> &str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Soup => "Soup",
            Category::Salad => "Salad",
            Category::Appetizer => "Appetizer",
            Category::Main => "Main",
            Category::Side => "Side",
            Category::Dessert => "Dessert",
            Category::Snack => "Snack",
            Category::Drink => "Drink",
            Category::Other(value) => value,
        }
    }

    /// Lenient conversion used when reading documents. Matching is exact and
    /// case-sensitive; anything else becomes `Other`.
    pub fn from_wire(value: &str) -> Self {
        value
            .parse()
            .unwrap_or_else(|_| Category::Other(value.to_string()))
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::KNOWN
            .iter()
            .find(|category| category.as_str() == s)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recipe as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub document_id: Option<DocumentId>,
    pub name: String,
    pub image: String,
    pub ingredients: String,
    pub directions: String,
    pub category: Category,
    pub date_published: String,
    pub chef_name: String,
    pub approved: bool,
}

/// A user-filled submission that has not been persisted yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub ingredients: String,
    pub directions: String,
    pub category: Option<Category>,
    pub chef_name: String,
}

impl RecipeDraft {
    /// Check the draft and return the first unmet constraint.
    ///
    /// Fields are checked in form order: name, chef, category, image,
    /// ingredients, directions.
    pub fn validate(&self) -> Result<ValidatedDraft<'_>, ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.chef_name.is_empty() {
            return Err(ValidationError::EmptyField("chef name"));
        }
        let category = match &self.category {
            None => return Err(ValidationError::MissingCategory),
            Some(Category::Other(value)) if value.is_empty() => {
                return Err(ValidationError::MissingCategory)
            }
            Some(Category::Other(value)) => {
                return Err(ValidationError::UnknownCategory(value.clone()))
            }
            Some(category) => category,
        };
        if self.image.is_empty() {
            return Err(ValidationError::EmptyField("image"));
        }
        if self.ingredients.is_empty() {
            return Err(ValidationError::EmptyField("ingredients"));
        }
        if self.directions.is_empty() {
            return Err(ValidationError::EmptyField("directions"));
        }

        Ok(ValidatedDraft {
            draft: self,
            category,
        })
    }
}

/// A draft that passed `RecipeDraft::validate`
#[derive(Debug, Clone, Copy)]
pub struct ValidatedDraft<'a> {
    pub(crate) draft: &'a RecipeDraft,
    pub(crate) category: &'a Category,
}

impl<'a> ValidatedDraft<'a> {
    pub fn draft(&self) -> &'a RecipeDraft {
        self.draft
    }

    pub fn category(&self) -> &'a Category {
        self.category
    }
}

/// Optional search filters. Absent or empty values match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub name: Option<String>,
    pub chef_name: Option<String>,
    pub category: Option<Category>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn chef_name(mut self, chef_name: impl Into<String>) -> Self {
        self.chef_name = Some(chef_name.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// True when no criterion would constrain the query
    pub fn is_empty(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, str::is_empty);
        blank(&self.name)
            && blank(&self.chef_name)
            && self
                .category
                .as_ref()
                .map_or(true, |category| category.as_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> RecipeDraft {
        RecipeDraft {
            name: "Cranberry Salsa".to_string(),
            image: "https://plantyou.com/wp-content/uploads/2024/11/DSC04576.jpg".to_string(),
            ingredients: "cranberries, jalapeno, lime".to_string(),
            directions: "Pulse everything in a food processor.".to_string(),
            category: Some(Category::Appetizer),
            chef_name: "John Doe".to_string(),
        }
    }

    #[test]
    fn test_category_round_trips_known_values() {
        for category in Category::KNOWN {
            assert_eq!(Category::from_wire(category.as_str()), category);
        }
    }

    #[test]
    fn test_category_is_case_sensitive() {
        assert_eq!(
            Category::from_wire("soup"),
            Category::Other("soup".to_string())
        );
        assert!("soup".parse::<Category>().is_err());
        assert_eq!("Soup".parse::<Category>().unwrap(), Category::Soup);
    }

    #[test]
    fn test_validate_complete_draft() {
        let draft = complete_draft();
        let validated = draft.validate().unwrap();
        assert_eq!(validated.category(), &Category::Appetizer);
        assert_eq!(validated.draft().name, "Cranberry Salsa");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut draft = complete_draft();
        draft.image.clear();
        draft.directions.clear();
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::EmptyField("image")
        );
    }

    #[test]
    fn test_validate_requires_category() {
        let mut draft = complete_draft();
        draft.category = None;
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::MissingCategory
        );

        draft.category = Some(Category::Other("Brunch".to_string()));
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::UnknownCategory("Brunch".to_string())
        );
    }

    #[test]
    fn test_search_criteria_emptiness() {
        assert!(SearchCriteria::new().is_empty());
        assert!(SearchCriteria::new().name("").chef_name("").is_empty());
        assert!(!SearchCriteria::new().chef_name("John Doe").is_empty());
        assert!(!SearchCriteria::new().category(Category::Drink).is_empty());
    }

    #[test]
    fn test_recipe_ids_are_unique() {
        assert_ne!(RecipeId::new(), RecipeId::new());
    }
}
