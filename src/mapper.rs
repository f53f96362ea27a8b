//! Conversion between store documents and `Recipe` values.
//!
//! Reads and writes go through the same `RECIPE_FIELDS` table so the two
//! directions cannot drift apart.

use serde_json::Value;

use crate::error::MappingError;
use crate::model::{Category, DocumentId, Recipe, RecipeId, ValidatedDraft};
use crate::store::{Fields, RawDocument};

/// Wire names of the recipe document fields
#[derive(Debug, Clone, Copy)]
pub struct RecipeFieldNames {
    pub name: &'static str,
    pub image: &'static str,
    pub ingredients: &'static str,
    pub directions: &'static str,
    pub category: &'static str,
    pub date_published: &'static str,
    pub chef_name: &'static str,
    pub approved: &'static str,
}

pub const RECIPE_FIELDS: RecipeFieldNames = RecipeFieldNames {
    name: "name",
    image: "image",
    ingredients: "ingredients",
    directions: "directions",
    category: "category",
    date_published: "datePublished",
    chef_name: "chefName",
    approved: "approved",
};

/// Decode one store document into a `Recipe`
pub fn map_document(document: &RawDocument) -> Result<Recipe, MappingError> {
    let f = RECIPE_FIELDS;
    let name = required_str(document, f.name)?;
    if name.is_empty() {
        return Err(MappingError::EmptyField {
            document: document.id.clone(),
            field: f.name,
        });
    }

    Ok(Recipe {
        id: RecipeId::new(),
        document_id: Some(DocumentId::new(document.id.clone())),
        name: name.to_string(),
        image: required_str(document, f.image)?.to_string(),
        ingredients: required_str(document, f.ingredients)?.to_string(),
        directions: required_str(document, f.directions)?.to_string(),
        category: Category::from_wire(required_str(document, f.category)?),
        date_published: required_str(document, f.date_published)?.to_string(),
        chef_name: required_str(document, f.chef_name)?.to_string(),
        approved: required_bool(document, f.approved)?,
    })
}

/// Fields written when a draft is first persisted. Always pending.
pub fn submission_fields(draft: &ValidatedDraft<'_>, date_published: &str) -> Fields {
    let f = RECIPE_FIELDS;
    let d = draft.draft();
    let mut fields = Fields::new();
    fields.insert(f.name.to_string(), Value::String(d.name.clone()));
    fields.insert(f.image.to_string(), Value::String(d.image.clone()));
    fields.insert(
        f.ingredients.to_string(),
        Value::String(d.ingredients.clone()),
    );
    fields.insert(f.directions.to_string(), Value::String(d.directions.clone()));
    fields.insert(
        f.category.to_string(),
        Value::String(draft.category().as_str().to_string()),
    );
    fields.insert(
        f.date_published.to_string(),
        Value::String(date_published.to_string()),
    );
    fields.insert(f.chef_name.to_string(), Value::String(d.chef_name.clone()));
    fields.insert(f.approved.to_string(), Value::Bool(false));
    fields
}

/// Partial update that moves a recipe out of the moderation queue
pub fn approval_fields() -> Fields {
    let mut fields = Fields::new();
    fields.insert(RECIPE_FIELDS.approved.to_string(), Value::Bool(true));
    fields
}

fn field<'a>(document: &'a RawDocument, name: &'static str) -> Result<&'a Value, MappingError> {
    document
        .fields
        .get(name)
        .ok_or_else(|| MappingError::MissingField {
            document: document.id.clone(),
            field: name,
        })
}

fn required_str<'a>(document: &'a RawDocument, name: &'static str) -> Result<&'a str, MappingError> {
    field(document, name)?
        .as_str()
        .ok_or_else(|| MappingError::WrongType {
            document: document.id.clone(),
            field: name,
            expected: "string",
        })
}

fn required_bool(document: &RawDocument, name: &'static str) -> Result<bool, MappingError> {
    field(document, name)?
        .as_bool()
        .ok_or_else(|| MappingError::WrongType {
            document: document.id.clone(),
            field: name,
            expected: "boolean",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecipeDraft;
    use serde_json::json;

    fn cranberry_salsa() -> RawDocument {
        let fields = json!({
            "name": "Cranberry Salsa",
            "image": "https://plantyou.com/wp-content/uploads/2024/11/DSC04576.jpg",
            "ingredients": "cranberries, jalapeno, lime",
            "directions": "Pulse everything in a food processor.",
            "category": "Appetizer",
            "datePublished": "2019-11-11",
            "chefName": "John Doe",
            "approved": true
        });
        RawDocument::new("abc123", fields.as_object().cloned().unwrap())
    }

    #[test]
    fn test_map_complete_document() {
        let recipe = map_document(&cranberry_salsa()).unwrap();
        assert_eq!(recipe.document_id, Some(DocumentId::new("abc123")));
        assert_eq!(recipe.name, "Cranberry Salsa");
        assert_eq!(recipe.category, Category::Appetizer);
        assert_eq!(recipe.date_published, "2019-11-11");
        assert_eq!(recipe.chef_name, "John Doe");
        assert!(recipe.approved);
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut document = cranberry_salsa();
        document.fields.remove("chefName");
        assert_eq!(
            map_document(&document).unwrap_err(),
            MappingError::MissingField {
                document: "abc123".to_string(),
                field: "chefName"
            }
        );
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let mut document = cranberry_salsa();
        document
            .fields
            .insert("approved".to_string(), json!("yes"));
        assert!(matches!(
            map_document(&document),
            Err(MappingError::WrongType {
                field: "approved",
                expected: "boolean",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut document = cranberry_salsa();
        document.fields.insert("name".to_string(), json!(""));
        assert!(matches!(
            map_document(&document),
            Err(MappingError::EmptyField { field: "name", .. })
        ));
    }

    #[test]
    fn test_unknown_category_is_preserved() {
        let mut document = cranberry_salsa();
        document.fields.insert("category".to_string(), json!("soup"));
        let recipe = map_document(&document).unwrap();
        assert_eq!(recipe.category, Category::Other("soup".to_string()));
    }

    #[test]
    fn test_submission_fields_match_read_mapping() {
        let draft = RecipeDraft {
            name: "Cranberry Salsa".to_string(),
            image: "https://example.com/salsa.jpg".to_string(),
            ingredients: "cranberries".to_string(),
            directions: "pulse".to_string(),
            category: Some(Category::Appetizer),
            chef_name: "John Doe".to_string(),
        };
        let fields = submission_fields(&draft.validate().unwrap(), "11/11/2019");
        assert_eq!(fields.len(), 8);
        assert_eq!(fields["approved"], json!(false));
        assert_eq!(fields["datePublished"], json!("11/11/2019"));

        let recipe = map_document(&RawDocument::new("new", fields)).unwrap();
        assert_eq!(recipe.name, draft.name);
        assert_eq!(recipe.image, draft.image);
        assert_eq!(recipe.category, Category::Appetizer);
        assert!(!recipe.approved);
    }

    #[test]
    fn test_approval_fields_only_touch_approved() {
        let fields = approval_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["approved"], json!(true));
    }
}
