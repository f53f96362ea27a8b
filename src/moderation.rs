use crate::model::Recipe;

/// Which side of the approved/pending partition a read is allowed to see.
///
/// End-user listings and searches use `Approved`; the admin queue uses
/// `Pending`. Every recipe satisfies exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationState {
    Approved,
    Pending,
}

impl ModerationState {
    /// Value the `approved` field must hold
    pub fn approved(self) -> bool {
        matches!(self, ModerationState::Approved)
    }

    pub fn admits(self, recipe: &Recipe) -> bool {
        recipe.approved == self.approved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, RecipeId};

    fn recipe(approved: bool) -> Recipe {
        Recipe {
            id: RecipeId::new(),
            document_id: None,
            name: "Tomato Soup".to_string(),
            image: String::new(),
            ingredients: "tomatoes".to_string(),
            directions: "simmer".to_string(),
            category: Category::Soup,
            date_published: "2019-11-11".to_string(),
            chef_name: "John Doe".to_string(),
            approved,
        }
    }

    #[test]
    fn test_states_partition_recipes() {
        for approved in [true, false] {
            let recipe = recipe(approved);
            let states = [ModerationState::Approved, ModerationState::Pending];
            let admitted: Vec<ModerationState> = states
                .into_iter()
                .filter(|state| state.admits(&recipe))
                .collect();
            assert_eq!(admitted.len(), 1);
        }
    }

    #[test]
    fn test_query_value_per_state() {
        assert!(ModerationState::Approved.approved());
        assert!(!ModerationState::Pending.approved());
        assert!(ModerationState::Approved.admits(&recipe(true)));
        assert!(ModerationState::Pending.admits(&recipe(false)));
    }
}
