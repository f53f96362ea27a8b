use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ChefCatalogError;

const BUNDLED_CHEFS: &str = include_str!("../assets/chefs.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub caption: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chef {
    pub name: String,
    #[serde(rename = "utubeChannel")]
    pub channel: String,
    pub videos: Vec<Video>,
}

/// Read-only list of featured chefs, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct ChefCatalog {
    chefs: Vec<Chef>,
}

impl ChefCatalog {
    /// The catalog shipped inside the library
    pub fn bundled() -> Result<Self, ChefCatalogError> {
        Self::from_json(BUNDLED_CHEFS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChefCatalogError> {
        let path = path.as_ref();
        debug!("Loading chefs from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ChefCatalogError> {
        let chefs: Vec<Chef> = serde_json::from_str(json)?;
        Ok(ChefCatalog { chefs })
    }

    pub fn find(&self, name: &str) -> Option<&Chef> {
        self.chefs.iter().find(|chef| chef.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chef> {
        self.chefs.iter()
    }

    pub fn len(&self) -> usize {
        self.chefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chefs.is_empty()
    }
}
