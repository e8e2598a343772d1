//! Service envelopes and the step that strips them.
//!
//! The REST API wraps every record in a resource envelope and every list in
//! a paginated collection. Callers decode pages here and hand the plain
//! records to the engine.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Subject, SubjectData, SubjectType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource<T> {
    #[serde(default)]
    pub id: Option<u64>,
    pub object: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub data_updated_at: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pages {
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub previous_url: Option<String>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection<T> {
    pub object: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pages: Pages,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub data_updated_at: Option<String>,
    pub data: Vec<Resource<T>>,
}

impl<T> Collection<T> {
    pub fn has_next_page(&self) -> bool {
        self.pages.next_url.is_some()
    }

    /// Newest `data_updated_at` over the collection and its resources, for
    /// conditional refetches.
    pub fn latest_update(&self) -> Option<&str> {
        self.data
            .iter()
            .filter_map(|r| r.data_updated_at.as_deref())
            .chain(self.data_updated_at.as_deref())
            .max()
    }
}

pub fn parse_collection<T: DeserializeOwned>(json: &str) -> Result<Collection<T>> {
    Ok(serde_json::from_str(json)?)
}

pub fn unwrap_resources<T>(resources: Vec<Resource<T>>) -> Vec<T> {
    resources.into_iter().map(|r| r.data).collect()
}

pub fn unwrap_collection<T>(collection: Collection<T>) -> Vec<T> {
    unwrap_resources(collection.data)
}

pub fn unwrap_pages<T>(pages: Vec<Collection<T>>) -> Vec<T> {
    pages.into_iter().flat_map(unwrap_collection).collect()
}

/// Build subjects from their envelopes. Resources with an unknown object
/// type or without an id are skipped.
pub fn subjects_from_resources(resources: Vec<Resource<SubjectData>>) -> Vec<Subject> {
    resources
        .into_iter()
        .filter_map(|resource| {
            let subject_type = match resource.object.as_str() {
                "radical" => SubjectType::Radical,
                "kanji" => SubjectType::Kanji,
                "vocabulary" => SubjectType::Vocabulary,
                "kana_vocabulary" => SubjectType::KanaVocabulary,
                other => {
                    tracing::debug!(object = other, "skipping non-subject resource");
                    return None;
                }
            };
            let Some(id) = resource.id else {
                tracing::warn!(object = %resource.object, "subject resource without id");
                return None;
            };
            Some(Subject {
                id,
                level: resource.data.level,
                subject_type,
                component_subject_ids: resource.data.component_subject_ids,
            })
        })
        .collect()
}
