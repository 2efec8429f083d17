//! Intent records and entity normalization
//!
//! An `IntentRecord` is what the external language-understanding step hands
//! over: a goal, a bag of entities and, optionally, an explicit action list.
//! Extractors are inconsistent about key spellings (English and French,
//! singular and plural), so entities are folded onto canonical keys through
//! one explicit table before the planner branches on them.

use indexmap::IndexMap;
use sdk::types::string_list;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured description of what the user wants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct IntentRecord {
    /// Free-text goal (`goal`, or `intent` from older extractors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,

    /// Raw entities, keyed however the extractor spelled them
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub entities: Map<String, Value>,

    /// Explicit ordered action list, if the extractor dictated one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
}

impl IntentRecord {
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entities.insert(key.into(), value);
        self
    }

    pub fn with_actions(mut self, actions: Value) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Goal text, empty when absent
    pub fn goal_text(&self) -> &str {
        self.goal.as_deref().unwrap_or_default()
    }

    /// Entities folded onto canonical keys
    pub fn normalized_entities(&self) -> Entities {
        Entities::normalize(&self.entities)
    }
}

impl From<Value> for IntentRecord {
    /// Never fails: unexpected shapes are coerced or dropped
    fn from(value: Value) -> Self {
        let Value::Object(mut record) = value else {
            return Self::default();
        };

        let goal = ["goal", "intent"]
            .iter()
            .find_map(|k| record.get(*k).filter(|v| !v.is_null()))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        let entities = match record.remove("entities") {
            Some(Value::Object(map)) => map,
            // A bare list of subjects is treated as search keywords
            Some(list @ Value::Array(_)) => {
                let mut map = Map::new();
                map.insert("keywords".to_string(), list);
                map
            }
            _ => Map::new(),
        };

        let actions = record.remove("actions").filter(|v| !v.is_null());

        Self {
            goal,
            entities,
            actions,
        }
    }
}

/// Canonical entity keys the planner branches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKey {
    Keywords,
    DatasetId,
    DatasetName,
    FileFormat,
    DateRange,
    Location,
    Theme,
    Visualisation,
}

/// Every recognized spelling, lower-cased
const ENTITY_SPELLINGS: &[(&str, EntityKey)] = &[
    ("keywords", EntityKey::Keywords),
    ("keyword", EntityKey::Keywords),
    ("query", EntityKey::Keywords),
    ("mot_clé", EntityKey::Keywords),
    ("mot_clés", EntityKey::Keywords),
    ("mots_clés", EntityKey::Keywords),
    ("mot_cle", EntityKey::Keywords),
    ("mots_cles", EntityKey::Keywords),
    ("dataset_id", EntityKey::DatasetId),
    ("dataset", EntityKey::DatasetId),
    ("id", EntityKey::DatasetId),
    ("identifiant", EntityKey::DatasetId),
    ("dataset_name", EntityKey::DatasetName),
    ("nom_dataset", EntityKey::DatasetName),
    ("title", EntityKey::DatasetName),
    ("file_format", EntityKey::FileFormat),
    ("format", EntityKey::FileFormat),
    ("format_fichier", EntityKey::FileFormat),
    ("date_range", EntityKey::DateRange),
    ("période", EntityKey::DateRange),
    ("periode", EntityKey::DateRange),
    ("location", EntityKey::Location),
    ("lieu", EntityKey::Location),
    ("commune", EntityKey::Location),
    ("département", EntityKey::Location),
    ("departement", EntityKey::Location),
    ("department", EntityKey::Location),
    ("region", EntityKey::Location),
    ("région", EntityKey::Location),
    ("theme", EntityKey::Theme),
    ("thème", EntityKey::Theme),
    ("subject", EntityKey::Theme),
    ("visualisation", EntityKey::Visualisation),
    ("visualization", EntityKey::Visualisation),
    ("viz", EntityKey::Visualisation),
    ("chart", EntityKey::Visualisation),
    ("graph", EntityKey::Visualisation),
    ("map", EntityKey::Visualisation),
];

fn canonical_key(spelling: &str) -> Option<EntityKey> {
    ENTITY_SPELLINGS
        .iter()
        .find(|(s, _)| *s == spelling)
        .map(|(_, key)| *key)
}

/// Entities after normalization
///
/// List-valued concepts are `Some` as soon as any spelling of them appeared,
/// even if no usable value survived coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub keywords: Option<Vec<String>>,
    pub dataset_id: Option<Value>,
    pub dataset_name: Option<Value>,
    pub file_format: Option<String>,
    pub date_range: Option<Map<String, Value>>,
    pub location: Option<Value>,
    pub theme: Option<Value>,
    pub visualisation: Option<Vec<String>>,

    /// Unrecognized keys, lower-cased, values verbatim
    pub other: IndexMap<String, Value>,
}

impl Entities {
    pub fn normalize(raw: &Map<String, Value>) -> Self {
        let mut entities = Self::default();

        for (key, value) in raw {
            let lower_key = key.trim().to_lowercase();
            match canonical_key(&lower_key) {
                Some(EntityKey::Keywords) => entities
                    .keywords
                    .get_or_insert_with(Vec::new)
                    .extend(string_list(value)),
                Some(EntityKey::DatasetId) => entities.dataset_id = Some(value.clone()),
                Some(EntityKey::DatasetName) => entities.dataset_name = Some(value.clone()),
                Some(EntityKey::FileFormat) => {
                    let format = match value {
                        Value::String(s) => s.trim().to_lowercase(),
                        other => other.to_string().to_lowercase(),
                    };
                    entities.file_format = Some(format);
                }
                Some(EntityKey::DateRange) => {
                    // Only a {start, end}-style mapping is meaningful
                    if let Value::Object(map) = value {
                        entities.date_range = Some(map.clone());
                    }
                }
                Some(EntityKey::Location) => entities.location = Some(value.clone()),
                Some(EntityKey::Theme) => entities.theme = Some(value.clone()),
                Some(EntityKey::Visualisation) => entities
                    .visualisation
                    .get_or_insert_with(Vec::new)
                    .extend(string_list(value)),
                None => {
                    entities.other.insert(lower_key, value.clone());
                }
            }
        }

        entities
    }

    pub fn has_keywords(&self) -> bool {
        self.keywords.is_some()
    }

    /// Requested visualisations, lower-cased
    pub fn visualisations(&self) -> Vec<String> {
        self.visualisation
            .iter()
            .flatten()
            .map(|v| v.trim().to_lowercase())
            .collect()
    }
}
