use std::collections::BTreeMap;
use std::time::SystemTime;

/// Reserved simple-attribute name. Values supplied under this key are routed
/// to the dedicated external-key field, never into the generic mapping.
pub const EXTERNAL_KEY_PROPERTY: &str = "externalKey";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// One running execution of a process definition. Owns its tasks over time;
/// mutated only by the action executor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessInstance {
    id: InstanceId,
    definition_id: String,
    creator_login: String,
    external_key: Option<String>,
    simple_attributes: BTreeMap<String, String>,
    created_at: SystemTime,
}

impl ProcessInstance {
    pub(crate) fn from_parts(
        id: InstanceId,
        definition_id: String,
        creator_login: String,
        external_key: Option<String>,
        simple_attributes: BTreeMap<String, String>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id,
            definition_id,
            creator_login,
            external_key,
            simple_attributes,
            created_at,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn creator_login(&self) -> &str {
        &self.creator_login
    }

    pub fn external_key(&self) -> Option<&str> {
        self.external_key.as_deref()
    }

    pub fn simple_attribute(&self, name: &str) -> Option<&str> {
        self.simple_attributes.get(name).map(String::as_str)
    }

    pub fn simple_attributes(&self) -> &BTreeMap<String, String> {
        &self.simple_attributes
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}
