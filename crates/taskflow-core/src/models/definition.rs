/// A published class of process. Referenced by instances and tasks,
/// never owned by them; immutable once registered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessDefinitionConfig {
    pub id: String,
    pub definition_key: String,
    pub description: String,
    pub enabled: bool,
}
