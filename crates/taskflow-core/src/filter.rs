use thiserror::Error;

use crate::i18n::{Locale, MessageCatalog};
use crate::models::CoreError;

/// Sortable column names accepted from callers. The table is closed; unknown
/// names fall back to the default ordering instead of failing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortColumn {
    ProcessName,
    ProcessCode,
    ProcessStep,
    Creator,
    Assignee,
    CreateDate,
}

impl SortColumn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::ProcessName),
            "code" => Some(Self::ProcessCode),
            "step" => Some(Self::ProcessStep),
            "creator" => Some(Self::Creator),
            "assignee" => Some(Self::Assignee),
            "creationDate" => Some(Self::CreateDate),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Owner-scoped queue categories, derived from the queue name in "process"
/// mode. The table is closed; unknown names are a caller error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueueCategory {
    Assigned,
    Created,
}

impl QueueCategory {
    pub fn from_queue_id(queue_id: &str) -> Option<Self> {
        match queue_id {
            "assigned" => Some(Self::Assigned),
            "created" => Some(Self::Created),
            _ => None,
        }
    }
}

/// Which derived queue the listing is scoped to. `Queue` and `Process` are
/// mutually exclusive filter modes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueueMode {
    Any,
    Queue { name: String },
    Process { owner: String, category: QueueCategory },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum FilterError {
    #[error("page offset must not be negative, got {0}")]
    NegativeOffset(i64),
    #[error("page length must be positive, got {0}")]
    NonPositiveLength(i64),
    #[error("unknown process queue id")]
    UnknownQueueCategory,
}

impl From<FilterError> for CoreError {
    fn from(error: FilterError) -> Self {
        CoreError::validation(error.to_string())
    }
}

/// A validated page window. Construction rejects malformed paging before any
/// store access.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageWindow {
    pub offset: u64,
    pub length: u64,
}

impl PageWindow {
    pub fn new(offset: i64, length: i64) -> Result<Self, FilterError> {
        if offset < 0 {
            return Err(FilterError::NegativeOffset(offset));
        }
        if length <= 0 {
            return Err(FilterError::NonPositiveLength(length));
        }
        Ok(Self {
            offset: offset as u64,
            length: length as u64,
        })
    }
}

/// Caller-supplied queue criteria. Stateless and rebuilt per request;
/// `build` produces the opaque query the store consumes and performs no I/O.
#[derive(Clone, Debug, Default)]
pub struct ProcessInstanceFilter {
    expression: Option<String>,
    locale: Locale,
    mode: Option<QueueMode>,
    process_key: Option<String>,
    sort_column: Option<SortColumn>,
    sort_descending: bool,
}

impl ProcessInstanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty and whitespace-only expressions are ignored.
    pub fn with_expression(mut self, expression: &str) -> Self {
        let trimmed = expression.trim();
        if !trimmed.is_empty() {
            self.expression = Some(trimmed.to_string());
        }
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn for_queue(mut self, queue_name: &str) -> Self {
        self.mode = Some(QueueMode::Queue {
            name: queue_name.to_string(),
        });
        self
    }

    pub fn for_owner_queue(mut self, owner_login: &str, queue_id: &str) -> Result<Self, FilterError> {
        let category =
            QueueCategory::from_queue_id(queue_id).ok_or(FilterError::UnknownQueueCategory)?;
        self.mode = Some(QueueMode::Process {
            owner: owner_login.to_string(),
            category,
        });
        Ok(self)
    }

    pub fn with_process_key(mut self, process_key: &str) -> Self {
        self.process_key = Some(process_key.to_string());
        self
    }

    /// Unknown column names map to no explicit order; the store then applies
    /// the default ordering (creation date descending).
    pub fn sorted_by(mut self, column_name: &str, direction: SortDirection) -> Self {
        self.sort_column = SortColumn::from_name(column_name);
        self.sort_descending = direction == SortDirection::Descending;
        self
    }

    pub fn build(&self, catalog: &MessageCatalog) -> TaskQuery {
        let label_matched_definitions = match &self.expression {
            Some(expression) => {
                catalog.definitions_with_label_matching(&self.locale, expression)
            }
            None => Vec::new(),
        };
        let mode = self.mode.clone().unwrap_or(QueueMode::Any);
        let owner_for_display = match &mode {
            QueueMode::Process { owner, .. } => Some(owner.clone()),
            _ => None,
        };

        TaskQuery {
            mode,
            process_key: self.process_key.clone(),
            expression: self.expression.clone(),
            label_matched_definitions,
            sort_column: self.sort_column,
            sort_direction: if self.sort_descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
            owner_for_display,
        }
    }
}

/// The opaque criteria value consumed by the process instance store. Locale
/// sensitivity is folded into `label_matched_definitions` at build time, so
/// the store never consults the locale itself.
#[derive(Clone, Debug)]
pub struct TaskQuery {
    pub(crate) mode: QueueMode,
    pub(crate) process_key: Option<String>,
    pub(crate) expression: Option<String>,
    pub(crate) label_matched_definitions: Vec<String>,
    pub(crate) sort_column: Option<SortColumn>,
    pub(crate) sort_direction: SortDirection,
    pub(crate) owner_for_display: Option<String>,
}

impl TaskQuery {
    pub fn queue_name(&self) -> Option<&str> {
        match &self.mode {
            QueueMode::Queue { name } => Some(name),
            _ => None,
        }
    }

    /// Owner recorded for downstream display when listing in process mode.
    pub fn owner_for_display(&self) -> Option<&str> {
        self.owner_for_display.as_deref()
    }
}
