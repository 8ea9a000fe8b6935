use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeTemplate};

/// One saved résumé per owner. Replaced wholesale on every save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub user_id: Uuid,
    pub data: Value,
    pub template: String,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn new(
        owner: Uuid,
        document: &ResumeDocument,
        template: ResumeTemplate,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user_id: owner,
            data: serde_json::to_value(document)?,
            template: template.as_str().to_string(),
            updated_at: Utc::now(),
        })
    }

    pub fn document(&self) -> Result<ResumeDocument, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Unknown template tags fall back to the default template.
    pub fn template(&self) -> ResumeTemplate {
        self.template.parse().unwrap_or_else(|e| {
            warn!("Row for {} carries {e}; using default template", self.user_id);
            ResumeTemplate::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_carries_document_and_template() {
        let owner = Uuid::new_v4();
        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.full_name = "Jane Doe".to_string();
        let row = ResumeRow::new(owner, &doc, ResumeTemplate::Minimal).unwrap();
        assert_eq!(row.user_id, owner);
        assert_eq!(row.template(), ResumeTemplate::Minimal);
        assert_eq!(row.document().unwrap(), doc);
    }

    #[test]
    fn test_unknown_template_defaults() {
        let mut row =
            ResumeRow::new(Uuid::new_v4(), &ResumeDocument::skeleton(), ResumeTemplate::Classic)
                .unwrap();
        row.template = "retro".to_string();
        assert_eq!(row.template(), ResumeTemplate::Modern);
    }
}
