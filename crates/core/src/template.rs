use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{FormTemplateId, UserId};
use crate::schema::Table;

/// A reusable audit form definition. `content` is opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: FormTemplateId,
    pub name: String,
    pub template_type: String,
    #[serde(default)]
    pub content: serde_json::Value,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for FormTemplate {
    type Id = FormTemplateId;
    const TABLE: Table = Table::FormTemplates;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFormTemplate {
    pub name: String,
    pub template_type: String,
    pub content: serde_json::Value,
    pub created_by: Option<UserId>,
}

impl NewFormTemplate {
    /// New templates start with empty `content`.
    pub fn new(
        name: impl Into<String>,
        template_type: impl Into<String>,
        created_by: Option<UserId>,
    ) -> DomainResult<Self> {
        let (name, template_type) = required(name.into(), template_type.into())?;
        Ok(Self {
            name,
            template_type,
            content: serde_json::Value::Object(Default::default()),
            created_by,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePatch {
    pub name: String,
    pub template_type: String,
    pub updated_at: DateTime<Utc>,
}

impl TemplatePatch {
    pub fn new(
        name: impl Into<String>,
        template_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let (name, template_type) = required(name.into(), template_type.into())?;
        Ok(Self {
            name,
            template_type,
            updated_at: now,
        })
    }
}

fn required(name: String, template_type: String) -> DomainResult<(String, String)> {
    let name = name.trim().to_string();
    let template_type = template_type.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("template name is required"));
    }
    if template_type.is_empty() {
        return Err(DomainError::validation("template type is required"));
    }
    Ok((name, template_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_template_has_empty_object_content() {
        let t = NewFormTemplate::new("Bağımsız Denetim", "audit", None).unwrap();
        assert_eq!(serde_json::to_value(&t).unwrap()["content"], serde_json::json!({}));
    }

    #[test]
    fn type_is_required() {
        assert!(TemplatePatch::new("n", " ", Utc::now()).is_err());
    }
}
