//! Templates bundled with the binary.

use super::{
    ApiResponse, Template, TemplateQuery, TemplateSource, TemplateUpload,
};
use crate::config::BUILTIN_TEMPLATE_SOURCE;
use crate::error::{Result, StudioError};

const API_DESIGN: &str = "# API Design Guide

## Principles
1. Resources are plural nouns: `/orders`, `/users`
2. HTTP methods carry the action
3. Status codes carry the outcome

## Naming
- Paths: lowercase, hyphen-separated
- Versioning: `/api/v1/<resource>`
- Query parameters: `page`, `limit`, `sort`, `filter`

## Status Codes
| Code | Meaning |
|------|---------|
| 200 | OK |
| 201 | Created |
| 400 | Bad request |
| 401 | Unauthorized |
| 404 | Not found |
| 500 | Server error |
";

const DATABASE_DESIGN: &str = "# Database Design

## Naming
- Tables: lowercase snake_case, plural
- Columns: lowercase snake_case
- Indexes: `idx_<table>_<column>`

## Required Columns
- `id` primary key
- `created_at`, `updated_at`

## Schema

```plantuml
@startuml
entity users {
  * id : bigint
  --
  username : varchar
  created_at : timestamp
}
entity orders {
  * id : bigint
  --
  user_id : bigint
  total : decimal
}
users ||--o{ orders
@enduml
```
";

const PRD: &str = "# Product Requirements

## 1. Background
What problem are we solving, and for whom?

## 2. Goals
- Goal 1
- Goal 2

## 3. Requirements
Describe each feature and its expected behaviour.

## 4. Acceptance Criteria
- [ ] Criterion 1
- [ ] Criterion 2
";

const ARCHITECTURE: &str = "# Architecture Overview

## Context

```plantuml
@startuml
actor User
node \"Web App\" as web
node \"API\" as api
database \"DB\" as db
User --> web
web --> api
api --> db
@enduml
```

## Components
Describe each component and its responsibility.

## Decisions
Record significant decisions and their trade-offs.
";

const SEQUENCE_NOTES: &str = "# Flow Walkthrough

## Actors
- Client
- Service

## Main Flow

```plantuml
@startuml
Client -> Service: request
Service --> Client: response
@enduml
```

## Error Handling
Describe what happens when each step fails.
";

fn template(id: &str, name: &str, description: &str, category: &str, content: &str) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        content: content.to_string(),
        category: Some(category.to_string()),
        tags: Vec::new(),
        author: Some("FlowStudio".to_string()),
        created_at: None,
        updated_at: None,
    }
}

/// The bundled library, in a fixed order.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        template(
            "api-design",
            "API Design Guide",
            "Conventions for RESTful APIs",
            "design",
            API_DESIGN,
        ),
        template(
            "database-design",
            "Database Design",
            "Table naming and schema diagram",
            "design",
            DATABASE_DESIGN,
        ),
        template(
            "prd",
            "Product Requirements",
            "Standard product requirements document",
            "product",
            PRD,
        ),
        template(
            "architecture-overview",
            "Architecture Overview",
            "System context diagram and component notes",
            "architecture",
            ARCHITECTURE,
        ),
        template(
            "flow-walkthrough",
            "Flow Walkthrough",
            "Sequence diagram with error handling notes",
            "architecture",
            SEQUENCE_NOTES,
        ),
    ]
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTemplates;

impl TemplateSource for BuiltinTemplates {
    fn fetch(&self, query: &TemplateQuery) -> Result<Vec<Template>> {
        query.validate()?;
        Ok(query.apply(&builtin_templates()))
    }

    fn get(&self, id: &str) -> Result<Template> {
        builtin_templates()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StudioError::TemplateNotFound(id.to_string()))
    }

    fn upload(&self, template: &TemplateUpload) -> Result<ApiResponse> {
        template.validate()?;
        Err(StudioError::Validation(
            "The bundled template library is read-only; set template-source-url to a template service"
                .to_string(),
        ))
    }

    fn delete(&self, _id: &str) -> Result<ApiResponse> {
        Err(StudioError::Validation(
            "The bundled template library is read-only".to_string(),
        ))
    }

    fn describe(&self) -> String {
        BUILTIN_TEMPLATE_SOURCE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::diagram_blocks;
    use std::collections::HashSet;

    #[test]
    fn test_library_is_deterministic_with_unique_ids() {
        let a = builtin_templates();
        assert_eq!(a, builtin_templates());
        let ids: HashSet<&str> = a.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), a.len());
    }

    #[test]
    fn test_diagram_templates_parse() {
        let arch = BuiltinTemplates.get("architecture-overview").unwrap();
        assert_eq!(diagram_blocks(&arch.content).len(), 1);
    }

    #[test]
    fn test_search_and_category() {
        let found = BuiltinTemplates.fetch(&TemplateQuery::search("DATABASE")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "database-design");

        let design = BuiltinTemplates
            .fetch(&TemplateQuery::in_category("design"))
            .unwrap();
        assert_eq!(design.len(), 2);
    }

    #[test]
    fn test_get_unknown() {
        assert!(matches!(
            BuiltinTemplates.get("nope"),
            Err(StudioError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_read_only() {
        let upload = TemplateUpload {
            id: "x".to_string(),
            name: "X".to_string(),
            description: String::new(),
            content: "# X".to_string(),
        };
        assert!(BuiltinTemplates.upload(&upload).unwrap_err().is_validation());
        assert!(BuiltinTemplates.delete("api-design").is_err());
    }
}
