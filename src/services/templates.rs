//! Templates service
//!
//! Template store adapter: taxonomy validation in front of the repository
//! CRUD, plus default-template resolution per (type, subtype) pair.

use crate::database::{CreateTemplateRequest, Repository, Template, UpdateTemplateRequest};
use crate::error::{AppError, Result};
use crate::taxonomy::{self, TemplateSubtype, TemplateType};

/// Service for managing notification templates
#[derive(Clone)]
pub struct TemplatesService {
    repo: Repository,
}

impl TemplatesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new template. Validation runs before any store write.
    pub async fn create_template(&self, req: CreateTemplateRequest) -> Result<Template> {
        validate_pair(req.template_type, req.subtype)?;
        validate_fields(&req.name, &req.subject, &req.content)?;

        tracing::info!(
            "Creating template '{}' ({}/{})",
            req.name,
            req.template_type,
            req.subtype
        );

        self.repo.create_template(req).await
    }

    /// Get a template by ID
    pub async fn get_template(&self, id: &str) -> Result<Template> {
        self.repo.get_template(id).await
    }

    /// List all templates
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        self.repo.list_templates().await
    }

    /// Update a template (full record). Validation runs before any store write.
    pub async fn update_template(&self, req: UpdateTemplateRequest) -> Result<Template> {
        validate_pair(req.template_type, req.subtype)?;
        validate_fields(&req.name, &req.subject, &req.content)?;

        tracing::debug!("Updating template: {}", req.id);

        self.repo.update_template(req).await
    }

    /// Delete a template
    pub async fn delete_template(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting template: {}", id);

        self.repo.delete_template(id).await
    }

    /// Resolve the default template for a (type, subtype) pair
    pub async fn get_default_template(
        &self,
        template_type: TemplateType,
        subtype: TemplateSubtype,
    ) -> Result<Option<Template>> {
        validate_pair(template_type, subtype)?;

        self.repo.get_default_template(template_type, subtype).await
    }
}

fn validate_pair(template_type: TemplateType, subtype: TemplateSubtype) -> Result<()> {
    if !taxonomy::is_valid_pair(template_type, subtype) {
        return Err(AppError::Validation(format!(
            "Subtype '{}' is not valid for template type '{}'",
            subtype, template_type
        )));
    }
    Ok(())
}

fn validate_fields(name: &str, subject: &str, content: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Template name is required".to_string()));
    }
    if subject.trim().is_empty() {
        return Err(AppError::Validation(
            "Template subject is required".to_string(),
        ));
    }
    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Template content is required".to_string(),
        ));
    }
    Ok(())
}
