use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::{debug, info};

use tokenomics_core::{
    DistributionFocus, EconomicModel, InitialSupply, LaunchStrategy, ProjectRequest,
    ProjectType, TargetAudience, UtilityTag,
};

use super::templates::{self, Template};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid form file: {0}")]
    InvalidFile(String),
}

/// Mutable form state. Produces an immutable [`ProjectRequest`] once every
/// required field is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub project_name: String,
    pub project_type: Option<ProjectType>,
    pub target_audience: Option<TargetAudience>,
    pub funding_goals: String,
    pub planned_raise_size: String,
    pub desired_utility: BTreeSet<UtilityTag>,
    pub initial_supply: InitialSupply,
    pub distribution_focus: DistributionFocus,
    pub launch_strategy: LaunchStrategy,
    pub economic_model: EconomicModel,
    pub additional_info: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            project_type: None,
            target_audience: None,
            funding_goals: String::new(),
            planned_raise_size: String::new(),
            desired_utility: BTreeSet::new(),
            initial_supply: InitialSupply::default(),
            distribution_focus: DistributionFocus::Balanced,
            launch_strategy: LaunchStrategy::Gradual,
            economic_model: EconomicModel::Standard,
            additional_info: String::new(),
        }
    }
}

/// On-disk form description: an optional template applied first, then any
/// explicitly given field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormFile {
    pub template: Option<String>,
    pub project_name: Option<String>,
    pub project_type: Option<ProjectType>,
    pub target_audience: Option<TargetAudience>,
    pub funding_goals: Option<String>,
    pub planned_raise_size: Option<String>,
    pub desired_utility: Option<BTreeSet<UtilityTag>>,
    pub initial_supply: Option<InitialSupply>,
    pub distribution_focus: Option<DistributionFocus>,
    pub launch_strategy: Option<LaunchStrategy>,
    pub economic_model: Option<EconomicModel>,
    pub additional_info: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites every templated field. The project name is the user's and
    /// is left alone.
    pub fn apply_template(&mut self, template: &Template) {
        debug!(template = template.name, "Applying form template");

        self.project_type = Some(template.project_type);
        self.target_audience = Some(template.target_audience);
        self.funding_goals = template.funding_goals.to_string();
        self.planned_raise_size = template.planned_raise_size.to_string();
        self.desired_utility = template.desired_utility.iter().copied().collect();
        self.initial_supply = template.initial_supply.clone();
        self.distribution_focus = template.distribution_focus;
        self.launch_strategy = template.launch_strategy;
        self.economic_model = template.economic_model;
        self.additional_info = template.additional_info.to_string();
    }

    pub fn apply_template_named(&mut self, name: &str) -> Result<(), FormError> {
        let template = templates::find(name)
            .ok_or_else(|| FormError::UnknownTemplate(name.to_string()))?;
        self.apply_template(&template);
        Ok(())
    }

    /// Adds the tag if absent, removes it if present.
    pub fn toggle_utility(&mut self, tag: UtilityTag) {
        if !self.desired_utility.remove(&tag) {
            self.desired_utility.insert(tag);
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, FormError> {
        let file: FormFile =
            toml::from_str(content).map_err(|e| FormError::InvalidFile(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_file(file: FormFile) -> Result<Self, FormError> {
        let mut form = Self::new();

        if let Some(name) = &file.template {
            form.apply_template_named(name)?;
        }

        if let Some(v) = file.project_name {
            form.project_name = v;
        }
        if let Some(v) = file.project_type {
            form.project_type = Some(v);
        }
        if let Some(v) = file.target_audience {
            form.target_audience = Some(v);
        }
        if let Some(v) = file.funding_goals {
            form.funding_goals = v;
        }
        if let Some(v) = file.planned_raise_size {
            form.planned_raise_size = v;
        }
        if let Some(v) = file.desired_utility {
            form.desired_utility = v;
        }
        if let Some(v) = file.initial_supply {
            form.initial_supply = v;
        }
        if let Some(v) = file.distribution_focus {
            form.distribution_focus = v;
        }
        if let Some(v) = file.launch_strategy {
            form.launch_strategy = v;
        }
        if let Some(v) = file.economic_model {
            form.economic_model = v;
        }
        if let Some(v) = file.additional_info {
            form.additional_info = v;
        }

        Ok(form)
    }

    /// Enforces required fields and emits the request.
    pub fn build(&self) -> Result<ProjectRequest, FormError> {
        let project_type = self.project_type.ok_or(FormError::MissingField("project_type"))?;
        let target_audience = self
            .target_audience
            .ok_or(FormError::MissingField("target_audience"))?;

        if self.funding_goals.trim().is_empty() {
            return Err(FormError::MissingField("funding_goals"));
        }
        if self.desired_utility.is_empty() {
            return Err(FormError::MissingField("desired_utility"));
        }
        if let InitialSupply::Custom(value) = &self.initial_supply {
            if value.trim().is_empty() {
                return Err(FormError::MissingField("initial_supply"));
            }
        }

        let request = ProjectRequest {
            project_name: non_empty(&self.project_name),
            project_type,
            target_audience,
            funding_goals: self.funding_goals.trim().to_string(),
            planned_raise_size: non_empty(&self.planned_raise_size),
            desired_utility: self.desired_utility.clone(),
            initial_supply: self.initial_supply.clone(),
            distribution_focus: self.distribution_focus,
            launch_strategy: self.launch_strategy,
            economic_model: self.economic_model,
            additional_info: non_empty(&self.additional_info),
        };

        info!(
            project = %request.display_name(),
            project_type = %request.project_type,
            utilities = request.desired_utility.len(),
            "Project request assembled"
        );

        Ok(request)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
