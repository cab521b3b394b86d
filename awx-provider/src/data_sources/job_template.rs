//! Job template data source
//!
//! Besides the lookup attributes this exposes the provisioning callback and,
//! when the template's survey is enabled, its questions.

use std::collections::HashMap;

use awx_core::provider::ProviderResult;
use awx_core::resource::{Resource, State, Value};

use super::{NameLookup, first_match, lookup_error};
use crate::api::models::{SurveyQuestion, SurveySpec};
use crate::provider::AwxProvider;
use crate::schemas::data_sources::job_template_schema;

fn question_value(question: &SurveyQuestion) -> Value {
    let default = match &question.default {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Value::Map(HashMap::from([
        ("variable".to_string(), Value::String(question.variable.clone())),
        (
            "question_name".to_string(),
            Value::String(question.question_name.clone()),
        ),
        ("type".to_string(), Value::String(question.question_type.clone())),
        ("required".to_string(), Value::String(question.required.to_string())),
        ("default".to_string(), Value::String(default)),
    ]))
}

/// Survey questions as a list of string maps
pub fn survey_value(spec: &SurveySpec) -> Value {
    Value::List(spec.spec.iter().map(question_value).collect())
}

impl AwxProvider {
    pub(crate) async fn read_job_template_data_source(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let lookup = NameLookup::from_resource(&job_template_schema(), resource)?;
        let templates = self
            .api()
            .list_job_templates(&lookup.filters())
            .await
            .map_err(lookup_error(resource))?;

        let survey = match templates.first() {
            Some(template) if template.survey_enabled => self
                .api()
                .get_survey_spec(template.id)
                .await
                .map_err(lookup_error(resource))?,
            _ => None,
        };

        Ok(first_match(resource, templates, |template| {
            let mut attrs = HashMap::new();
            attrs.insert(
                "prompt_inventory".to_string(),
                Value::Bool(template.ask_inventory_on_launch),
            );
            attrs.insert(
                "host_config_key".to_string(),
                Value::String(template.host_config_key.clone()),
            );
            attrs.insert(
                "callback_url".to_string(),
                Value::String(template.related.callback.clone().unwrap_or_default()),
            );
            if let Some(survey) = &survey {
                attrs.insert("survey_spec".to_string(), survey_value(survey));
            }
            attrs
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn survey_questions_become_string_maps() {
        let spec: SurveySpec = serde_json::from_value(json!({
            "name": "",
            "description": "",
            "spec": [
                {"variable": "release", "question_name": "Release?", "type": "text",
                 "required": true, "default": "v1"},
                {"variable": "count", "question_name": "How many?", "type": "integer",
                 "required": false, "default": 3}
            ]
        }))
        .unwrap();

        let Value::List(questions) = survey_value(&spec) else {
            panic!("expected list");
        };
        assert_eq!(questions.len(), 2);
        let Value::Map(first) = &questions[0] else {
            panic!("expected map");
        };
        assert_eq!(first["variable"], Value::String("release".to_string()));
        assert_eq!(first["required"], Value::String("true".to_string()));
        let Value::Map(second) = &questions[1] else {
            panic!("expected map");
        };
        assert_eq!(second["default"], Value::String("3".to_string()));
        assert_eq!(second["type"], Value::String("integer".to_string()));
    }
}
