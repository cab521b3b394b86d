//! Job template schema definition

use awx_core::resource::Value;
use awx_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as awx_types;

fn flag(name: &str, description: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::Bool)
        .with_default(false)
        .with_description(description)
}

fn text(name: &str, description: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
        .with_default("")
        .with_description(description)
}

/// Returns the schema for job templates
pub fn job_template_schema() -> ResourceSchema {
    ResourceSchema::new("job_template")
        .with_description("An AWX job template: a playbook run definition bound to a project")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Job template name"),
        )
        .attribute(text("description", "Description of the job template"))
        .attribute(
            AttributeSchema::new("job_type", awx_types::job_type())
                .required()
                .with_normalizer(awx_types::lowercase)
                .with_description("One of: run, check, scan"),
        )
        .attribute(
            AttributeSchema::new("inventory_id", types::id_string())
                .with_description("Inventory to run against; empty clears it"),
        )
        .attribute(
            AttributeSchema::new("project_id", types::id_string())
                .required()
                .with_description("Project containing the playbook"),
        )
        .attribute(text("playbook", "Playbook to execute, relative to the project root"))
        .attribute(
            AttributeSchema::new("credential_id", types::id_string())
                .with_description("Machine credential used to reach the hosts"),
        )
        .attribute(
            AttributeSchema::new("extra_credential_ids", types::id_list())
                .with_description("Additional credential ids attached after every write"),
        )
        .attribute(
            AttributeSchema::new("vault_credential_id", types::id_string())
                .with_description("Vault credential used to decrypt vaulted variables"),
        )
        .attribute(
            AttributeSchema::new("forks", types::non_negative_int())
                .with_default(Value::Int(0))
                .with_description("Parallel processes; 0 uses the Ansible default"),
        )
        .attribute(text("limit", "Host pattern further constraining the inventory"))
        .attribute(
            AttributeSchema::new("verbosity", awx_types::verbosity())
                .with_default(Value::Int(0))
                .with_description("Log level: 0-5"),
        )
        .attribute(text("extra_vars", "Extra variables as YAML or JSON"))
        .attribute(text("job_tags", "Comma-separated tags to run"))
        .attribute(flag("force_handlers", "Force handlers to run"))
        .attribute(text("skip_tags", "Comma-separated tags to skip"))
        .attribute(text("start_at_task", "Task to start the playbook at"))
        .attribute(
            AttributeSchema::new("timeout", types::non_negative_int())
                .with_default(Value::Int(0))
                .with_description("Seconds before the job is cancelled; 0 means no timeout"),
        )
        .attribute(flag("use_fact_cache", "Use and store cached facts"))
        .attribute(
            AttributeSchema::new("host_config_key", AttributeType::String)
                .computed()
                .with_description("Provisioning callback key, set when allow_callbacks is true"),
        )
        .attribute(
            flag("ask_diff_mode_on_launch", "Prompt for diff_mode at launch")
                .conflicts_with("diff_mode"),
        )
        .attribute(flag("ask_limit_on_launch", "Prompt for limit at launch"))
        .attribute(
            flag("ask_tags_on_launch", "Prompt for job_tags at launch").conflicts_with("job_tags"),
        )
        .attribute(
            flag("ask_verbosity_on_launch", "Prompt for verbosity at launch")
                .conflicts_with("verbosity"),
        )
        .attribute(
            flag("ask_inventory_on_launch", "Prompt for the inventory at launch")
                .conflicts_with("inventory_id"),
        )
        .attribute(
            flag("ask_variables_on_launch", "Prompt for extra_vars at launch")
                .conflicts_with("extra_vars"),
        )
        .attribute(flag("ask_credential_on_launch", "Prompt for the credential at launch"))
        .attribute(
            flag("ask_skip_tags_on_launch", "Prompt for skip_tags at launch")
                .conflicts_with("skip_tags"),
        )
        .attribute(flag("ask_job_type_on_launch", "Prompt for job_type at launch"))
        .attribute(flag("survey_enabled", "Enable the job template survey"))
        .attribute(flag("become_enabled", "Run the playbook with privilege escalation"))
        .attribute(flag("diff_mode", "Show textual changes made to templated files"))
        .attribute(flag("allow_simultaneous", "Allow concurrent runs of this template"))
        .attribute(text("custom_virtualenv", "Custom Python virtual environment path"))
        .attribute(
            AttributeSchema::new("job_id", AttributeType::Int)
                .computed()
                .optional_computed()
                .with_description("Id of the job template; when given, locates an existing template"),
        )
        .attribute(
            flag("allow_callbacks", "Enable provisioning callbacks")
                .conflicts_with("ask_inventory_on_launch"),
        )
}
