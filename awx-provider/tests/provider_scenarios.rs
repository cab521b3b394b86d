//! End-to-end provider behavior against the in-memory AWX

use std::sync::Arc;
use std::time::Duration;

use awx_core::provider::{ErrorKind, Provider};
use awx_core::resource::{Resource, ResourceId, Value};
use awx_provider::api::models::{SurveyQuestion, SurveySpec};
use awx_provider::api::{Group, Host, JobTemplate, Project};
use awx_provider::{AwxProvider, InMemoryAwx, WaitOptions};
use serde_json::json;

fn fast_wait() -> WaitOptions {
    WaitOptions {
        interval: Duration::from_millis(1),
        timeout: Some(Duration::from_secs(5)),
    }
}

fn setup() -> (Arc<InMemoryAwx>, AwxProvider) {
    let awx = Arc::new(InMemoryAwx::new());
    awx.insert_project(Project {
        id: 5,
        name: "playbooks".to_string(),
        scm_type: "git".to_string(),
        scm_url: "https://example.com/playbooks.git".to_string(),
        ..Default::default()
    });
    let provider = AwxProvider::new(awx.clone()).with_wait_options(fast_wait());
    (awx, provider)
}

fn deploy() -> Resource {
    Resource::new("job_template", "deploy")
        .with_attribute("name", "deploy")
        .with_attribute("job_type", "run")
        .with_attribute("project_id", "5")
        .with_attribute("inventory_id", "12")
        .with_attribute("playbook", "site.yml")
}

fn webservers() -> Resource {
    Resource::new("inventory_group", "web")
        .with_attribute("name", "webservers")
        .with_attribute("inventory_id", "3")
        .with_attribute(
            "child_group_ids",
            Value::List(vec![Value::Int(7), Value::Int(8)]),
        )
}

fn seed_children(awx: &InMemoryAwx) {
    for id in [7, 8] {
        awx.insert_group(Group {
            id,
            name: format!("child-{}", id),
            inventory: Some(3),
            ..Default::default()
        });
    }
}

mod job_template_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_sends_payload_and_reads_back() {
        let (awx, provider) = setup();

        let state = provider.create(&deploy()).await.unwrap();

        let payload = serde_json::Value::Object(awx.payloads()[0].clone());
        assert_eq!(payload["name"], json!("deploy"));
        assert_eq!(payload["project"], json!(5));
        assert_eq!(payload["inventory"], json!(12));
        assert_eq!(payload["job_type"], json!("run"));
        assert_eq!(payload["host_config_key"], json!(""));
        assert!(payload.get("extra_credential_ids").is_none());

        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("101"));
        assert_eq!(state.attributes["name"], Value::String("deploy".to_string()));
        assert_eq!(state.attributes["inventory_id"], Value::String("12".to_string()));
        assert_eq!(state.attributes["allow_callbacks"], Value::Bool(false));
    }

    #[tokio::test]
    async fn test_create_with_cleared_inventory_sends_null() {
        let (awx, provider) = setup();
        let resource = deploy().with_attribute("inventory_id", "");

        let state = provider.create(&resource).await.unwrap();

        assert_eq!(awx.payloads()[0]["inventory"], json!(null));
        assert_eq!(state.attributes["inventory_id"], Value::String(String::new()));
    }

    #[tokio::test]
    async fn test_update_with_cleared_inventory_sends_null() {
        let (awx, provider) = setup();
        let resource = deploy();
        let created = provider.create(&resource).await.unwrap();

        let updated = provider
            .update(
                &resource.id,
                "101",
                &created,
                &resource.clone().with_attribute("inventory_id", ""),
            )
            .await
            .unwrap();

        assert_eq!(awx.payloads()[1]["inventory"], json!(null));
        assert_eq!(awx.job_template(101).unwrap().inventory, None);
        assert_eq!(
            updated.attributes["inventory_id"],
            Value::String(String::new())
        );
    }

    #[tokio::test]
    async fn test_create_waits_for_project_update() {
        let (awx, provider) = setup();
        awx.script_project_update(5, 40, vec![None, None, Some(chrono::Utc::now())]);

        provider.create(&deploy()).await.unwrap();

        let calls = awx.calls();
        let last_poll = calls
            .iter()
            .rposition(|c| c == "get_project_update(40)")
            .unwrap();
        let create = calls
            .iter()
            .position(|c| c == "create_job_template")
            .unwrap();
        assert_eq!(awx.call_count("get_project_update(40)"), 3);
        assert!(last_poll < create);
    }

    #[tokio::test]
    async fn test_update_waits_for_project_update() {
        let (awx, provider) = setup();
        let resource = deploy();
        let created = provider.create(&resource).await.unwrap();
        awx.script_project_update(5, 41, vec![None, Some(chrono::Utc::now())]);

        provider
            .update(
                &resource.id,
                "101",
                &created,
                &resource.clone().with_attribute("playbook", "deploy.yml"),
            )
            .await
            .unwrap();

        let calls = awx.calls();
        let last_poll = calls
            .iter()
            .rposition(|c| c == "get_project_update(41)")
            .unwrap();
        let update = calls
            .iter()
            .position(|c| c == "update_job_template(101)")
            .unwrap();
        assert_eq!(awx.call_count("get_project_update(41)"), 2);
        assert!(last_poll < update);
    }

    #[tokio::test]
    async fn test_create_times_out_on_stuck_project_update() {
        let awx = Arc::new(InMemoryAwx::new());
        awx.script_project_update(5, 40, vec![None]);
        let provider = AwxProvider::new(awx.clone()).with_wait_options(WaitOptions {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(50)),
        });

        let err = provider.create(&deploy()).await.unwrap_err();

        assert!(err.is(ErrorKind::Timeout));
        assert_eq!(err.resource_id, Some(ResourceId::new("job_template", "deploy")));
        assert_eq!(awx.call_count("create_job_template"), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_in_project() {
        let (awx, provider) = setup();
        awx.insert_job_template(JobTemplate {
            id: 11,
            name: "deploy".to_string(),
            project: Some(5),
            ..Default::default()
        });

        let err = provider.create(&deploy()).await.unwrap_err();

        assert!(err.is(ErrorKind::Duplicate));
        assert_eq!(err.identifier.as_deref(), Some("11"));
        assert!(err.message.contains("already exists with id 11"));
        assert_eq!(awx.call_count("create_job_template"), 0);
    }

    #[tokio::test]
    async fn test_create_with_job_id_adopts_existing_template() {
        let (awx, provider) = setup();
        awx.insert_job_template(JobTemplate {
            id: 11,
            name: "old-name".to_string(),
            project: Some(5),
            ..Default::default()
        });

        let state = provider
            .create(&deploy().with_attribute("job_id", Value::Int(11)))
            .await
            .unwrap();

        assert_eq!(awx.call_count("create_job_template"), 0);
        assert_eq!(awx.call_count("update_job_template(11)"), 1);
        assert_eq!(state.identifier.as_deref(), Some("11"));
        assert_eq!(awx.job_template(11).unwrap().name, "deploy");
    }

    #[tokio::test]
    async fn test_callback_key_is_generated_then_kept() {
        let (awx, provider) = setup();
        let resource = deploy().with_attribute("allow_callbacks", true);

        let created = provider.create(&resource).await.unwrap();
        let key = created.attributes["host_config_key"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(!key.is_empty());
        assert_eq!(created.attributes["allow_callbacks"], Value::Bool(true));

        let updated = provider
            .update(
                &resource.id,
                "101",
                &created,
                &resource.clone().with_attribute("description", "nightly"),
            )
            .await
            .unwrap();

        assert_eq!(awx.payloads()[1]["host_config_key"], json!(key));
        assert_eq!(
            updated.attributes["description"],
            Value::String("nightly".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_template_is_not_found() {
        let (_awx, provider) = setup();
        let resource = deploy();
        let from = awx_core::resource::State::not_found(resource.id.clone());

        let err = provider
            .update(&resource.id, "77", &from, &resource)
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::NotFound));
        assert!(err.message.contains("JobTemplate with id 77 doesn't exist"));
    }

    #[tokio::test]
    async fn test_extra_credentials_link_after_create() {
        let (awx, provider) = setup();
        let resource = deploy().with_attribute(
            "extra_credential_ids",
            Value::List(vec![Value::Int(3), Value::Int(4)]),
        );

        let state = provider.create(&resource).await.unwrap();

        assert_eq!(
            state.attributes["extra_credential_ids"],
            Value::List(vec![Value::Int(3), Value::Int(4)])
        );
        assert_eq!(awx.call_count("add_job_template_credential(101"), 2);
    }

    #[tokio::test]
    async fn test_delete_absent_template_is_noop() {
        let (awx, provider) = setup();

        provider
            .delete(&ResourceId::new("job_template", "deploy"), "55")
            .await
            .unwrap();

        assert_eq!(awx.call_count("delete_job_template"), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_template() {
        let (awx, provider) = setup();
        let state = provider.create(&deploy()).await.unwrap();

        provider
            .delete(&state.id, state.identifier.as_deref().unwrap())
            .await
            .unwrap();

        assert!(awx.job_template(101).is_none());
        let state = provider.read(&state.id, Some("101")).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn test_import_reads_existing_template() {
        let (awx, provider) = setup();
        awx.insert_job_template(JobTemplate {
            id: 11,
            name: "deploy".to_string(),
            job_type: "check".to_string(),
            project: Some(5),
            ..Default::default()
        });
        let id = ResourceId::new("job_template", "deploy");

        let state = provider.import(&id, "11").await.unwrap();
        assert_eq!(state.identifier.as_deref(), Some("11"));
        assert_eq!(state.attributes["job_type"], Value::String("check".to_string()));
        assert_eq!(state.attributes["project_id"], Value::String("5".to_string()));

        let err = provider.import(&id, "12").await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }
}

mod inventory_group_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_links_children() {
        let (awx, provider) = setup();
        seed_children(&awx);

        let state = provider.create(&webservers()).await.unwrap();

        assert_eq!(state.identifier.as_deref(), Some("101"));
        assert_eq!(awx.child_ids(101), vec![7, 8]);
        assert_eq!(
            state.attributes["child_group_ids"],
            Value::List(vec![Value::Int(7), Value::Int(8)])
        );
    }

    #[tokio::test]
    async fn test_partial_link_reports_failed_child() {
        let (awx, provider) = setup();
        seed_children(&awx);
        awx.fail_link(8);

        let err = provider.create(&webservers()).await.unwrap_err();

        assert!(err.is(ErrorKind::PartialLink));
        assert_eq!(err.identifier.as_deref(), Some("101"));
        let report = err.link_report.as_ref().unwrap();
        assert_eq!(report.linked, vec![7]);
        assert_eq!(report.failed, Some(8));
        assert!(err.to_string().contains("8"));
        assert_eq!(awx.child_ids(101), vec![7]);
        assert!(awx.group(101).is_some());
    }

    #[tokio::test]
    async fn test_duplicate_group_makes_no_create_call() {
        let (awx, provider) = setup();
        awx.insert_group(Group {
            id: 10,
            name: "webservers".to_string(),
            inventory: Some(3),
            ..Default::default()
        });

        let err = provider.create(&webservers()).await.unwrap_err();

        assert!(err.is(ErrorKind::Duplicate));
        assert_eq!(err.identifier.as_deref(), Some("10"));
        assert_eq!(awx.call_count("create_group"), 0);
    }

    #[tokio::test]
    async fn test_update_does_not_relink_children() {
        let (awx, provider) = setup();
        seed_children(&awx);
        let created = provider.create(&webservers()).await.unwrap();

        let desired = webservers().with_attribute("description", "web tier");
        let updated = provider
            .update(&created.id, "101", &created, &desired)
            .await
            .unwrap();

        assert_eq!(awx.call_count("add_child_group"), 2);
        assert_eq!(
            updated.attributes["description"],
            Value::String("web tier".to_string())
        );
    }

    #[tokio::test]
    async fn test_read_without_identifier_is_absent() {
        let (_awx, provider) = setup();
        let state = provider
            .read(&ResourceId::new("inventory_group", "web"), None)
            .await
            .unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn test_import_unknown_group_is_not_found() {
        let (_awx, provider) = setup();
        let err = provider
            .import(&ResourceId::new("inventory_group", "web"), "404")
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }
}

mod data_source_tests {
    use super::*;

    #[tokio::test]
    async fn test_host_lookup_by_name() {
        let (awx, provider) = setup();
        awx.insert_host(Host {
            id: 21,
            name: "web-1".to_string(),
            description: "frontend".to_string(),
            inventory: Some(3),
            enabled: true,
        });

        let resource = Resource::new("host", "web")
            .with_read_only(true)
            .with_attribute("name", "web-1");
        let state = provider.read_data_source(&resource).await.unwrap();

        assert_eq!(state.attributes["id"], Value::Int(21));
        assert_eq!(state.attributes["enabled"], Value::Bool(true));
        assert_eq!(state.attributes["inventory_id"], Value::Int(3));
    }

    #[tokio::test]
    async fn test_lookup_without_match_is_absent() {
        let (_awx, provider) = setup();
        let resource = Resource::new("project", "missing")
            .with_read_only(true)
            .with_attribute("name", "missing");

        let state = provider.read_data_source(&resource).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn test_group_lookup_scoped_by_inventory() {
        let (awx, provider) = setup();
        for (id, inventory) in [(30, 1), (31, 2)] {
            awx.insert_group(Group {
                id,
                name: "webservers".to_string(),
                inventory: Some(inventory),
                ..Default::default()
            });
        }

        let resource = Resource::new("inventory_group", "web")
            .with_read_only(true)
            .with_attribute("name", "webservers")
            .with_attribute("inventory_id", Value::Int(2));
        let state = provider.read_data_source(&resource).await.unwrap();

        assert_eq!(state.identifier.as_deref(), Some("31"));
    }

    #[tokio::test]
    async fn test_project_lookup_exposes_scm() {
        let (_awx, provider) = setup();
        let resource = Resource::new("project", "playbooks")
            .with_read_only(true)
            .with_attribute("name", "playbooks");

        let state = provider.read_data_source(&resource).await.unwrap();

        assert_eq!(state.attributes["id"], Value::Int(5));
        assert_eq!(state.attributes["scm_type"], Value::String("git".to_string()));
    }

    #[tokio::test]
    async fn test_job_template_lookup_reads_enabled_survey() {
        let (awx, provider) = setup();
        awx.insert_job_template(JobTemplate {
            id: 11,
            name: "deploy".to_string(),
            survey_enabled: true,
            ..Default::default()
        });
        awx.set_survey_spec(
            11,
            SurveySpec {
                spec: vec![SurveyQuestion {
                    variable: "release".to_string(),
                    question_name: "Release".to_string(),
                    question_type: "text".to_string(),
                    required: true,
                    default: json!("latest"),
                }],
                ..Default::default()
            },
        );

        let resource = Resource::new("job_template", "deploy")
            .with_read_only(true)
            .with_attribute("name", "deploy");
        let state = provider.read_data_source(&resource).await.unwrap();

        let Value::List(questions) = &state.attributes["survey_spec"] else {
            panic!("survey_spec should be a list");
        };
        let Value::Map(question) = &questions[0] else {
            panic!("question should be a map");
        };
        assert_eq!(question["variable"], Value::String("release".to_string()));
        assert_eq!(question["required"], Value::String("true".to_string()));
        assert_eq!(question["default"], Value::String("latest".to_string()));
    }

    #[tokio::test]
    async fn test_survey_not_fetched_when_disabled() {
        let (awx, provider) = setup();
        awx.insert_job_template(JobTemplate {
            id: 11,
            name: "deploy".to_string(),
            ..Default::default()
        });

        let resource = Resource::new("job_template", "deploy")
            .with_read_only(true)
            .with_attribute("name", "deploy");
        let state = provider.read_data_source(&resource).await.unwrap();

        assert!(state.exists);
        assert!(!state.attributes.contains_key("survey_spec"));
        assert_eq!(awx.call_count("get_survey_spec"), 0);
    }
}

#[tokio::test]
async fn test_unknown_resource_type_is_unsupported() {
    let (_awx, provider) = setup();
    let err = provider
        .read(&ResourceId::new("credential", "aws"), Some("1"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Unsupported));
}
