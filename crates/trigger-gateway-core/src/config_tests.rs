use super::*;

mod mapping_tests {
    use super::*;

    #[test]
    fn test_parses_long_keys() {
        let mapping: ResourceMapping =
            "group=cd.example.com,version=v1alpha1,kind=Terraform,project=octo/infra"
                .parse()
                .unwrap();

        assert_eq!(mapping.group, "cd.example.com");
        assert_eq!(mapping.version, "v1alpha1");
        assert_eq!(mapping.kind, "Terraform");
        assert_eq!(mapping.project, "octo/infra");
        assert_eq!(mapping.event_prefix(), "terraform");
    }

    #[test]
    fn test_parses_short_keys_with_spaces() {
        let mapping: ResourceMapping = " g=a.io , v=v1 , k=Stack , p=o/r ".parse().unwrap();
        assert_eq!(mapping.kind, "Stack");
        assert!(mapping.matches_kind("stack"));
        assert!(!mapping.matches_kind("stacks"));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let result = "g=a,v=b,k=c,p=d,x=e".parse::<ResourceMapping>();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_missing_field() {
        let result = "g=a,v=b,k=c".parse::<ResourceMapping>();
        assert!(matches!(result, Err(ConfigError::Missing { ref key }) if key == "mapping.project"));
    }

    #[test]
    fn test_rejects_pair_without_value() {
        let result = "g=a,v,k=c,p=d".parse::<ResourceMapping>();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}

mod gateway_config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();

        assert_eq!(config.default_ref(), "refs/heads/master");
        assert_eq!(config.emitted_events, vec!["*"]);
        assert!(config.is_author_allowed("owner"));
        assert!(config.is_author_allowed("MEMBER"));
        assert!(!config.is_author_allowed("CONTRIBUTOR"));
        assert!(!config.is_author_allowed(""));
        assert!(config.app_id().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalized_applies_case_conventions() {
        let config = GatewayConfig {
            allowed_authors: vec![" collaborator".to_string(), "".to_string()],
            emitted_events: vec!["Issue_Comment:Created ".to_string()],
            ..GatewayConfig::default()
        }
        .normalized();

        assert_eq!(config.allowed_authors, vec!["COLLABORATOR"]);
        assert_eq!(config.emitted_events, vec!["issue_comment:created"]);
    }

    #[test]
    fn test_zero_app_id_is_absent() {
        let config = GatewayConfig {
            app_id: Some(0),
            ..GatewayConfig::default()
        };
        assert!(config.app_id().is_none());

        let config = GatewayConfig {
            app_id: Some(17),
            ..GatewayConfig::default()
        };
        assert_eq!(config.app_id(), Some(GitHubAppId::new(17)));
    }

    #[test]
    fn test_validate_rejects_empty_event_list() {
        let config = GatewayConfig {
            emitted_events: Vec::new(),
            ..GatewayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "emitted_events"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = GatewayConfig {
            remote_timeout_seconds: 0,
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_api_url() {
        let config = GatewayConfig {
            github_api_url: "ftp://example.com".to_string(),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mapping_kind_match_is_case_insensitive() {
        let mapping: ResourceMapping = "g=a,v=v1,k=Terraform,p=o/r".parse().unwrap();

        assert!(mapping.matches_kind("terraform"));
        assert!(mapping.matches_kind("TERRAFORM"));
        assert!(!mapping.matches_kind("helm"));
    }

    #[test]
    fn test_deserializes_from_json_with_defaults() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "default_branch": "main",
            "default_shared_secret": "s3cret",
            "mappings": [
                { "group": "a", "version": "v1", "kind": "Stack", "project": "o/r" }
            ]
        }))
        .unwrap();

        assert_eq!(config.default_ref(), "refs/heads/main");
        assert_eq!(config.default_shared_secret.as_ref().unwrap().expose(), b"s3cret");
        assert_eq!(config.mappings.len(), 1);
        assert_eq!(config.remote_timeout(), Duration::from_secs(10));
    }
}

#[test]
fn test_parse_list() {
    assert_eq!(parse_list("a, b,,c ,"), vec!["a", "b", "c"]);
    assert!(parse_list("").is_empty());
}

#[test]
fn test_project_config_into_project() {
    let project: Project = ProjectConfig {
        name: "octo/repo".to_string(),
        shared_secret: SharedSecret::new("x"),
        github_api_url: Some("https://ghe.example.com/api/v3".to_string()),
        github_upload_url: None,
    }
    .into();

    assert_eq!(project.name, "octo/repo");
    assert_eq!(
        project.api_url("https://api.github.com"),
        "https://ghe.example.com/api/v3"
    );
    assert!(project.shared_secret.is_some());
}
