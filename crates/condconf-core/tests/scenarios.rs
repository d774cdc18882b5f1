//! End-to-end evaluation scenarios.

use condconf_config::{DocumentLoader, Environment, SystemEnvironmentSource};
use condconf_core::{EvaluationError, EvaluationWarning, Evaluator, evaluate};
use condconf_protocol::{
    Document, Effect, Level, Node, NodeState, PropertyDirective, ROOT_LOGGER_NAME, Scope,
};
use condconf_test_utils::{
    RecordingSource, environment_with, inline_environment, parse_document, write_file,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn hello_logger() -> Node {
    Node::logger("org.example", "TRACE")
}

fn hello_executed(document: &Document, environment: &Environment) -> bool {
    evaluate(document, environment)
        .level_changes()
        .contains(&("org.example", Some(Level::Trace)))
}

#[test]
fn active_profile_executes_block() {
    let document = Document::new(vec![Node::profile("production", vec![hello_logger()])]);
    assert!(hello_executed(&document, &environment_with(&["production"], &[])));
    assert!(!hello_executed(&document, &environment_with(&["dev"], &[])));
}

#[test]
fn any_listed_profile_executes_block() {
    for profile in ["production", "test"] {
        for name in ["production, test", "production | test"] {
            let document = Document::new(vec![Node::profile(name, vec![hello_logger()])]);
            assert!(
                hello_executed(&document, &environment_with(&[profile], &[])),
                "{name} with {profile}"
            );
        }
    }
}

#[test]
fn profile_expressions_with_operators() {
    let document = Document::new(vec![Node::profile(
        "production & !test",
        vec![hello_logger()],
    )]);
    assert!(hello_executed(&document, &environment_with(&["production"], &[])));
    assert!(!hello_executed(&document, &environment_with(&["production", "test"], &[])));
}

#[test]
fn nested_blocks_need_every_ancestor_active() {
    let document = Document::new(vec![Node::profile(
        "outer",
        vec![Node::profile("inner", vec![hello_logger()])],
    )]);
    let cases: [(&[&str], bool); 4] = [
        (&["outer", "inner"], true),
        (&["outer"], false),
        (&["inner"], false),
        (&[], false),
    ];
    for (profiles, expected) in cases {
        assert_eq!(
            hello_executed(&document, &environment_with(profiles, &[])),
            expected,
            "profiles {profiles:?}"
        );
    }
}

#[test]
fn malformed_gate_under_skipped_block_is_never_parsed() {
    let document = Document::new(vec![Node::profile(
        "outer",
        vec![
            Node::profile("a & b | (", vec![hello_logger()]),
            Node::when("not a condition", vec![], vec![]),
        ],
    )]);
    let evaluation = evaluate(&document, &inline_environment(&[]));

    assert!(evaluation.is_ok());
    assert_eq!(evaluation.state_of("nodes[0]"), Some(NodeState::Skipped));
    assert_eq!(evaluation.state_of("nodes[0].nodes[0]"), Some(NodeState::Skipped));
    assert_eq!(
        evaluation.state_of("nodes[0].nodes[0].nodes[0]"),
        Some(NodeState::Skipped)
    );
    assert_eq!(evaluation.state_of("nodes[0].nodes[1]"), Some(NodeState::Skipped));
}

#[test]
fn default_profile_applies_without_active_profiles() {
    let document = Document::new(vec![Node::profile("default", vec![hello_logger()])]);
    assert!(hello_executed(&document, &inline_environment(&[])));
    assert!(!hello_executed(&document, &environment_with(&["dev"], &[])));
}

#[test]
fn property_directive_binds_relaxed_keys() {
    let document = Document::new(vec![
        Node::property("MINE", "my.example-property"),
        Node::property("SIMPLE", "simple"),
    ]);
    for key in ["my.example-property", "my.EXAMPLE_PROPERTY", "my.exampleProperty"] {
        let evaluation = evaluate(&document, &inline_environment(&[(key, "test")]));
        assert_eq!(evaluation.variable("MINE"), Some("test"), "key {key}");
    }

    let environment = Environment::builder()
        .source(
            0,
            SystemEnvironmentSource::from_vars([("MY_EXAMPLE_PROPERTY", "from-env")]),
        )
        .build();
    assert_eq!(
        evaluate(&document, &environment).variable("MINE"),
        Some("from-env")
    );

    let evaluation = evaluate(&document, &inline_environment(&[]));
    assert_eq!(evaluation.variable("MINE"), None);
    assert_eq!(evaluation.variable("SIMPLE"), None);
    assert_eq!(
        evaluation.warnings[0],
        EvaluationWarning::UnresolvedProperty {
            location: "nodes[0]".to_string(),
            name: "MINE".to_string(),
            source: "my.example-property".to_string(),
        }
    );
}

#[test]
fn property_directive_default_fallback() {
    let document = Document::new(vec![
        PropertyDirective::new("MINE", "my.example-property")
            .with_default("bar")
            .into(),
        PropertyDirective::new("BLANK", "blank").with_default("foo").into(),
        Node::property("EMPTY", "blank"),
    ]);
    let evaluation = evaluate(&document, &inline_environment(&[("blank", "")]));
    assert_eq!(evaluation.variable("MINE"), Some("bar"));
    assert_eq!(evaluation.variable("BLANK"), Some("foo"));
    assert_eq!(evaluation.variable("EMPTY"), Some(""));
    assert!(evaluation.warnings.is_empty());
}

#[test]
fn if_condition_reads_bound_property() {
    let document = parse_document(
        r#"{ "nodes": [
            { "property": { "name": "MINE", "source": "my.example-property" } },
            { "if": {
                "condition": "property(\"MINE\").contains(\"true\")",
                "then": [ { "variable": { "name": "MYCHECK", "value": "i-was-included", "scope": "context" } } ]
            } }
        ] }"#,
    );

    let evaluation = evaluate(&document, &inline_environment(&[("my.example-property", "true")]));
    assert_eq!(evaluation.variable("MYCHECK"), Some("i-was-included"));
    assert_eq!(
        evaluation.context_properties().get("MYCHECK").copied(),
        Some("i-was-included")
    );

    let evaluation = evaluate(&document, &inline_environment(&[("my.example-property", "false")]));
    assert_eq!(evaluation.variable("MYCHECK"), None);
    assert_eq!(evaluation.state_of("nodes[1].then[0]"), Some(NodeState::Skipped));
}

#[test]
fn else_branch_runs_when_condition_is_false() {
    let document = Document::new(vec![Node::when(
        r#"isDefined("feature.flag")"#,
        vec![Node::root("DEBUG")],
        vec![Node::root("WARN")],
    )]);
    let evaluation = evaluate(&document, &inline_environment(&[]));
    assert_eq!(
        evaluation.level_changes(),
        vec![(ROOT_LOGGER_NAME, Some(Level::Warn))]
    );
    assert_eq!(evaluation.state_of("nodes[0].then[0]"), Some(NodeState::Skipped));
    assert_eq!(evaluation.state_of("nodes[0].else[0]"), Some(NodeState::Active));
}

#[test]
fn placeholders_use_variables_then_environment() {
    let document = Document::new(vec![
        Node::variable("APP", "billing"),
        Node::variable("LOG_FILE", "${LOG_DIR:-/tmp}/${APP}.log"),
        Node::logger("org.example", "${app.level}"),
        Node::root("${ROOT_LEVEL}"),
    ]);
    let environment = inline_environment(&[("app.level", "debug")]);
    let evaluation = evaluate(&document, &environment);

    assert_eq!(evaluation.variable("LOG_FILE"), Some("/tmp/billing.log"));
    assert_eq!(
        evaluation.level_changes(),
        vec![("org.example", Some(Level::Debug))]
    );
    assert_eq!(
        evaluation.errors,
        vec![EvaluationError::InvalidLevel {
            level: "ROOT_LEVEL_IS_UNDEFINED".to_string(),
            location: "nodes[3]".to_string(),
            source: condconf_protocol::LevelError("ROOT_LEVEL_IS_UNDEFINED".to_string()),
        }]
    );
    assert_eq!(
        evaluation.warnings,
        vec![EvaluationWarning::UndefinedPlaceholder {
            location: "nodes[3]".to_string(),
            name: "ROOT_LEVEL".to_string(),
        }]
    );
}

#[test]
fn errors_are_collected_and_siblings_continue() {
    let document = Document::new(vec![
        Node::profile("a & b | c", vec![hello_logger()]),
        Node::when("property(\"X\")", vec![], vec![]),
        Node::logger("org.example", "LOUD"),
        Node::root("inherited"),
    ]);
    let evaluation = evaluate(&document, &environment_with(&["a", "b"], &[]));

    let locations: Vec<&str> = evaluation.errors.iter().map(|err| err.location()).collect();
    assert_eq!(locations, vec!["nodes[0]", "nodes[1]", "nodes[2]"]);
    assert!(matches!(
        &evaluation.errors[0],
        EvaluationError::InvalidExpression { expression, .. } if expression == "a & b | c"
    ));
    assert!(matches!(&evaluation.errors[1], EvaluationError::InvalidCondition { .. }));
    assert_eq!(evaluation.state_of("nodes[0]"), Some(NodeState::Failed));
    assert_eq!(evaluation.state_of("nodes[0].nodes[0]"), Some(NodeState::Skipped));
    assert_eq!(evaluation.level_changes(), vec![(ROOT_LOGGER_NAME, None)]);
}

#[test]
fn fail_fast_returns_first_error() {
    let document = Document::new(vec![
        Node::variable("BEFORE", "1"),
        Node::profile("", vec![Node::variable("INSIDE", "0")]),
        Node::variable("AFTER", "2"),
        Node::profile("dev", vec![Node::variable("LATER", "3")]),
    ]);
    let environment = inline_environment(&[]);

    let err = Evaluator::new(&environment)
        .fail_fast(true)
        .run(&document)
        .unwrap_err();
    assert_eq!(err.location(), "nodes[1]");

    let evaluation = Evaluator::new(&environment).fail_fast(true).evaluate(&document);
    assert_eq!(evaluation.variable("BEFORE"), Some("1"));
    assert_eq!(evaluation.variable("AFTER"), None);
    assert_eq!(evaluation.state_of("nodes[1]"), Some(NodeState::Failed));
    assert_eq!(
        evaluation.state_of("nodes[1].nodes[0]"),
        Some(NodeState::Skipped)
    );
    assert_eq!(evaluation.state_of("nodes[2]"), Some(NodeState::Pending));
    assert_eq!(
        evaluation.state_of("nodes[3].nodes[0]"),
        Some(NodeState::Pending)
    );

    let evaluation = Evaluator::new(&environment).run(&document).expect("collected");
    assert_eq!(evaluation.variable("AFTER"), Some("2"));
    assert_eq!(evaluation.errors.len(), 1);
}

#[test]
fn skipped_subtrees_perform_no_lookups() {
    let source = RecordingSource::new(&[("visible", "yes")]);
    let environment = Environment::builder()
        .active_profile("dev")
        .source(10, source.clone())
        .build();
    let document = Document::new(vec![
        Node::profile("production", vec![Node::property("HIDDEN", "hidden.key")]),
        Node::property("VISIBLE", "visible"),
    ]);
    let evaluation = evaluate(&document, &environment);

    assert_eq!(evaluation.variable("VISIBLE"), Some("yes"));
    assert_eq!(source.requests(), vec!["visible".to_string()]);
}

#[test]
fn effects_follow_document_order() {
    let document = Document::new(vec![
        Node::root("INFO"),
        Node::Property(
            PropertyDirective::new("ENV", "deploy.env").with_scope(Scope::Context),
        ),
        Node::profile("prod", vec![Node::logger("org.example", "ERROR")]),
    ]);
    let evaluation = evaluate(
        &document,
        &environment_with(&["prod"], &[("deploy.env", "eu-1")]),
    );
    let effects: Vec<(&str, &Effect)> = evaluation
        .effects
        .iter()
        .map(|executed| (executed.location.as_str(), &executed.effect))
        .collect();
    assert_eq!(
        effects,
        vec![
            (
                "nodes[0]",
                &Effect::SetLevel {
                    logger: ROOT_LOGGER_NAME.to_string(),
                    level: Some(Level::Info)
                }
            ),
            (
                "nodes[1]",
                &Effect::SetProperty {
                    name: "ENV".to_string(),
                    value: "eu-1".to_string(),
                    scope: Scope::Context
                }
            ),
            (
                "nodes[2].nodes[0]",
                &Effect::SetLevel {
                    logger: "org.example".to_string(),
                    level: Some(Level::Error)
                }
            ),
        ]
    );
}

#[test]
fn included_documents_behave_as_if_inline() {
    let temp = TempDir::new().expect("tmp");
    write_file(
        temp.path(),
        "included.json5",
        r#"{ nodes: [
            { property: { name: "MINE", source: "my.example-property" } },
            { profile: { name: "production", nodes: [ { logger: { name: "org.example", level: "TRACE" } } ] } },
        ] }"#,
    );
    let main = write_file(
        temp.path(),
        "main.json5",
        r#"{ nodes: [ { include: { path: "included.json5" } } ] }"#,
    );
    let document = DocumentLoader::new().load_from_path(&main).expect("document");
    let environment = environment_with(&["production"], &[("my.example-property", "test")]);
    let evaluation = evaluate(&document, &environment);

    assert_eq!(evaluation.variable("MINE"), Some("test"));
    assert!(hello_executed(&document, &environment));
}
