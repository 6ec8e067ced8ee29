//! End-to-end engine flow over an in-memory store: a customer-onboarding
//! model with guarded lifecycle transitions, pattern validation rules and
//! relationship contracts.

use latch_core::{Instance, ObjectDefinition, Relationship, RuleRef, ValidationRule};
use latch_engine::{Engine, EngineConfig, EngineError, RelationshipRequest};
use latch_rules::{HttpCaller, HttpRequest, HttpResponse, RuleError, RuleRegistry, ScriptRuntime};
use latch_store::MemoryStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

struct TruthyScript;

#[async_trait]
impl ScriptRuntime for TruthyScript {
    async fn run(&self, _script: &str, _data: &Value) -> Result<Value, RuleError> {
        Ok(Value::Bool(true))
    }
}

struct OfflineHttp;

#[async_trait]
impl HttpCaller for OfflineHttp {
    async fn call(&self, _request: HttpRequest) -> Result<HttpResponse, RuleError> {
        Err(RuleError::ExternalCallFailed {
            reason: "offline".to_string(),
        })
    }
}

fn pessoa_fisica() -> ObjectDefinition {
    ObjectDefinition::from_json(&json!({
        "id": "def-pf",
        "name": "pessoa_fisica",
        "states": {
            "states": ["CADASTRO_PENDENTE", "DOCUMENTOS_ENVIADOS", "ATIVO", "INATIVO"],
            "initial": "CADASTRO_PENDENTE",
            "transitions": [
                {"from": "CADASTRO_PENDENTE", "to": "DOCUMENTOS_ENVIADOS",
                 "guard": "data.cpf != '' && data.rg != ''"},
                {"from": "DOCUMENTOS_ENVIADOS", "to": "ATIVO"},
                {"from": "ATIVO", "to": "INATIVO"}
            ]
        },
        "allowed_relationships": [
            {"type": "TEM_CONTA", "target_definition": "conta_corrente",
             "cardinality": "1:N", "cascade_delete": true},
            {"type": "INDICA", "target_definition": "pessoa_fisica",
             "cardinality": "N:M"}
        ],
        "validation_rules": [
            {"rule_name": "cpf_format"},
            {"rule_name": "rg_format"}
        ]
    }))
    .unwrap()
}

fn conta_corrente() -> ObjectDefinition {
    ObjectDefinition::from_json(&json!({
        "id": "def-cc",
        "name": "conta_corrente",
        "states": {
            "states": ["ABERTA", "ENCERRADA"],
            "initial": "ABERTA",
            "transitions": [{"from": "ABERTA", "to": "ENCERRADA"}]
        },
        "allowed_relationships": [
            {"type": "TEM_CARTAO", "target_definition": "cartao",
             "cardinality": "1:N"}
        ]
    }))
    .unwrap()
}

fn setup() -> (Arc<MemoryStore>, Engine) {
    let store = Arc::new(MemoryStore::new());
    store.put_definition(pessoa_fisica());
    store.put_definition(conta_corrente());

    store.put_rule(ValidationRule::new(
        "rule-1",
        "cpf_format",
        "pattern",
        json!({"field": "cpf", "pattern": r"^\d{11}$", "message": "CPF must be 11 digits"}),
    ));
    store.put_rule(ValidationRule::new(
        "rule-2",
        "rg_format",
        "pattern",
        json!({"field": "rg", "pattern": r"^\d{6,9}$", "message": "RG must be 6 to 9 digits"}),
    ));
    store.put_rule(ValidationRule::new(
        "rule-3",
        "documentos_completos",
        "composite",
        json!({"operator": "AND",
               "rules": [{"rule_name": "cpf_format"}, {"rule_name": "rg_format"}]}),
    ));

    let registry = Arc::new(RuleRegistry::with_builtins(
        Arc::new(TruthyScript),
        Arc::new(OfflineHttp),
        store.clone(),
    ));
    let engine = Engine::new(
        store.clone(),
        store.clone(),
        registry,
        EngineConfig::default(),
    );
    (store, engine)
}

fn rule_ref(name: &str) -> RuleRef {
    RuleRef {
        rule_name: Some(name.to_string()),
        ..RuleRef::default()
    }
}

#[tokio::test]
async fn onboarding_flow_end_to_end() {
    let (store, engine) = setup();
    let data = json!({"cpf": "52998224725", "rg": "1234567", "nome": "Ana"});

    // Data passes the definition's rule list
    let rules = [rule_ref("cpf_format"), rule_ref("rg_format")];
    engine.validate_data(&rules, &data).await.unwrap();

    // Walk the lifecycle
    store.put_instance(Instance::new("p-1", "def-pf", "CADASTRO_PENDENTE", data));
    assert_eq!(
        engine.allowed_transitions("p-1").await.unwrap(),
        vec!["DOCUMENTOS_ENVIADOS"]
    );

    engine
        .transition("p-1", "DOCUMENTOS_ENVIADOS", Some("docs received".to_string()))
        .await
        .unwrap();
    let active = engine.transition("p-1", "ATIVO", None).await.unwrap();
    assert_eq!(active.current_state, "ATIVO");
    assert_eq!(active.version, 3);
    assert_eq!(active.state_history.len(), 2);

    // Open an account and link it
    store.put_instance(Instance::new("c-1", "def-cc", "ABERTA", json!({})));
    engine
        .validate_relationship(&RelationshipRequest {
            relationship_type: "TEM_CONTA".to_string(),
            source_instance_id: "p-1".to_string(),
            target_instance_id: "c-1".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn incomplete_data_blocks_transition_and_fails_rules() {
    let (store, engine) = setup();
    let data = json!({"cpf": "529", "rg": ""});

    // Both rules fail and both failures are reported
    let rules = [rule_ref("cpf_format"), rule_ref("rg_format")];
    let err = engine.validate_data(&rules, &data).await.unwrap_err();
    match err {
        EngineError::Rule(RuleError::Aggregate { failures }) => {
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected aggregate rule failure, got {other:?}"),
    }

    // The guard blocks the lifecycle as well
    store.put_instance(Instance::new("p-1", "def-pf", "CADASTRO_PENDENTE", data));
    let err = engine
        .transition("p-1", "DOCUMENTOS_ENVIADOS", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransitionConditionNotMet { .. }));
}

#[tokio::test]
async fn composite_rule_through_the_facade() {
    let (_store, engine) = setup();

    engine
        .validate_data(
            &[rule_ref("documentos_completos")],
            &json!({"cpf": "52998224725", "rg": "1234567"}),
        )
        .await
        .unwrap();

    let err = engine
        .validate_data(
            &[rule_ref("documentos_completos")],
            &json!({"cpf": "52998224725", "rg": "x"}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_FAILED");
}

#[tokio::test]
async fn cardinality_and_cycles_enforced_across_requests() {
    let (store, engine) = setup();
    for id in ["p-1", "p-2", "p-3"] {
        store.put_instance(Instance::new(id, "def-pf", "ATIVO", json!({})));
    }
    store.put_instance(Instance::new("c-1", "def-cc", "ABERTA", json!({})));
    store.put_instance(Instance::new("c-2", "def-cc", "ABERTA", json!({})));

    let tem_conta = |source: &str, target: &str| RelationshipRequest {
        relationship_type: "TEM_CONTA".to_string(),
        source_instance_id: source.to_string(),
        target_instance_id: target.to_string(),
    };

    // First edge passes; once inserted, 1:N forbids a second from p-1
    engine.validate_relationship(&tem_conta("p-1", "c-1")).await.unwrap();
    store.put_relationship(Relationship::new("r-1", "TEM_CONTA", "p-1", "c-1", json!({})));

    let err = engine
        .validate_relationship(&tem_conta("p-1", "c-2"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CARDINALITY_VIOLATION");

    // INDICA is N:M but acyclic by default
    store.put_relationship(Relationship::new("r-2", "INDICA", "p-1", "p-2", json!({})));
    store.put_relationship(Relationship::new("r-3", "INDICA", "p-2", "p-3", json!({})));

    let err = engine
        .validate_relationship(&RelationshipRequest {
            relationship_type: "INDICA".to_string(),
            source_instance_id: "p-3".to_string(),
            target_instance_id: "p-1".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CycleDetected { .. }));
}

#[tokio::test]
async fn cascade_deletion_flow() {
    let (store, engine) = setup();
    store.put_instance(Instance::new("p-1", "def-pf", "ATIVO", json!({})));
    store.put_instance(Instance::new("c-1", "def-cc", "ABERTA", json!({})));
    store.put_instance(Instance::new("cart-1", "def-cc", "ABERTA", json!({})));

    // p-1 -> c-1 cascades; c-1 has a dependent card edge
    store.put_relationship(Relationship::new("r-1", "TEM_CONTA", "p-1", "c-1", json!({})));
    store.put_relationship(Relationship::new("r-2", "TEM_CARTAO", "c-1", "cart-1", json!({})));

    let err = engine
        .validate_relationship_deletion("r-1", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::CascadeRequired { dependent_count: 1, .. }
    ));

    engine.validate_relationship_deletion("r-1", true).await.unwrap();
    assert_eq!(engine.cascade_delete_ids("r-1").await.unwrap(), vec!["r-2"]);

    // Caller removes the dependent first, then the edge itself
    store.remove_relationship("r-2");
    engine.validate_relationship_deletion("r-1", false).await.unwrap();
}

#[tokio::test]
async fn external_executors_can_be_registered() {
    let (_store, engine) = setup();

    struct AlwaysPass;

    #[async_trait]
    impl latch_rules::RuleExecutor for AlwaysPass {
        async fn execute(
            &self,
            _config: &Value,
            _data: &Value,
            _ctx: &latch_rules::RuleContext<'_>,
        ) -> Result<(), RuleError> {
            Ok(())
        }
    }

    engine.registry().register("webhook", Arc::new(AlwaysPass)).unwrap();
    assert!(engine.registry().rule_types().contains(&"webhook".to_string()));
}
