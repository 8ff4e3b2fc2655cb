use super::*;
use crate::module::test_support::EchoModule;
use iml_core::ModuleStatus as MS;

#[tokio::test]
async fn get_returns_a_registered_module() {
    let registry = ModuleRegistryBuilder::new().register(Arc::new(EchoModule::new("echo"))).build();

    let module = registry.get(&ModuleId::new("echo")).unwrap();
    assert_eq!(module.manifest().module_id, ModuleId::new("echo"));
}

#[tokio::test]
async fn get_on_unknown_module_fails() {
    let registry = ModuleRegistryBuilder::new().build();
    let err = registry.get(&ModuleId::new("ghost")).unwrap_err();
    assert!(matches!(err, EngineError::ModuleNotFound(_)));
}

#[tokio::test]
async fn execute_dispatches_to_the_module() {
    let registry = ModuleRegistryBuilder::new().register(Arc::new(EchoModule::new("echo"))).build();

    let mut params = HashMap::new();
    params.insert("hello".to_string(), Value::String("world".to_string()));
    let result = registry.execute(&ModuleId::new("echo"), "echo", params).await.unwrap();
    assert_eq!(result["hello"], "world");
}

#[test]
fn status_report_distinguishes_module_states() {
    let registry = ModuleRegistryBuilder::new()
        .register(Arc::new(EchoModule::new("ok")))
        .register_load_failed(ModuleId::new("broken"), "missing native lib")
        .build();

    let report = registry.status_report();
    assert_eq!(report.get(&ModuleId::new("ok")), Some(&MS::Active));
    assert!(matches!(report.get(&ModuleId::new("broken")), Some(MS::LoadFailed(_))));
}
