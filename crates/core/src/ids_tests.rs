use super::*;

#[test]
fn string_id_round_trips_through_display() {
    let id = ActionId::from("a1");
    assert_eq!(id.to_string(), "a1");
    assert_eq!(id, "a1");
}

#[test]
fn string_id_serializes_transparently() {
    let id = ModuleId::new("filesystem");
    let json = serde_json::to_string(&id).expect("serialize");
    assert_eq!(json, "\"filesystem\"");
    let back: ModuleId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, id);
}

#[test]
fn generated_ids_carry_their_prefix() {
    let id = DecisionId::new();
    assert!(id.as_str().starts_with(DecisionId::PREFIX));
    let evt = EventId::new();
    assert!(evt.as_str().starts_with(EventId::PREFIX));
}

#[test]
fn generated_ids_round_trip_from_string() {
    let id = DecisionId::new();
    let parsed = DecisionId::from_string(id.as_str());
    assert_eq!(id, parsed);
}
