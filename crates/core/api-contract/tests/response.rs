use api_contract::ApiResponse;
use serde_json::Value;

#[test]
fn success_envelope_carries_data_without_error() {
    let value = serde_json::to_value(ApiResponse::success("ok")).expect("serialize");
    assert_eq!(value["success"], true);
    assert_eq!(value["data"], "ok");
    assert_eq!(value["error"], Value::Null);
}

#[test]
fn invalid_request_envelope() {
    let value = serde_json::to_value(ApiResponse::<()>::error(
        "INVALID.REQUEST",
        "invalid payload: invalid data: unknown measurement kind 12 at offset 0",
    ))
    .expect("serialize");
    assert_eq!(value["success"], false);
    assert_eq!(value["data"], Value::Null);
    assert_eq!(value["error"]["code"], "INVALID.REQUEST");
    assert!(
        value["error"]["message"]
            .as_str()
            .expect("message")
            .contains("unknown measurement kind")
    );
}

#[test]
fn internal_error_envelope() {
    let value = serde_json::to_value(ApiResponse::<()>::error(
        "INTERNAL.ERROR",
        "ingest failed at resolve",
    ))
    .expect("serialize");
    assert_eq!(value["success"], false);
    assert_eq!(value["data"], Value::Null);
    assert_eq!(value["error"]["code"], "INTERNAL.ERROR");
    assert_eq!(value["error"]["message"], "ingest failed at resolve");
}
