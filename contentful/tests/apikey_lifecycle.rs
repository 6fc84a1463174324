mod common;

use mockito::{Matcher, Server};
use tfplug::resource::{
    CreateResourceRequest, DeleteResourceRequest, ReadResourceRequest, UpdateResourceRequest,
};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tfplug::Resource;

const TYPE_NAME: &str = "contentful_apikey";

fn key_body(version: i64, name: &str, description: &str) -> String {
    format!(
        r#"{{
            "sys": {{
                "id": "key1",
                "type": "ApiKey",
                "version": {},
                "space": {{"sys": {{"id": "space1", "type": "Link", "linkType": "Space"}}}}
            }},
            "name": "{}",
            "description": "{}",
            "accessToken": "delivery-token"
        }}"#,
        version, name, description
    )
}

fn key_config(name: &str, description: &str) -> DynamicValue {
    DynamicValue::new(Dynamic::object([
        ("space_id", Dynamic::from("space1")),
        ("name", Dynamic::from(name)),
        ("description", Dynamic::from(description)),
        ("id", Dynamic::Unknown),
        ("version", Dynamic::Unknown),
        ("access_token", Dynamic::Unknown),
    ]))
}

fn assert_key(state: &DynamicValue, name: &str, description: &str) {
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "key1");
    assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), name);
    assert_eq!(
        state.get_string(&AttributePath::new("description")).unwrap(),
        description
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn apikey_create_update_destroy() {
    let mut server = Server::new_async().await;
    let resource = common::configured(&server.url(), TYPE_NAME).await;

    // create
    let post = server
        .mock("POST", "/spaces/space1/api_keys")
        .match_body(Matcher::Json(serde_json::json!({
            "name": "website",
            "description": "Public site"
        })))
        .with_status(201)
        .with_body(key_body(1, "website", "Public site"))
        .expect(1)
        .create_async()
        .await;

    let config = key_config("website", "Public site");
    let created = resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: config.clone(),
            config,
        })
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_key(&created.new_state, "website", "Public site");
    assert!(!created
        .new_state
        .get(&AttributePath::new("access_token"))
        .unwrap()
        .is_unknown());
    post.assert_async().await;

    // read back
    let get_v1 = server
        .mock("GET", "/spaces/space1/api_keys/key1")
        .with_body(key_body(1, "website", "Public site"))
        .create_async()
        .await;

    let read = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: created.new_state.clone(),
        })
        .await;
    let state = read.new_state.unwrap();
    assert_key(&state, "website", "Public site");

    // update
    let put = server
        .mock("PUT", "/spaces/space1/api_keys/key1")
        .match_header("x-contentful-version", "1")
        .match_body(Matcher::Json(serde_json::json!({
            "name": "website-updated",
            "description": "Public site-updated"
        })))
        .with_body(key_body(2, "website-updated", "Public site-updated"))
        .expect(1)
        .create_async()
        .await;

    let config = key_config("website-updated", "Public site-updated");
    let updated = resource
        .update(UpdateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            prior_state: state,
            planned_state: config.clone(),
            config,
        })
        .await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);
    put.assert_async().await;

    get_v1.remove_async().await;
    let get_v2 = server
        .mock("GET", "/spaces/space1/api_keys/key1")
        .with_body(key_body(2, "website-updated", "Public site-updated"))
        .create_async()
        .await;

    let read = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: updated.new_state,
        })
        .await;
    let state = read.new_state.unwrap();
    assert_key(&state, "website-updated", "Public site-updated");
    assert_eq!(state.get_i64(&AttributePath::new("version")).unwrap(), 2);

    // destroy
    let delete = server
        .mock("DELETE", "/spaces/space1/api_keys/key1")
        .match_header("x-contentful-version", "2")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let deleted = resource
        .delete(DeleteResourceRequest {
            type_name: TYPE_NAME.to_string(),
            prior_state: state.clone(),
        })
        .await;
    assert!(deleted.diagnostics.is_empty(), "{:?}", deleted.diagnostics);
    delete.assert_async().await;

    get_v2.remove_async().await;
    let _gone = server
        .mock("GET", "/spaces/space1/api_keys/key1")
        .with_status(404)
        .with_body(r#"{"sys":{"type":"Error","id":"NotFound"},"message":"The resource could not be found."}"#)
        .create_async()
        .await;

    let read = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: state,
        })
        .await;
    assert!(read.new_state.is_none());
    assert!(read.diagnostics.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn apikey_version_conflict_is_reported() {
    let mut server = Server::new_async().await;
    let resource = common::configured(&server.url(), TYPE_NAME).await;

    let _get = server
        .mock("GET", "/spaces/space1/api_keys/key1")
        .with_body(key_body(3, "website", "Public site"))
        .create_async()
        .await;
    let _put = server
        .mock("PUT", "/spaces/space1/api_keys/key1")
        .with_status(409)
        .with_body(r#"{"sys":{"type":"Error","id":"VersionMismatch"},"message":"Version mismatch"}"#)
        .create_async()
        .await;

    let mut prior = key_config("website", "Public site");
    prior.set_string(&AttributePath::new("id"), "key1").unwrap();
    let config = key_config("renamed", "Public site");
    let response = resource
        .update(UpdateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            prior_state: prior.clone(),
            planned_state: config.clone(),
            config,
        })
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Failed to update API key");
    assert_eq!(response.new_state, prior);
}
