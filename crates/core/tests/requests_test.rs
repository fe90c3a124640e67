// Request pipeline: URL resolution, body encoding, decoding and error translation.

mod test_server;

use amigo::{Body, Error, Payload, RequestOptions, Verb};
use reqwest::StatusCode;
use serde_json::json;
use test_server::TestServer;

#[tokio::test]
async fn post_json_round_trips_through_echo() {
	let server = TestServer::start().await;
	let client = server.client();

	let parsed = client.post("echo", Body::Json(json!({"a": 1})), false).await.unwrap();
	assert_eq!(parsed, Payload::Json(json!({"a": 1})));

	let raw = client.post("/echo", Body::Json(json!({"a": 1})), true).await.unwrap();
	assert_eq!(raw.as_bytes(), Some(&br#"{"a":1}"#[..]));

	server.shutdown();
}

#[tokio::test]
async fn every_mutating_verb_defaults_to_empty_json_object() {
	let server = TestServer::start().await;
	let client = server.client();

	for (verb, name) in [
		(Verb::Post, "POST"),
		(Verb::Put, "PUT"),
		(Verb::Patch, "PATCH"),
		(Verb::Delete, "DELETE"),
	] {
		let payload = client.request(verb, "inspect", RequestOptions::new()).await.unwrap();
		let seen = payload.into_json().unwrap();
		assert_eq!(seen["method"], name);
		assert_eq!(seen["content_type"], "application/json");
		assert_eq!(seen["body"], "{}");
	}

	let seen = client.put("inspect", None, false).await.unwrap();
	assert_eq!(seen.as_json().unwrap()["body"], "{}");
	let seen = client.patch("inspect", None, false).await.unwrap();
	assert_eq!(seen.as_json().unwrap()["method"], "PATCH");
	let seen = client.delete("inspect", None, false).await.unwrap();
	assert_eq!(seen.as_json().unwrap()["method"], "DELETE");

	server.shutdown();
}

#[tokio::test]
async fn form_bodies_are_url_encoded() {
	let server = TestServer::start().await;
	let client = server.client();

	let seen = client
		.post("inspect", Body::form([("name", "a b"), ("kind", "x&y")]), false)
		.await
		.unwrap()
		.into_json()
		.unwrap();

	assert_eq!(seen["content_type"], "application/x-www-form-urlencoded");
	assert_eq!(seen["body"], "name=a+b&kind=x%26y");

	server.shutdown();
}

#[tokio::test]
async fn get_sends_query_and_no_body() {
	let server = TestServer::start().await;
	let client = server.client();

	let seen = client
		.get("inspect", &[("page", "2"), ("q", "roads")], false)
		.await
		.unwrap()
		.into_json()
		.unwrap();

	assert_eq!(seen["method"], "GET");
	assert_eq!(seen["query"], json!({"page": "2", "q": "roads"}));
	assert_eq!(seen["body"], "");
	assert!(seen["content_type"].is_null());
	assert!(seen["authorization"].is_null());

	server.shutdown();
}

#[tokio::test]
async fn absolute_urls_bypass_the_api_root() {
	let server = TestServer::start().await;
	let client = server.client();

	let absolute = format!("{}/api/v1/inspect", server.url());
	let seen = client.get(&absolute, &[], false).await.unwrap();
	assert_eq!(seen.as_json().unwrap()["method"], "GET");
	assert_eq!(server.paths(), ["/api/v1/inspect"]);

	server.shutdown();
}

#[tokio::test]
async fn empty_bodies_decode_to_empty_payload() {
	let server = TestServer::start().await;
	let client = server.client();

	assert!(client.get("empty", &[], false).await.unwrap().is_empty());
	assert_eq!(client.get("empty", &[], true).await.unwrap().as_bytes(), Some(&b""[..]));

	server.shutdown();
}

#[tokio::test]
async fn missing_endpoint_raises_http_error_with_response() {
	let server = TestServer::start().await;
	let client = server.client();

	let err = client.get("does/not/exist", &[], false).await.unwrap_err();

	assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
	let response = err.response().unwrap();
	assert_eq!(response.url, format!("{}/api/v1/does/not/exist", server.url()));
	assert!(err.to_string().starts_with("404 Client Error: Not Found for url:"));

	server.shutdown();
}

#[tokio::test]
async fn error_body_is_kept_for_diagnostics() {
	let server = TestServer::start().await;
	let client = server.client();

	let err = client.get("teapot", &[], true).await.unwrap_err();

	assert_eq!(err.status(), Some(StatusCode::IM_A_TEAPOT));
	assert_eq!(err.response().unwrap().text(), "short and stout");
	assert!(err.to_string().ends_with("\nshort and stout"));

	server.shutdown();
}

#[tokio::test]
async fn non_json_success_is_a_decode_error_unless_raw() {
	let server = TestServer::start().await;
	let client = server.client();

	let err = client.get("not-json", &[], false).await.unwrap_err();
	assert!(matches!(err, Error::Decode { .. }), "got {err:?}");

	let raw = client.get("not-json", &[], true).await.unwrap();
	assert_eq!(raw.as_bytes(), Some(&b"definitely not json"[..]));

	server.shutdown();
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let base_url = format!("http://{}", listener.local_addr().unwrap());
	drop(listener);

	let client = amigo::Client::new(
		amigo::ClientConfig::new("id", "secret")
			.with_base_url(&base_url)
			.with_websockets(false),
	)
	.unwrap();

	let err = client.get("me", &[], false).await.unwrap_err();
	match err {
		Error::Transport { url, .. } => assert_eq!(url, format!("{base_url}/api/v1/me")),
		other => panic!("expected transport error, got {other:?}"),
	}
}
