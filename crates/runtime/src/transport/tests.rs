use super::*;

#[test]
fn endpoint_maps_https_to_wss_and_mounts_socket_io() {
	let url = socketio_endpoint("https://www.amigocloud.com", None).unwrap();
	assert_eq!(url.as_str(), "wss://www.amigocloud.com/socket.io/?EIO=3&transport=websocket");
}

#[test]
fn endpoint_applies_port_override_and_drops_base_path() {
	let url = socketio_endpoint("http://localhost:8000/app", Some(5002)).unwrap();
	assert_eq!(url.as_str(), "ws://localhost:5002/socket.io/?EIO=3&transport=websocket");
}

#[test]
fn endpoint_keeps_explicit_base_port() {
	let url = socketio_endpoint("http://127.0.0.1:9000", None).unwrap();
	assert_eq!(url.port(), Some(9000));
}

#[test]
fn endpoint_rejects_non_http_schemes() {
	let err = socketio_endpoint("ftp://example.com", None).unwrap_err();
	assert!(matches!(err, Error::InvalidUrl(_)));
	assert!(socketio_endpoint("not a url", None).is_err());
}

#[tokio::test]
async fn memory_pair_moves_frames_both_ways() {
	let (mut parts, mut peer) = MemoryTransport::pair();

	parts.sender.send("2".to_string()).await.unwrap();
	assert_eq!(peer.next_frame().await.as_deref(), Some("2"));

	assert!(peer.push("3"));
	assert_eq!(parts.frames.recv().await.as_deref(), Some("3"));
}

#[tokio::test]
async fn memory_sender_fails_after_close() {
	let (mut parts, mut peer) = MemoryTransport::pair();

	parts.sender.close().await.unwrap();
	let err = parts.sender.send("2".to_string()).await.unwrap_err();
	assert!(matches!(err, Error::ChannelClosed));
	assert_eq!(peer.next_frame().await, None);
}

#[tokio::test]
async fn hang_up_ends_the_frame_stream() {
	let (mut parts, mut peer) = MemoryTransport::pair();

	peer.hang_up();
	assert!(!peer.push("4x"));
	assert_eq!(parts.frames.recv().await, None);
}
