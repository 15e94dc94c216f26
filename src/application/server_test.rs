use super::is_stream_path;

#[test]
fn it_serves_the_stream_path_only() {
    assert!(is_stream_path("/stream"));

    assert!(!is_stream_path("/"));
    assert!(!is_stream_path("/streaming"));
    assert!(!is_stream_path("/stream/extra"));
    assert!(!is_stream_path("/Stream"));
}
