//! Unique stream names, so concurrent runs never collide on the server.

use rand::Rng;

/// `{prefix}-{pid}-{random}`.
pub fn new_stream_id(prefix: &str) -> String {
    let nonce: u32 = rand::thread_rng().r#gen();
    format!("{}-{}-{}", prefix, std::process::id(), nonce)
}

/// File name of the analyzer's capture for `stream_id`.
pub fn dvr_file_name(stream_id: &str) -> String {
    format!("streamcheck-{stream_id}.flv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_layout() {
        let id = new_stream_id("stream");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "stream");
        assert_eq!(parts[1], std::process::id().to_string());
        assert!(parts[2].parse::<u32>().is_ok());
    }

    #[test]
    fn test_dvr_file_name() {
        assert_eq!(dvr_file_name("stream-1-2"), "streamcheck-stream-1-2.flv");
    }
}
