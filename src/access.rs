//! Upload access key and the client-side config section advertising it
//!
//! The key lives for the whole process and is regenerated on restart. It
//! only has to be unguessable; the capture side validates uploads.

use std::fmt::Write as _;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;

/// Label of the section appended to the client options blob
pub const CONFIG_SECTION: &str = "ReplayReport";

static ACCESS_KEY: OnceLock<String> = OnceLock::new();

/// The process-wide access key, generated on first use
pub fn access_key() -> &'static str {
    ACCESS_KEY.get_or_init(|| uuid::Uuid::new_v4().simple().to_string())
}

/// What clients need to know to upload a clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfigSection {
    pub upload_url: String,
    pub duration_secs: u64,
}

impl ClientConfigSection {
    pub fn new(ip: IpAddr, port: u16, key: &str, duration_secs: u64) -> Self {
        Self {
            upload_url: upload_url(ip, port, key),
            duration_secs,
        }
    }

    /// Render as a labelled key/value block
    ///
    /// ```text
    /// "ReplayReport"
    /// {
    /// 	"UPLOAD_URL"	"http://203.0.113.7:27015/replay/upload/<key>"
    /// 	"DURATION"	"30"
    /// }
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\"{}\"", CONFIG_SECTION);
        out.push_str("{\n");
        let _ = writeln!(out, "\t\"UPLOAD_URL\"\t\"{}\"", self.upload_url);
        let _ = writeln!(out, "\t\"DURATION\"\t\"{}\"", self.duration_secs);
        out.push_str("}\n");
        out
    }
}

/// Upload endpoint for a host address and key
pub fn upload_url(ip: IpAddr, port: u16, key: &str) -> String {
    format!("http://{}/replay/upload/{}", SocketAddr::new(ip, port), key)
}
