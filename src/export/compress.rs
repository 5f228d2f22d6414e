//! Optional gzip compression of export artifacts.
//!
//! Whether gzip is usable is a runtime setting ([`GzipSupport`]). When it is
//! not, or the encoder fails, the export still succeeds with the raw bytes.
//! The branch taken is visible in the returned [`Payload`].

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};

use crate::config::DEFAULT_GZIP_LEVEL;

/// Content type of gzip artifacts.
pub const GZIP_CONTENT_TYPE: &str = "application/gzip";

/// Input is fed to the encoder in chunks of this size.
const GZIP_CHUNK_SIZE: usize = 64 * 1024;

/// Runtime gzip capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GzipSupport {
    /// gzip is available at the given level (0-9)
    Available { level: u32 },
    /// gzip is disabled; compressed requests fall back to raw output
    Unavailable,
}

impl GzipSupport {
    pub fn is_available(&self) -> bool {
        matches!(self, GzipSupport::Available { .. })
    }

    /// The `flate2` level, if gzip is available.
    pub fn compression(&self) -> Option<Compression> {
        match self {
            GzipSupport::Available { level } => Some(Compression::new((*level).min(9))),
            GzipSupport::Unavailable => None,
        }
    }
}

impl Default for GzipSupport {
    fn default() -> Self {
        GzipSupport::Available {
            level: DEFAULT_GZIP_LEVEL,
        }
    }
}

/// Serialized artifact bytes, compressed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Compressed(Vec<u8>),
    Uncompressed(Vec<u8>),
}

impl Payload {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Payload::Compressed(_))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Compressed(bytes) | Payload::Uncompressed(bytes) => bytes,
        }
    }
}

/// Compresses `raw` if gzip is available, otherwise hands it back untouched.
pub fn compress_payload(raw: Vec<u8>, support: GzipSupport) -> Payload {
    let Some(level) = support.compression() else {
        warn!("Compression requested but gzip is unavailable; returning uncompressed output");
        return Payload::Uncompressed(raw);
    };

    match gzip(&raw, level) {
        Ok(compressed) => {
            debug!(
                "Compressed export from {} to {} bytes",
                raw.len(),
                compressed.len()
            );
            Payload::Compressed(compressed)
        }
        Err(e) => {
            warn!("gzip encoding failed ({e}); returning uncompressed output");
            Payload::Uncompressed(raw)
        }
    }
}

fn gzip(raw: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 4 + 64), level);
    for chunk in raw.chunks(GZIP_CHUNK_SIZE) {
        encoder.write_all(chunk)?;
    }
    encoder.finish()
}
