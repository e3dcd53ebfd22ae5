//! Record encoding: bincode for structure, optional zstd on top.

use crate::StoreError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

/// Bump this value whenever a persisted record layout changes.
pub const RECORD_SCHEMA_VERSION: u16 = 1;

/// Compression codec options for stored records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression.
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }

    /// Encode and compress a record, stamping it with [`RECORD_SCHEMA_VERSION`].
    pub(crate) fn encode<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, StoreError> {
        let envelope = EnvelopeRef {
            schema_version: RECORD_SCHEMA_VERSION,
            body: record,
        };
        let encoded = encode_to_vec(&envelope, standard())?;
        self.compress(&encoded)
    }

    /// Decompress and decode a record written by [`CompressionConfig::encode`].
    pub(crate) fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, StoreError> {
        let decompressed = self.decompress(data)?;
        let (envelope, _): (Envelope<T>, usize) = decode_from_slice(&decompressed, standard())?;
        if envelope.schema_version != RECORD_SCHEMA_VERSION {
            return Err(StoreError::Decode(format!(
                "unsupported record schema version {}",
                envelope.schema_version
            )));
        }
        Ok(envelope.body)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema_version: u16,
    body: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    schema_version: u16,
    body: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        tags: Vec<String>,
    }

    fn sample() -> Sample {
        Sample {
            name: "Contact Form".into(),
            tags: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn both_codecs_decode_what_they_encode() {
        for cfg in [
            CompressionConfig::default(),
            CompressionConfig::default().with_codec(CompressionCodec::None),
        ] {
            let bytes = cfg.encode(&sample()).unwrap();
            let back: Sample = cfg.decode(&bytes).unwrap();
            assert_eq!(back, sample());
        }
    }

    #[test]
    fn foreign_schema_version_is_rejected() {
        let cfg = CompressionConfig::default().with_codec(CompressionCodec::None);
        let stale = EnvelopeRef {
            schema_version: RECORD_SCHEMA_VERSION + 1,
            body: &sample(),
        };
        let bytes = encode_to_vec(&stale, standard()).unwrap();
        let err = cfg.decode::<Sample>(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn garbage_is_a_decode_or_compression_error() {
        let cfg = CompressionConfig::default();
        let err = cfg.decode::<Sample>(b"not a record").unwrap_err();
        assert!(matches!(err, StoreError::Zstd(_) | StoreError::Decode(_)));
    }
}
