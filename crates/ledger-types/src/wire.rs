//! Protobuf message carried by the subject event feed.

use prost::Message;

/// Feed payload: one action taken on a subject.
#[derive(Clone, PartialEq, Message)]
pub struct SubjectEvent {
    #[prost(string, tag = "1")]
    pub subject_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub email: String,
    #[prost(string, tag = "4")]
    pub event_type: String,
}

impl SubjectEvent {
    /// Decode a raw feed payload. Absent fields decode as empty strings and are
    /// kept as-is; only bytes that fail to parse are an error.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::decode(payload)?)
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] prost::DecodeError),
}
