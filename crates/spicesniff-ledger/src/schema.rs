use ethers::abi::{self, ParamType, Token};
use ethers::types::{H256, U256};
use ethers::utils::{id, keccak256};

use spicesniff_types::{BatchId, SchemaVersion};

use crate::error::{RegistryError, RegistryResult};
use crate::traits::{RegistryEntry, StoredBatch};

/// Shape of the registry's read accessor return tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadLayout {
    /// `(string batchId, string spice, string cid, uint256 timestamp)`
    IdSpiceCidTimestamp,
    /// `(string spice, string cid, uint256 timestamp)`
    SpiceCidTimestamp,
}

impl ReadLayout {
    fn params(self) -> Vec<ParamType> {
        match self {
            Self::IdSpiceCidTimestamp => vec![
                ParamType::String,
                ParamType::String,
                ParamType::String,
                ParamType::Uint(256),
            ],
            Self::SpiceCidTimestamp => vec![ParamType::String, ParamType::String, ParamType::Uint(256)],
        }
    }
}

/// The one ABI shape a deployment binds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrySchema {
    pub version: SchemaVersion,
    pub write_fn: &'static str,
    pub read_fn: &'static str,
    pub read_layout: ReadLayout,
    pub event: &'static str,
}

const EVENT_PARAMS: [ParamType; 3] = [ParamType::String, ParamType::String, ParamType::String];

fn call_data(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = id(signature).to_vec();
    data.extend(abi::encode(tokens));
    data
}

fn string_token(token: Option<Token>) -> String {
    token.and_then(Token::into_string).unwrap_or_default()
}

impl RegistrySchema {
    pub fn for_version(version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::V1 => Self {
                version,
                write_fn: "addBatch(string,string,string)",
                read_fn: "getBatch(string)",
                read_layout: ReadLayout::IdSpiceCidTimestamp,
                event: "BatchAdded(string,string,string)",
            },
            SchemaVersion::V2 => Self {
                version,
                write_fn: "addBatch(string,string,string)",
                read_fn: "batches(string)",
                read_layout: ReadLayout::SpiceCidTimestamp,
                event: "BatchAdded(string,string,string)",
            },
        }
    }

    pub fn event_topic(&self) -> H256 {
        H256::from(keccak256(self.event))
    }

    pub fn encode_write(&self, entry: &RegistryEntry) -> Vec<u8> {
        call_data(
            self.write_fn,
            &[
                Token::String(entry.batch_id.to_string()),
                Token::String(entry.spice_kind.clone()),
                Token::String(entry.content_id.to_string()),
            ],
        )
    }

    pub fn encode_read(&self, batch_id: &BatchId) -> Vec<u8> {
        call_data(self.read_fn, &[Token::String(batch_id.to_string())])
    }

    /// Decode the read accessor's return data into a [`StoredBatch`].
    pub fn decode_read(&self, data: &[u8]) -> RegistryResult<StoredBatch> {
        let mut tokens = abi::decode(&self.read_layout.params(), data)
            .map_err(|e| RegistryError::Abi(e.to_string()))?
            .into_iter();
        if self.read_layout == ReadLayout::IdSpiceCidTimestamp {
            tokens.next();
        }
        let spice_kind = string_token(tokens.next());
        let content_id = string_token(tokens.next());
        let timestamp = tokens.next().and_then(Token::into_uint).unwrap_or_default();
        if timestamp > U256::from(u64::MAX) {
            return Err(RegistryError::Abi(format!("timestamp {timestamp} exceeds u64 range")));
        }
        Ok(StoredBatch {
            spice_kind,
            content_id,
            timestamp: timestamp.as_u64(),
        })
    }

    /// Decode event data into `(batch_id, spice_kind, content_id)`.
    pub fn decode_event(&self, data: &[u8]) -> RegistryResult<(String, String, String)> {
        let mut tokens = abi::decode(&EVENT_PARAMS, data)
            .map_err(|e| RegistryError::Abi(e.to_string()))?
            .into_iter();
        let batch_id = string_token(tokens.next());
        let spice_kind = string_token(tokens.next());
        let content_id = string_token(tokens.next());
        Ok((batch_id, spice_kind, content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicesniff_types::ContentId;

    fn entry() -> RegistryEntry {
        RegistryEntry {
            batch_id: BatchId::new("TURM2025-01").unwrap(),
            spice_kind: "Turmeric".into(),
            content_id: ContentId::new("QmC1").unwrap(),
        }
    }

    fn strings(values: &[&str]) -> Vec<Token> {
        values.iter().map(|v| Token::String((*v).to_string())).collect()
    }

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(id("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        let schema = RegistrySchema::for_version(SchemaVersion::V1);
        assert_eq!(&schema.encode_write(&entry())[..4], &id("addBatch(string,string,string)"));
    }

    #[test]
    fn versions_differ_only_in_read_accessor() {
        let v1 = RegistrySchema::for_version(SchemaVersion::V1);
        let v2 = RegistrySchema::for_version(SchemaVersion::V2);
        assert_eq!(v1.write_fn, v2.write_fn);
        assert_eq!(v1.event_topic(), v2.event_topic());
        assert_ne!(v1.read_fn, v2.read_fn);
        assert_ne!(v1.encode_read(&entry().batch_id)[..4], v2.encode_read(&entry().batch_id)[..4]);
    }

    #[test]
    fn write_call_carries_arguments() {
        let schema = RegistrySchema::for_version(SchemaVersion::V1);
        let data = schema.encode_write(&entry());
        let args = abi::decode(&EVENT_PARAMS, &data[4..]).unwrap();
        assert_eq!(args, strings(&["TURM2025-01", "Turmeric", "QmC1"]));
    }

    #[test]
    fn decode_v1_read() {
        let schema = RegistrySchema::for_version(SchemaVersion::V1);
        let mut tokens = strings(&["TURM2025-01", "Turmeric", "QmC1"]);
        tokens.push(Token::Uint(U256::from(1_735_689_600u64)));
        let stored = schema.decode_read(&abi::encode(&tokens)).unwrap();
        assert_eq!(stored.spice_kind, "Turmeric");
        assert_eq!(stored.content_id, "QmC1");
        assert_eq!(stored.timestamp, 1_735_689_600);
    }

    #[test]
    fn decode_v2_read() {
        let schema = RegistrySchema::for_version(SchemaVersion::V2);
        let mut tokens = strings(&["Cumin", "QmC2"]);
        tokens.push(Token::Uint(U256::from(42u64)));
        let stored = schema.decode_read(&abi::encode(&tokens)).unwrap();
        assert_eq!(stored.spice_kind, "Cumin");
        assert_eq!(stored.content_id, "QmC2");
        assert_eq!(stored.timestamp, 42);
    }

    #[test]
    fn default_record_decodes_empty() {
        let schema = RegistrySchema::for_version(SchemaVersion::V2);
        let mut tokens = strings(&["", ""]);
        tokens.push(Token::Uint(U256::zero()));
        assert!(schema.decode_read(&abi::encode(&tokens)).unwrap().is_empty());
    }

    #[test]
    fn oversized_timestamp_rejected() {
        let schema = RegistrySchema::for_version(SchemaVersion::V2);
        let mut tokens = strings(&["Cumin", "QmC2"]);
        tokens.push(Token::Uint(U256::MAX));
        let err = schema.decode_read(&abi::encode(&tokens)).unwrap_err();
        assert!(matches!(err, RegistryError::Abi(_)));
    }

    #[test]
    fn truncated_return_data_rejected() {
        let schema = RegistrySchema::for_version(SchemaVersion::V1);
        assert!(matches!(schema.decode_read(&[0u8; 10]), Err(RegistryError::Abi(_))));
        assert!(schema.decode_read(&[]).is_err());
    }

    #[test]
    fn decode_event_data() {
        let schema = RegistrySchema::for_version(SchemaVersion::V1);
        let data = abi::encode(&strings(&["B7", "Saffron", "QmS"]));
        let (id, spice, cid) = schema.decode_event(&data).unwrap();
        assert_eq!((id.as_str(), spice.as_str(), cid.as_str()), ("B7", "Saffron", "QmS"));
    }
}
