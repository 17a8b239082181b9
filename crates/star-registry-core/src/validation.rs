//! Chain validation: content hashes, links, heights and hash uniqueness.

use std::collections::HashMap;

use crate::block::Block;
use crate::error::ValidationError;
use crate::types::BlockHash;

/// Validate a single block in isolation. Returns every violation found.
pub fn validate_block(block: &Block) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !block.self_validate() {
        errors.push(ValidationError::HashMismatch {
            height: block.height,
            hash: block.hash,
        });
    }
    if block.is_genesis() && block.previous_hash.is_some() {
        errors.push(ValidationError::GenesisHasPrevious(block.hash));
    }
    errors
}

/// Validate a whole chain given in height order.
///
/// Every block is checked; the returned list holds every violation in the
/// order it was found. An empty list means the chain is intact.
pub fn validate_chain(blocks: &[Block]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<BlockHash, u64> = HashMap::with_capacity(blocks.len());

    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;

        if block.height != position {
            errors.push(ValidationError::HeightMismatch {
                hash: block.hash,
                expected: position,
                got: block.height,
            });
        }

        errors.extend(validate_block(block));

        if position > 0 {
            let predecessor = &blocks[(position - 1) as usize];
            if block.previous_hash != Some(predecessor.hash) {
                errors.push(ValidationError::BrokenLink {
                    height: position,
                    hash: block.hash,
                });
            }
        }

        if let Some(&first) = seen.get(&block.hash) {
            errors.push(ValidationError::DuplicateHash {
                hash: block.hash,
                first,
                height: position,
            });
        } else {
            seen.insert(block.hash, position);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPayload;
    use serde_json::json;

    fn build_chain(len: u64) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for height in 0..len {
            let payload = if height == 0 {
                BlockPayload::genesis()
            } else {
                BlockPayload::star(json!({ "n": height }), format!("1Abc:{}:starRegistry", height))
            };
            let prev = blocks.last().map(|b| b.hash);
            blocks.push(Block::create(&payload).seal(height, 1736870400 + height as i64, prev));
        }
        blocks
    }

    #[test]
    fn test_valid_chain() {
        assert!(validate_chain(&build_chain(5)).is_empty());
        assert!(validate_chain(&build_chain(1)).is_empty());
        assert!(validate_chain(&[]).is_empty());
    }

    #[test]
    fn test_tampered_body_breaks_hash_and_next_link() {
        let mut chain = build_chain(4);
        chain[2].body = Block::create(&BlockPayload::star(json!("forged"), "x")).body().clone();

        let errors = validate_chain(&chain);
        assert_eq!(
            errors,
            vec![ValidationError::HashMismatch {
                height: 2,
                hash: chain[2].hash
            }]
        );
    }

    #[test]
    fn test_resealed_block_breaks_successor_link() {
        let mut chain = build_chain(4);
        let forged = Block::create(&BlockPayload::star(json!("forged"), "x")).seal(
            2,
            chain[2].timestamp,
            chain[2].previous_hash,
        );
        chain[2] = forged;

        let errors = validate_chain(&chain);
        assert_eq!(
            errors,
            vec![ValidationError::BrokenLink {
                height: 3,
                hash: chain[3].hash
            }]
        );
    }

    #[test]
    fn test_genesis_with_previous_hash() {
        let genesis = Block::create(&BlockPayload::genesis()).seal(
            0,
            1736870400,
            Some(BlockHash::from_bytes([0x01; 32])),
        );
        let errors = validate_chain(&[genesis.clone()]);
        assert_eq!(errors, vec![ValidationError::GenesisHasPrevious(genesis.hash)]);
    }

    #[test]
    fn test_genesis_reports_every_violation() {
        let mut genesis = Block::create(&BlockPayload::genesis()).seal(
            0,
            1736870400,
            Some(BlockHash::from_bytes([0x01; 32])),
        );
        genesis.timestamp += 1;

        assert_eq!(
            validate_block(&genesis),
            vec![
                ValidationError::HashMismatch {
                    height: 0,
                    hash: genesis.hash
                },
                ValidationError::GenesisHasPrevious(genesis.hash),
            ]
        );
        assert_eq!(validate_chain(&[genesis.clone()]).len(), 2);
    }

    #[test]
    fn test_height_gap() {
        let mut chain = build_chain(2);
        let prev = chain[1].hash;
        chain.push(
            Block::create(&BlockPayload::star(json!(1), "1Abc:1:starRegistry")).seal(5, 0, Some(prev)),
        );

        let errors = validate_chain(&chain);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::HeightMismatch {
                expected: 2,
                got: 5,
                ..
            }]
        ));
    }

    #[test]
    fn test_duplicate_hash_reported() {
        let mut chain = build_chain(3);
        chain.push(chain[1].clone());

        let errors = validate_chain(&chain);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateHash { first: 1, height: 3, .. })));
    }

    #[test]
    fn test_error_messages() {
        let hash = BlockHash::from_bytes([0xab; 32]);
        let invalid = ValidationError::HashMismatch { height: 1, hash };
        assert!(invalid.to_string().contains(&hash.to_hex()));
        assert!(invalid.to_string().contains("is invalid"));

        let link = ValidationError::BrokenLink { height: 1, hash };
        assert!(link.to_string().contains("invalid previous-hash link"));
    }
}
