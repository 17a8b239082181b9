//! Cryptographic primitives for ownership proofs.
//!
//! Wallet ownership is proven with the Bitcoin signed-message scheme: the
//! wallet signs `"\x18Bitcoin Signed Message:\n" || varint(len) || message`
//! (double SHA-256) with a recoverable secp256k1 signature, and the verifier
//! recovers the public key and compares its HASH160 with the address.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bech32::{hrp, segwit};
use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::SignatureError;

/// Prefix mixed into every signed message digest.
pub const MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Compute the digest a wallet signs for `message`.
pub fn signed_message_digest(message: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(MESSAGE_MAGIC.len() + 9 + message.len());
    buf.extend_from_slice(MESSAGE_MAGIC);
    write_varint(&mut buf, message.len() as u64);
    buf.extend_from_slice(message.as_bytes());

    let once = Sha256::digest(&buf);
    let twice = Sha256::digest(once);
    let mut out = [0u8; 32];
    out.copy_from_slice(&twice);
    out
}

/// RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let rip = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&rip);
    out
}

/// Bitcoin compact-size integer.
fn write_varint(buf: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

/// Which network an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Script type behind an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Pay to public key hash.
    P2pkh,
    /// Pay to script hash.
    P2sh,
    /// Native segwit v0 key hash.
    P2wpkh,
}

/// A decoded address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub kind: AddressKind,
    pub network: Network,
    pub hash: [u8; 20],
}

impl Address {
    /// Parse a base58check or bech32 address.
    ///
    /// Only v0 key-hash programs are accepted from bech32; script-hash and
    /// taproot programs are unsupported.
    pub fn parse(s: &str) -> Result<Self, SignatureError> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("bc1") || lower.starts_with("tb1") || lower.starts_with("bcrt1") {
            return Self::parse_segwit(s);
        }

        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| SignatureError::InvalidAddress(s.to_string()))?;
        if payload.len() != 21 {
            return Err(SignatureError::InvalidAddress(s.to_string()));
        }

        let (kind, network) = match payload[0] {
            0x00 => (AddressKind::P2pkh, Network::Mainnet),
            0x6f => (AddressKind::P2pkh, Network::Testnet),
            0x05 => (AddressKind::P2sh, Network::Mainnet),
            0xc4 => (AddressKind::P2sh, Network::Testnet),
            _ => return Err(SignatureError::UnsupportedAddress(s.to_string())),
        };

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { kind, network, hash })
    }

    fn parse_segwit(s: &str) -> Result<Self, SignatureError> {
        let (prefix, version, program) = segwit::decode(s)
            .map_err(|_| SignatureError::InvalidAddress(s.to_string()))?;

        let network = if prefix == hrp::BC {
            Network::Mainnet
        } else if prefix == hrp::TB {
            Network::Testnet
        } else {
            return Err(SignatureError::UnsupportedAddress(s.to_string()));
        };
        if version != segwit::VERSION_0 || program.len() != 20 {
            return Err(SignatureError::UnsupportedAddress(s.to_string()));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&program);
        Ok(Self {
            kind: AddressKind::P2wpkh,
            network,
            hash,
        })
    }

    /// Legacy pay-to-public-key-hash address for a key.
    pub fn p2pkh(pubkey: &PublicKey, compressed: bool, network: Network) -> Self {
        let hash = if compressed {
            hash160(&pubkey.serialize())
        } else {
            hash160(&pubkey.serialize_uncompressed())
        };
        Self {
            kind: AddressKind::P2pkh,
            network,
            hash,
        }
    }

    /// Segwit v0 key hash wrapped in a script hash (`3...` / `2...` addresses).
    pub fn p2sh_p2wpkh(pubkey: &PublicKey, network: Network) -> Self {
        Self {
            kind: AddressKind::P2sh,
            network,
            hash: hash160(&p2wpkh_redeem_script(pubkey)),
        }
    }

    /// Native segwit v0 key hash (`bc1q...` / `tb1q...` addresses).
    pub fn p2wpkh(pubkey: &PublicKey, network: Network) -> Self {
        Self {
            kind: AddressKind::P2wpkh,
            network,
            hash: hash160(&pubkey.serialize()),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match (self.kind, self.network) {
            (AddressKind::P2pkh, Network::Mainnet) => 0x00,
            (AddressKind::P2pkh, Network::Testnet) => 0x6f,
            (AddressKind::P2sh, Network::Mainnet) => 0x05,
            (AddressKind::P2sh, Network::Testnet) => 0xc4,
            (AddressKind::P2wpkh, network) => {
                let prefix = match network {
                    Network::Mainnet => hrp::BC,
                    Network::Testnet => hrp::TB,
                };
                let encoded = segwit::encode_v0(prefix, &self.hash).map_err(|_| fmt::Error)?;
                return f.write_str(&encoded);
            }
        };

        let mut payload = Vec::with_capacity(21);
        payload.push(version);
        payload.extend_from_slice(&self.hash);
        f.write_str(&bs58::encode(payload).with_check().into_string())
    }
}

/// `OP_0 PUSH20 <hash160(pubkey)>`
fn p2wpkh_redeem_script(pubkey: &PublicKey) -> Vec<u8> {
    let mut script = Vec::with_capacity(22);
    script.push(0x00);
    script.push(0x14);
    script.extend_from_slice(&hash160(&pubkey.serialize()));
    script
}

/// The key encoding a signature header commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerKind {
    /// Header 27..=30.
    P2pkhUncompressed,
    /// Header 31..=34.
    P2pkhCompressed,
    /// Header 35..=38.
    P2shP2wpkh,
    /// Header 39..=42.
    P2wpkh,
}

impl SignerKind {
    fn header_offset(self) -> u8 {
        match self {
            SignerKind::P2pkhUncompressed => 0,
            SignerKind::P2pkhCompressed => 4,
            SignerKind::P2shP2wpkh => 8,
            SignerKind::P2wpkh => 12,
        }
    }
}

/// A 65-byte recoverable message signature: `header || r || s`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature {
    kind: SignerKind,
    recovery_id: u8,
    compact: [u8; 64],
}

impl MessageSignature {
    /// Sign `message` with `secret`.
    pub fn sign(secret: &SecretKey, message: &str, kind: SignerKind) -> Self {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest(signed_message_digest(message));
        let (recid, compact) = secp
            .sign_ecdsa_recoverable(&msg, secret)
            .serialize_compact();
        Self {
            kind,
            recovery_id: recid.to_i32() as u8,
            compact,
        }
    }

    /// Parse from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let header = bytes[0];
        if !(27..=42).contains(&header) {
            return Err(SignatureError::InvalidHeader(header));
        }
        let flag = header - 27;
        let kind = match flag >> 2 {
            0 => SignerKind::P2pkhUncompressed,
            1 => SignerKind::P2pkhCompressed,
            2 => SignerKind::P2shP2wpkh,
            _ => SignerKind::P2wpkh,
        };

        let mut compact = [0u8; 64];
        compact.copy_from_slice(&bytes[1..]);
        Ok(Self {
            kind,
            recovery_id: flag & 3,
            compact,
        })
    }

    /// Parse from the base64 text wallets emit.
    pub fn from_base64(s: &str) -> Result<Self, SignatureError> {
        let raw = STANDARD
            .decode(s.trim())
            .map_err(|_| SignatureError::InvalidEncoding)?;
        Self::from_bytes(&raw)
    }

    /// The header byte.
    pub fn header(&self) -> u8 {
        27 + self.kind.header_offset() + self.recovery_id
    }

    /// The key encoding this signature claims.
    pub fn kind(&self) -> SignerKind {
        self.kind
    }

    /// Raw 65-byte form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = self.header();
        out[1..].copy_from_slice(&self.compact);
        out
    }

    /// Base64 form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Recover the public key that produced this signature over `message`.
    pub fn recover(&self, message: &str) -> Result<PublicKey, SignatureError> {
        let recid = RecoveryId::from_i32(i32::from(self.recovery_id))
            .map_err(|_| SignatureError::RecoveryFailed)?;
        let sig = RecoverableSignature::from_compact(&self.compact, recid)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        let msg = Message::from_digest(signed_message_digest(message));

        Secp256k1::verification_only()
            .recover_ecdsa(&msg, &sig)
            .map_err(|_| SignatureError::RecoveryFailed)
    }
}

impl fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageSignature({}...)", &hex::encode(self.compact)[..16])
    }
}

/// Verify that `signature` (base64) over `message` was made by the key
/// behind `address`.
pub fn verify_message(address: &str, message: &str, signature: &str) -> Result<(), SignatureError> {
    let target = Address::parse(address)?;
    let sig = MessageSignature::from_base64(signature)?;
    let pubkey = sig.recover(message)?;

    let actual = match (sig.kind(), target.kind) {
        (SignerKind::P2pkhUncompressed, AddressKind::P2pkh) => {
            hash160(&pubkey.serialize_uncompressed())
        }
        (SignerKind::P2pkhCompressed, AddressKind::P2pkh) => hash160(&pubkey.serialize()),
        (SignerKind::P2shP2wpkh, AddressKind::P2sh) => hash160(&p2wpkh_redeem_script(&pubkey)),
        (SignerKind::P2wpkh, AddressKind::P2wpkh) => hash160(&pubkey.serialize()),
        _ => return Err(SignatureError::AddressMismatch(address.to_string())),
    };

    if actual == target.hash {
        Ok(())
    } else {
        Err(SignatureError::AddressMismatch(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    fn public(secret: &SecretKey) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::signing_only(), secret)
    }

    #[test]
    fn test_known_p2pkh_address() {
        // Private key 1 is the generator point.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let sk = SecretKey::from_slice(&bytes).unwrap();
        let addr = Address::p2pkh(&public(&sk), true, Network::Mainnet);
        assert_eq!(addr.to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let uncompressed = Address::p2pkh(&public(&sk), false, Network::Mainnet);
        assert_eq!(uncompressed.to_string(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn test_address_parse_roundtrip() {
        let sk = secret(0x11);
        for addr in [
            Address::p2pkh(&public(&sk), true, Network::Mainnet),
            Address::p2pkh(&public(&sk), false, Network::Testnet),
            Address::p2sh_p2wpkh(&public(&sk), Network::Mainnet),
            Address::p2sh_p2wpkh(&public(&sk), Network::Testnet),
            Address::p2wpkh(&public(&sk), Network::Mainnet),
        ] {
            let parsed = Address::parse(&addr.to_string()).unwrap();
            assert_eq!(parsed, addr);
        }
    }

    #[test]
    fn test_known_p2wpkh_address() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let sk = SecretKey::from_slice(&bytes).unwrap();
        let addr = Address::p2wpkh(&public(&sk), Network::Mainnet);
        assert_eq!(addr.to_string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");

        let parsed = Address::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.kind, AddressKind::P2wpkh);

        let testnet = Address::p2wpkh(&public(&sk), Network::Testnet).to_string();
        assert!(testnet.starts_with("tb1q"));
        assert_eq!(Address::parse(&testnet).unwrap().network, Network::Testnet);
    }

    #[test]
    fn test_address_parse_rejects_other_witness_programs() {
        let p2wsh = segwit::encode_v0(hrp::BC, &[7u8; 32]).unwrap();
        assert!(matches!(
            Address::parse(&p2wsh),
            Err(SignatureError::UnsupportedAddress(_))
        ));

        let taproot = segwit::encode(hrp::BC, segwit::VERSION_1, &[7u8; 32]).unwrap();
        assert!(matches!(
            Address::parse(&taproot),
            Err(SignatureError::UnsupportedAddress(_))
        ));

        let regtest = segwit::encode_v0(hrp::BCRT, &[7u8; 20]).unwrap();
        assert!(matches!(
            Address::parse(&regtest),
            Err(SignatureError::UnsupportedAddress(_))
        ));
    }

    #[test]
    fn test_address_parse_rejects_garbage() {
        assert!(matches!(
            Address::parse("addrA"),
            Err(SignatureError::InvalidAddress(_))
        ));
        // Bad checksum
        assert!(matches!(
            Address::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5"),
            Err(SignatureError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_varint_encoding() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 0xfc);
        assert_eq!(buf, vec![0xfc]);

        buf.clear();
        write_varint(&mut buf, 0xfd);
        assert_eq!(buf, vec![0xfd, 0xfd, 0x00]);

        buf.clear();
        write_varint(&mut buf, 0x1_0000);
        assert_eq!(buf, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_sign_verify_every_supported_kind() {
        let sk = secret(0x42);
        let pk = public(&sk);
        let message = "1Abc:1736870400:starRegistry";

        let cases = [
            (SignerKind::P2pkhUncompressed, Address::p2pkh(&pk, false, Network::Mainnet)),
            (SignerKind::P2pkhCompressed, Address::p2pkh(&pk, true, Network::Mainnet)),
            (SignerKind::P2shP2wpkh, Address::p2sh_p2wpkh(&pk, Network::Mainnet)),
            (SignerKind::P2wpkh, Address::p2wpkh(&pk, Network::Mainnet)),
            (SignerKind::P2wpkh, Address::p2wpkh(&pk, Network::Testnet)),
        ];

        for (kind, address) in cases {
            let sig = MessageSignature::sign(&sk, message, kind);
            verify_message(&address.to_string(), message, &sig.to_base64())
                .expect("signature should verify");
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let sk = secret(0x07);
        let sig = MessageSignature::sign(&sk, "hello", SignerKind::P2pkhCompressed);
        assert!((31..=34).contains(&sig.header()));

        let parsed = MessageSignature::from_base64(&sig.to_base64()).unwrap();
        assert_eq!(parsed, sig);
        assert_eq!(parsed.recover("hello").unwrap(), public(&sk));
    }

    #[test]
    fn test_tampered_message_fails() {
        let sk = secret(0x42);
        let address = Address::p2pkh(&public(&sk), true, Network::Mainnet).to_string();
        let sig = MessageSignature::sign(&sk, "original", SignerKind::P2pkhCompressed);

        let result = verify_message(&address, "tampered", &sig.to_base64());
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = secret(0x42);
        let other = secret(0x43);
        let address = Address::p2pkh(&public(&other), true, Network::Mainnet).to_string();
        let sig = MessageSignature::sign(&signer, "msg", SignerKind::P2pkhCompressed);

        assert_eq!(
            verify_message(&address, "msg", &sig.to_base64()),
            Err(SignatureError::AddressMismatch(address.clone()))
        );
    }

    #[test]
    fn test_compression_flag_must_match_address() {
        let sk = secret(0x42);
        let uncompressed = Address::p2pkh(&public(&sk), false, Network::Mainnet).to_string();
        let sig = MessageSignature::sign(&sk, "msg", SignerKind::P2pkhCompressed);

        assert!(verify_message(&uncompressed, "msg", &sig.to_base64()).is_err());
    }

    #[test]
    fn test_segwit_header_must_match_address_kind() {
        let sk = secret(0x42);
        let native = Address::p2wpkh(&public(&sk), Network::Mainnet).to_string();
        let legacy = Address::p2pkh(&public(&sk), true, Network::Mainnet).to_string();

        let segwit_sig = MessageSignature::sign(&sk, "msg", SignerKind::P2wpkh);
        assert!((39..=42).contains(&segwit_sig.header()));
        assert_eq!(
            verify_message(&legacy, "msg", &segwit_sig.to_base64()),
            Err(SignatureError::AddressMismatch(legacy.clone()))
        );

        let legacy_sig = MessageSignature::sign(&sk, "msg", SignerKind::P2pkhCompressed);
        assert_eq!(
            verify_message(&native, "msg", &legacy_sig.to_base64()),
            Err(SignatureError::AddressMismatch(native.clone()))
        );
    }

    #[test]
    fn test_malformed_signatures() {
        let address = Address::p2pkh(&public(&secret(1)), true, Network::Mainnet).to_string();

        assert_eq!(
            verify_message(&address, "m", "%%%"),
            Err(SignatureError::InvalidEncoding)
        );
        assert_eq!(
            verify_message(&address, "m", &STANDARD.encode([0u8; 10])),
            Err(SignatureError::InvalidLength(10))
        );

        let mut bad_header = [0u8; 65];
        bad_header[0] = 50;
        assert_eq!(
            verify_message(&address, "m", &STANDARD.encode(bad_header)),
            Err(SignatureError::InvalidHeader(50))
        );
    }
}
