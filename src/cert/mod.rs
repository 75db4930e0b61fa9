// file: src/cert/mod.rs
// version: 1.0.0
// guid: b483b0fe-ad5c-4719-aa8c-9819789fff19

//! Certificate preparation
//!
//! Android looks certificates up in its system store by the OpenSSL legacy
//! subject hash, so a DER export has to become `<hash>.0` before it can be
//! installed. All cryptographic work is delegated to the `openssl` binary.

pub mod files;
pub mod openssl;

pub use files::{find_certificates, is_hash_file_name, CertificateKind};
pub use openssl::{parse_subject_hash, ConvertedCertificate, OpenSsl};
