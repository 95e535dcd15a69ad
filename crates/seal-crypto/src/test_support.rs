//! Runtime certificate generation for tests.
//!
//! Enabled for this crate's own tests and, for dependants, through the
//! `test-support` feature. Panics on OpenSSL failure: it is only ever used
//! from test code.

use std::sync::atomic::{AtomicU32, Ordering};

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::dsa::Dsa;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509, X509Builder, X509NameBuilder, X509Ref};

use crate::identity::{SigningIdentity, TrustStore};

static SERIAL: AtomicU32 = AtomicU32::new(1);

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).expect("p-256 group");
    PKey::from_ec_key(EcKey::generate(&group).expect("ec keygen")).expect("pkey")
}

fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).expect("rsa keygen")).expect("pkey")
}

fn dsa_key() -> PKey<Private> {
    PKey::from_dsa(Dsa::generate(2048).expect("dsa keygen")).expect("pkey")
}

fn build_cert(
    common_name: &str,
    subject_key: &PKey<Private>,
    issuer: Option<(&X509Ref, &PKey<Private>)>,
    is_ca: bool,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(SERIAL.fetch_add(1, Ordering::Relaxed))
        .unwrap()
        .to_asn1_integer()
        .unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(subject_key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();

    if is_ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    } else {
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .non_repudiation()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    let signing_key = issuer.map(|(_, key)| key).unwrap_or(subject_key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// A throwaway certificate authority.
pub struct TestAuthority {
    key: PKey<Private>,
    cert: X509,
}

impl TestAuthority {
    pub fn new(common_name: &str) -> Self {
        let key = ec_key();
        let cert = build_cert(common_name, &key, None, true);
        Self { key, cert }
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    /// A trust store anchored at this authority only.
    pub fn trust_store(&self) -> TrustStore {
        TrustStore::new().with_anchor(self.cert.clone())
    }

    /// Issue an EC P-256 leaf key and certificate.
    pub fn issue_parts(&self, common_name: &str) -> (PKey<Private>, X509) {
        let key = ec_key();
        let cert = build_cert(common_name, &key, Some((&self.cert, &self.key)), false);
        (key, cert)
    }

    pub fn issue(&self, common_name: &str) -> SigningIdentity {
        let (key, cert) = self.issue_parts(common_name);
        SigningIdentity::new(key, cert).unwrap()
    }

    /// Issue an RSA-2048 leaf identity.
    pub fn issue_rsa(&self, common_name: &str) -> SigningIdentity {
        let key = rsa_key();
        let cert = build_cert(common_name, &key, Some((&self.cert, &self.key)), false);
        SigningIdentity::new(key, cert).unwrap()
    }

    /// An Ed25519 leaf. S/MIME signing does not accept it.
    pub fn issue_ed25519_parts(&self, common_name: &str) -> (PKey<Private>, X509) {
        let key = PKey::generate_ed25519().expect("ed25519 keygen");
        let cert = build_cert(common_name, &key, Some((&self.cert, &self.key)), false);
        (key, cert)
    }

    /// A DSA leaf. PKCS#7 can carry its signature but Seal does not accept it.
    pub fn issue_dsa_parts(&self, common_name: &str) -> (PKey<Private>, X509) {
        let key = dsa_key();
        let cert = build_cert(common_name, &key, Some((&self.cert, &self.key)), false);
        (key, cert)
    }

    /// Detached S/MIME over an arbitrary payload, signed by a fresh EC leaf.
    pub fn envelope_over(&self, payload: &[u8]) -> Vec<u8> {
        let (key, cert) = self.issue_parts("payload signer");
        smime(&cert, &key, payload, Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY)
    }

    /// Opaque `application/pkcs7-mime` with the payload inside the
    /// signed-data instead of beside it.
    pub fn opaque_envelope(&self, payload: &[u8]) -> Vec<u8> {
        let (key, cert) = self.issue_parts("opaque signer");
        smime(&cert, &key, payload, Pkcs7Flags::BINARY)
    }

    /// Detached S/MIME signed with a DSA key.
    pub fn dsa_envelope(&self, payload: &[u8]) -> Vec<u8> {
        let (key, cert) = self.issue_dsa_parts("dsa signer");
        smime(&cert, &key, payload, Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY)
    }

    /// Detached S/MIME whose signed-data lists its signer twice.
    pub fn two_signer_envelope(&self, payload: &[u8]) -> Vec<u8> {
        let (key, cert) = self.issue_parts("twin signer");
        let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY;
        let no_extra: Stack<X509> = Stack::new().unwrap();
        let single = Pkcs7::sign(&cert, &key, &no_extra, payload, flags).unwrap();
        let doubled = Pkcs7::from_der(&duplicate_signer_infos(&single.to_der().unwrap())).unwrap();
        doubled.to_smime(payload, flags).unwrap()
    }

    /// PEM-encoded `(pkcs8 key, certificate)` for a new leaf.
    pub fn issue_pem(&self, common_name: &str) -> (Vec<u8>, Vec<u8>) {
        let (key, cert) = self.issue_parts(common_name);
        (
            key.private_key_to_pem_pkcs8().unwrap(),
            cert.to_pem().unwrap(),
        )
    }
}

/// A self-signed leaf identity that no authority vouches for.
pub fn self_signed_identity(common_name: &str) -> SigningIdentity {
    let key = ec_key();
    let cert = build_cert(common_name, &key, None, false);
    SigningIdentity::new(key, cert).unwrap()
}

fn smime(cert: &X509Ref, key: &PKey<Private>, payload: &[u8], flags: Pkcs7Flags) -> Vec<u8> {
    let no_extra: Stack<X509> = Stack::new().unwrap();
    Pkcs7::sign(cert, key, &no_extra, payload, flags)
        .unwrap()
        .to_smime(payload, flags)
        .unwrap()
}

/// Split one DER TLV into `(tag, content, rest)`.
fn der_split(bytes: &[u8]) -> (u8, &[u8], &[u8]) {
    let tag = bytes[0];
    let (len, header) = match bytes[1] {
        short if short < 0x80 => (short as usize, 2),
        long => {
            let n = (long & 0x7f) as usize;
            let len = bytes[2..2 + n]
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize);
            (len, 2 + n)
        }
    };
    (tag, &bytes[header..header + len], &bytes[header + len..])
}

fn der_children(mut content: &[u8]) -> Vec<(u8, &[u8])> {
    let mut out = Vec::new();
    while !content.is_empty() {
        let (tag, inner, rest) = der_split(content);
        out.push((tag, inner));
        content = rest;
    }
    out
}

fn der_encode(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend_from_slice(&bytes);
    }
    out.extend_from_slice(content);
    out
}

/// ContentInfo { oid, [0] SignedData { .., signerInfos } } with every
/// SignerInfo repeated once.
fn duplicate_signer_infos(der: &[u8]) -> Vec<u8> {
    let (outer_tag, outer, _) = der_split(der);
    let outer_parts = der_children(outer);
    let (oid_tag, oid) = outer_parts[0];
    let (explicit_tag, explicit) = outer_parts[1];
    let (signed_tag, signed_data, _) = der_split(explicit);

    let mut parts = der_children(signed_data);
    let (infos_tag, infos) = parts.pop().unwrap();
    let mut signed = Vec::new();
    for (tag, content) in parts {
        signed.extend(der_encode(tag, content));
    }
    signed.extend(der_encode(infos_tag, &[infos, infos].concat()));

    let mut content = der_encode(oid_tag, oid);
    content.extend(der_encode(explicit_tag, &der_encode(signed_tag, &signed)));
    der_encode(outer_tag, &content)
}
