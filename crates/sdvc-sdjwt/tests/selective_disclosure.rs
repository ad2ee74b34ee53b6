//! End-to-end selective disclosure: issue, select, present, verify.
//!
//! Covers the engine's externally observable guarantees: round-trips for
//! arbitrary claim trees, opacity of undisclosed claims, salt uniqueness,
//! tamper and ancestor detection, holder binding, wire-format round-trips,
//! and issuer key pinning.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use sdvc_core::{base64url_decode, base64url_decode_json, Timestamp};
use sdvc_crypto::{Algorithm, Jwk, SaltGenerator, SigningKey};
use sdvc_sdjwt::{
    bind_presentation, create_key_binding_jwt, create_presentation, issue, select_disclosures,
    verify_presentation, BlindOption, BlindPolicy, Disclosure, IssuanceFormat, IssuanceSettings,
    JwsSigner, PresentationFormat, PresentationVerifier, SdJwtError, VerificationOptions,
};

fn alice_claims() -> Value {
    json!({
        "given_name": "Alice",
        "family_name": "Smith",
        "email": "alice@example.com",
        "date_of_birth": "1967-01-24",
        "address": {
            "street_address": "123 Main St",
            "locality": "Anytown",
            "country": "US"
        },
        "nationalities": ["US", "CA"]
    })
}

fn all_recursive(claims: &Value) -> BlindPolicy {
    claims
        .as_object()
        .map(|o| {
            o.keys()
                .map(|k| (k.clone(), BlindOption::Recursive))
                .collect()
        })
        .unwrap_or_default()
}

fn issue_with(signer: &JwsSigner, claims: &Value, holder: Option<&Jwk>) -> IssuanceFormat {
    issue(
        claims,
        &all_recursive(claims),
        &IssuanceSettings::default(),
        &SaltGenerator::default(),
        signer,
        holder,
    )
    .unwrap()
}

fn skip_binding(signer: &JwsSigner) -> VerificationOptions {
    VerificationOptions::new(signer.public_key()).skip_holder_binding()
}

fn present(issuance: &IssuanceFormat, names: &[&str]) -> PresentationFormat {
    let indices = select_disclosures(issuance, names.iter().copied()).unwrap();
    create_presentation(issuance, indices, None).unwrap()
}

/// Drop the envelope metadata the issuer adds, leaving only claims.
fn strip_metadata(mut claims: Map<String, Value>) -> Value {
    for name in ["iat", "exp", "iss", "cnf"] {
        claims.remove(name);
    }
    Value::Object(claims)
}

/// Decode every part of a compact presentation into readable text.
fn decoded_text(compact: &str) -> String {
    let mut text = String::new();
    for part in compact.split('~').filter(|p| !p.is_empty()) {
        for segment in part.split('.') {
            if let Ok(bytes) = base64url_decode(segment) {
                text.push_str(&String::from_utf8_lossy(&bytes));
                text.push('\n');
            }
        }
    }
    text
}

#[test]
fn test_alice_discloses_only_date_of_birth() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let claims = alice_claims();
    let settings = IssuanceSettings {
        include_issued_at: false,
        ..IssuanceSettings::default()
    };
    let issuance = issue(
        &claims,
        &all_recursive(&claims),
        &settings,
        &SaltGenerator::default(),
        &signer,
        None,
    )
    .unwrap();

    let presentation = present(&issuance, &["date_of_birth"]);
    assert_eq!(presentation.disclosures().len(), 1);

    let disclosed = verify_presentation(&presentation, &skip_binding(&signer)).unwrap();
    assert_eq!(Value::Object(disclosed), json!({"date_of_birth": "1967-01-24"}));
}

#[test]
fn test_undisclosed_claims_are_opaque() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);
    let compact = present(&issuance, &["date_of_birth"]).to_string();

    let text = decoded_text(&compact);
    assert!(text.contains("date_of_birth"));
    for hidden in [
        "given_name",
        "Alice",
        "family_name",
        "Smith",
        "alice@example.com",
        "street_address",
        "Anytown",
        "nationalities",
    ] {
        assert!(!text.contains(hidden), "{hidden} leaked into the presentation");
        assert!(!compact.contains(hidden));
    }
}

#[test]
fn test_salts_unique_within_issuance() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    // Same (name, value) pairs in several places.
    let claims = json!({
        "a": {"x": 1, "y": 1},
        "b": {"x": 1, "y": 1},
        "c": [1, 1, 1]
    });
    let issuance = issue_with(&signer, &claims, None);
    let salts: HashSet<&str> = issuance.disclosures().iter().map(Disclosure::salt).collect();
    assert_eq!(salts.len(), issuance.disclosures().len());

    let digests: HashSet<String> = issuance
        .disclosures()
        .iter()
        .map(|d| d.digest(Default::default()))
        .collect();
    assert_eq!(digests.len(), issuance.disclosures().len());
}

#[test]
fn test_tampered_value_is_detected() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);
    let presentation = present(&issuance, &["date_of_birth"]);
    let original = &presentation.disclosures()[0];

    let forged =
        Disclosure::for_property(original.salt(), "date_of_birth", json!("1999-01-01")).unwrap();
    let compact = format!("{}~{}~", presentation.signed_payload(), forged);
    let tampered: PresentationFormat = compact.parse().unwrap();

    let err = verify_presentation(&tampered, &skip_binding(&signer)).unwrap_err();
    assert!(matches!(err, SdJwtError::DisclosureMismatch { index: 0 }));
}

#[test]
fn test_nested_claim_requires_its_ancestor() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);

    let presentation = present(&issuance, &["address/locality"]);
    assert_eq!(presentation.disclosures().len(), 2);
    let disclosed = verify_presentation(&presentation, &skip_binding(&signer)).unwrap();
    assert_eq!(
        strip_metadata(disclosed),
        json!({"address": {"locality": "Anytown"}})
    );

    // Remove the ancestor: the child no longer hangs off the signed payload.
    let child = presentation
        .disclosures()
        .iter()
        .find(|d| d.name() == Some("locality"))
        .unwrap();
    let orphaned: PresentationFormat = format!("{}~{}~", presentation.signed_payload(), child)
        .parse()
        .unwrap();
    let err = verify_presentation(&orphaned, &skip_binding(&signer)).unwrap_err();
    assert!(matches!(err, SdJwtError::DisclosureMismatch { index: 0 }));
}

#[test]
fn test_name_shared_with_nested_claim_reveals_only_top_level() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let claims = json!({
        "name": "Alice",
        "employer": {"name": "ACME", "city": "Berlin"}
    });
    let settings = IssuanceSettings {
        include_issued_at: false,
        ..IssuanceSettings::default()
    };
    let issuance = issue(
        &claims,
        &all_recursive(&claims),
        &settings,
        &SaltGenerator::default(),
        &signer,
        None,
    )
    .unwrap();

    let top = verify_presentation(&present(&issuance, &["name"]), &skip_binding(&signer)).unwrap();
    assert_eq!(Value::Object(top), json!({"name": "Alice"}));

    let nested = verify_presentation(
        &present(&issuance, &["employer/name"]),
        &skip_binding(&signer),
    )
    .unwrap();
    assert_eq!(Value::Object(nested), json!({"employer": {"name": "ACME"}}));
}

#[test]
fn test_unknown_claim_is_rejected_before_presenting() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);
    let err = select_disclosures(&issuance, ["date_of_birth", "passport_number"]).unwrap_err();
    assert!(matches!(err, SdJwtError::ClaimNotFound(name) if name == "passport_number"));
}

#[test]
fn test_holder_binding_lifecycle() {
    let issuer = JwsSigner::new(SigningKey::generate(Algorithm::ES256));
    let holder = SigningKey::generate(Algorithm::EdDSA);
    let holder_jwk = Jwk::from_public_key(&holder.public_key());
    let issuance = issue_with(&issuer, &alice_claims(), Some(&holder_jwk));
    let presentation = present(&issuance, &["email"]);

    let options = VerificationOptions::new(issuer.public_key()).require_holder_binding(
        Some("https://verifier.example".to_string()),
        Some("n-42".to_string()),
        Some(300),
    );

    // No proof.
    let err = verify_presentation(&presentation, &options).unwrap_err();
    assert!(matches!(err, SdJwtError::HolderBindingMissing));

    // Valid proof.
    let bound = bind_presentation(
        presentation.clone(),
        &holder,
        "https://verifier.example",
        "n-42",
    )
    .unwrap();
    let disclosed = verify_presentation(&bound, &options).unwrap();
    assert_eq!(disclosed["email"], "alice@example.com");

    // Wrong nonce.
    let replayed = bind_presentation(
        presentation.clone(),
        &holder,
        "https://verifier.example",
        "n-41",
    )
    .unwrap();
    assert!(matches!(
        verify_presentation(&replayed, &options),
        Err(SdJwtError::HolderBindingFailed(_))
    ));

    // Wrong holder key.
    let thief = SigningKey::generate(Algorithm::EdDSA);
    let stolen =
        bind_presentation(presentation.clone(), &thief, "https://verifier.example", "n-42").unwrap();
    assert!(matches!(
        verify_presentation(&stolen, &options),
        Err(SdJwtError::HolderBindingFailed(_))
    ));

    // Stale proof, checked against a fixed verification time.
    let issued = Timestamp::now();
    let proof = create_key_binding_jwt(
        &holder,
        &presentation,
        "https://verifier.example",
        "n-42",
        issued,
    )
    .unwrap();
    let stale = presentation.with_holder_binding_proof(proof);
    let err = PresentationVerifier::new(options)
        .at(issued.plus_secs(3600).unwrap())
        .verify(&stale)
        .unwrap_err();
    assert!(matches!(err, SdJwtError::HolderBindingFailed(_)));
}

#[test]
fn test_compact_forms_roundtrip() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let holder = SigningKey::generate(Algorithm::ES256);
    let issuance = issue_with(
        &signer,
        &alice_claims(),
        Some(&Jwk::from_public_key(&holder.public_key())),
    );

    let compact = issuance.to_string();
    let reparsed: IssuanceFormat = compact.parse().unwrap();
    assert_eq!(reparsed, issuance);
    assert_eq!(reparsed.to_string(), compact);

    let presentation = bind_presentation(present(&reparsed, &["address"]), &holder, "v", "n").unwrap();
    let compact = presentation.to_string();
    let reparsed: PresentationFormat = compact.parse().unwrap();
    assert_eq!(reparsed, presentation);
    assert_eq!(reparsed.to_string(), compact);
}

#[test]
fn test_wrong_issuer_key_or_algorithm() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);
    let presentation = present(&issuance, &["given_name"]);

    let other = SigningKey::generate(Algorithm::EdDSA).public_key();
    let err = verify_presentation(
        &presentation,
        &VerificationOptions::new(other).skip_holder_binding(),
    )
    .unwrap_err();
    assert!(matches!(err, SdJwtError::InvalidSignature(_)));

    let pinned = skip_binding(&signer).with_algorithm(Algorithm::ES256);
    let err = verify_presentation(&presentation, &pinned).unwrap_err();
    assert!(matches!(err, SdJwtError::InvalidSignature(_)));
}

#[test]
fn test_sub_claims_policy_end_to_end() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let claims = alice_claims();
    let mut policy = BlindPolicy::new();
    policy.insert("given_name".into(), BlindOption::Flat);
    policy.insert(
        "address".into(),
        BlindOption::SubClaims(
            [("street_address".to_string(), BlindOption::Flat)]
                .into_iter()
                .collect(),
        ),
    );
    let issuance = issue(
        &claims,
        &policy,
        &IssuanceSettings {
            decoy_digests: 2,
            ..IssuanceSettings::default()
        },
        &SaltGenerator::default(),
        &signer,
        None,
    )
    .unwrap();
    assert_eq!(issuance.disclosures().len(), 2);

    let payload = issuance.unverified_payload().unwrap();
    assert_eq!(payload["address"]["locality"], "Anytown");
    assert_eq!(payload["address"]["_sd"].as_array().unwrap().len(), 3);

    let none = verify_presentation(&present(&issuance, &[]), &skip_binding(&signer)).unwrap();
    let none = strip_metadata(none);
    assert!(none.get("given_name").is_none());
    assert!(none["address"].get("street_address").is_none());
    assert_eq!(none["family_name"], "Smith");

    let all = verify_presentation(
        &present(&issuance, &["given_name", "street_address"]),
        &skip_binding(&signer),
    )
    .unwrap();
    assert_eq!(strip_metadata(all), claims);
}

#[test]
fn test_recursive_disclosure_values_are_blinded() {
    let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
    let issuance = issue_with(&signer, &alice_claims(), None);
    let address = issuance
        .disclosures()
        .iter()
        .find(|d| d.name() == Some("address"))
        .unwrap();
    let decoded = base64url_decode_json(address.encoded()).unwrap();
    assert!(decoded[2].get("locality").is_none());
    assert_eq!(decoded[2]["_sd"].as_array().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

fn nested_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[nt][0-4]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn claim_tree() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("t[0-5]", nested_value(), 1..6)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Any subset of top-level claims of an all-recursive issuance verifies
    /// to exactly those claims with their original values, even when nested
    /// claims reuse top-level names.
    #[test]
    fn prop_any_subset_roundtrips(claims in claim_tree(), mask in prop::collection::vec(any::<bool>(), 6)) {
        let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
        let claims = Value::Object(claims);
        let blinded = sdvc_sdjwt::ClaimBlinder::new(&SaltGenerator::default())
            .blind(&claims, &all_recursive(&claims))
            .unwrap();
        let issuance = sdvc_sdjwt::IssuanceAssembler::new(Default::default())
            .assemble(blinded, &signer)
            .unwrap();

        let names: Vec<String> = claims
            .as_object()
            .unwrap()
            .keys()
            .enumerate()
            .filter(|(i, _)| mask[*i])
            .map(|(_, k)| k.clone())
            .collect();
        let indices: BTreeSet<usize> = select_disclosures(&issuance, &names).unwrap();
        let presentation = create_presentation(&issuance, indices, None).unwrap();
        let disclosed = verify_presentation(&presentation, &skip_binding(&signer)).unwrap();

        let expected: Map<String, Value> = names
            .iter()
            .map(|n| (n.clone(), claims[n].clone()))
            .collect();
        prop_assert_eq!(Value::Object(disclosed), Value::Object(expected));
    }

    /// The compact issuance string parses back to the same issuance.
    #[test]
    fn prop_issuance_compact_roundtrip(claims in claim_tree()) {
        let signer = JwsSigner::new(SigningKey::generate(Algorithm::EdDSA));
        let issuance = issue_with(&signer, &Value::Object(claims), None);
        let reparsed: IssuanceFormat = issuance.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, issuance);
    }
}
