//! Unit tests for the NDN packet model

use super::*;
use bytes::Bytes;

#[test]
fn test_name_creation() {
    // Create a name from a URI
    let name = Name::from_uri("/test/data/1").unwrap();

    // Check the components
    assert_eq!(name.components().len(), 3);
    assert_eq!(name.components()[0].as_bytes().as_ref(), b"test");
    assert_eq!(name.components()[1].as_bytes().as_ref(), b"data");
    assert_eq!(name.components()[2].as_bytes().as_ref(), b"1");

    // Convert back to string
    assert_eq!(name.to_string(), "/test/data/1");
}

#[test]
fn test_name_percent_escapes() {
    let name = Name::from_uri("ndn:/a/b%2Fc/%00%FF").unwrap();
    assert_eq!(name.len(), 3);
    assert_eq!(name.components()[1].as_bytes().as_ref(), b"b/c");
    assert_eq!(name.components()[2].as_bytes().as_ref(), &[0x00, 0xFF]);
    assert_eq!(name.to_string(), "/a/b%2Fc/%00%FF");
    assert_eq!(Name::from_uri(&name.to_string()).unwrap(), name);

    assert!(matches!(Name::from_uri("/a/%G1"), Err(Error::InvalidName(_))));
    assert!(matches!(Name::from_uri("/a/%2"), Err(Error::InvalidName(_))));
    assert_eq!(Name::from_string("/a/%2").components()[1].as_bytes().as_ref(), b"%2");
}

#[test]
fn test_empty_name() {
    let name = Name::from_uri("/").unwrap();
    assert!(name.is_empty());
    assert_eq!(name.to_string(), "/");
    assert_eq!(Name::from_string("ndn:/"), Name::new());
}

#[test]
fn test_name_compare() {
    let name1 = Name::from_string("/a/b/c");
    let name2 = Name::from_string("/a/b/c");
    let name3 = Name::from_string("/a/b/d");
    let name4 = Name::from_string("/a/b");

    assert_eq!(name1, name2);
    assert_ne!(name1, name3);
    assert_ne!(name1, name4);

    // Test prefix matching
    assert!(name4.is_prefix_of(&name1));
    assert!(!name1.is_prefix_of(&name4));
    assert!(!name3.is_prefix_of(&name1));
    assert!(Name::new().is_prefix_of(&name1));

    // A prefix sorts before its extensions and before its later siblings
    assert!(name4 < name1);
    assert!(name1 < name3);
}

#[test]
fn test_name_borrows_as_slice() {
    use std::collections::HashMap;

    let mut map = HashMap::new();
    map.insert(Name::from_string("/a/b"), 7);

    let longer = Name::from_string("/a/b/c");
    assert_eq!(map.get(&longer.components()[..2]), Some(&7));
    assert_eq!(map.get(&longer.components()[..1]), None);
}

#[test]
fn test_interest_packet() {
    let name = Name::from_string("/test/interest");
    let interest = Interest::new(name.clone())
        .with_can_be_prefix(true)
        .with_must_be_fresh(true)
        .with_nonce(42)
        .with_lifetime(Duration::from_millis(1500));

    assert_eq!(interest.name(), &name);
    assert!(interest.can_be_prefix);
    assert!(interest.must_be_fresh);
    assert_eq!(interest.nonce, 42);
    assert_eq!(interest.lifetime, Some(Duration::from_millis(1500)));
    assert!(!interest.validation);
    assert!(!interest.location_registration);
    assert!(interest.path.is_empty());

    assert_eq!(Interest::new(name).lifetime, None);
}

#[test]
fn test_interest_matches_data() {
    let data = Data::new(Name::from_string("/a/b/c"), Bytes::from_static(b"x"));

    let exact = Interest::new(Name::from_string("/a/b/c"));
    let prefix = Interest::new(Name::from_string("/a/b"));
    assert!(exact.matches_data(&data));
    assert!(!prefix.matches_data(&data));
    assert!(prefix.with_can_be_prefix(true).matches_data(&data));
}

#[test]
fn test_data_packet() {
    let name = Name::from_string("/test/data");
    let content = Bytes::from_static(b"Hello, NDN!");
    let data = Data::new(name.clone(), content.clone())
        .with_freshness_period(Duration::from_millis(10000))
        .with_signature(Bytes::from_static(&[0u8; 32]));

    assert_eq!(data.name(), &name);
    assert_eq!(data.content, content);
    assert_eq!(data.freshness_period, Some(Duration::from_millis(10000)));
    assert_eq!(data.signature.len(), 32);
    assert_eq!(Data::new(name, content).freshness_period, None);
}

#[test]
fn test_pushed_data_flags() {
    let plain = Data::new(Name::from_string("/p"), Bytes::new());
    assert!(!plain.validation && !plain.publishment && !plain.expiration && !plain.eligibility);

    let pushed = plain
        .with_validation(true)
        .with_publishment(vec![FaceId(300), FaceId(301)])
        .with_expiration(true);
    assert!(pushed.validation);
    assert!(pushed.publishment);
    assert!(pushed.expiration);
    assert_eq!(pushed.path_back.last(), Some(&FaceId(301)));
}

#[test]
fn test_incoming_envelope() {
    let data = Data::new(Name::from_string("/x"), Bytes::new());
    let incoming = Incoming::new(FaceId::CONTENT_STORE, data.clone());

    assert_eq!(incoming.incoming_face, FaceId::CONTENT_STORE);
    assert_eq!(incoming.name(), data.name());
    assert_eq!(incoming.into_inner(), data);
}

#[test]
fn test_packet_kind() {
    let interest = NdnPacket::Interest(Interest::new(Name::from_string("/i")));
    let data = NdnPacket::Data(Data::new(Name::from_string("/d"), Bytes::new()));
    assert_eq!(interest.packet_type(), "Interest");
    assert_eq!(data.packet_type(), "Data");
    assert_eq!(data.name().to_string(), "/d");
}
