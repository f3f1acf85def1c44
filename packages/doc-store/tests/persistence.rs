use jsonkit_codec::{
    serial, Algorithm, BlockMode, Bytes, Cipher, Codec, CryptoConfig, CryptoHook, NonceStrategy, StandardCodec,
};
use jsonkit_core::{Error, Node};
use jsonkit_store::{ExportSink, ImportSource, Store, StoreConfig};
use serde_json::json;

fn sample() -> Node {
    Node::from(json!({"name": "jsonkit", "tags": ["json", "store"], "version": 1}))
}

#[test]
fn file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("doc.json");

    let mut store = Store::new();
    store.import(file.clone(), None).unwrap();
    assert_eq!(store.file(), Some(file.as_path()));
    store.set_object(sample());
    assert_eq!(store.save(None).unwrap(), None);

    let mut reloaded = Store::new();
    reloaded.import(file.clone(), None).unwrap();
    assert_eq!(reloaded.object(), &sample());
    let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(&file).unwrap()).unwrap();
    assert_eq!(on_disk["name"], json!("jsonkit"));
}

#[test]
fn encrypted_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("secret.dat");

    let mut store = Store::from_node(sample());
    store
        .export(ExportSink::File(file.clone()), Some("correct horse"))
        .unwrap();
    let raw = std::fs::read_to_string(&file).unwrap();
    assert!(!raw.contains("jsonkit"));

    let mut wrong = Store::new();
    assert!(matches!(
        wrong.import(file.clone(), Some("battery staple")),
        Err(Error::DecryptionFailed)
    ));

    let mut right = Store::new();
    right.import(file, Some("correct horse")).unwrap();
    assert_eq!(right.object(), &sample());
}

#[test]
fn stored_key_is_used_by_default() {
    let store = Store::builder()
        .key("k1")
        .source(sample())
        .build()
        .unwrap();
    let payload = store.export(ExportSink::Return, None).unwrap().unwrap();

    let reopened = Store::builder()
        .key("k1")
        .source(ImportSource::Bytes(payload))
        .build()
        .unwrap();
    assert_eq!(reopened.object(), &sample());
}

#[test]
fn every_cipher_configuration_roundtrips() {
    let configs = [
        CryptoConfig::default(),
        CryptoConfig {
            cipher: Cipher::Aes128,
            nonce: NonceStrategy::Random,
            ..CryptoConfig::default()
        },
        CryptoConfig {
            cipher: Cipher::ChaCha20,
            mode: BlockMode::Stream,
            ..CryptoConfig::default()
        },
    ];
    for crypto in configs {
        let config = StoreConfig {
            crypto,
            ..StoreConfig::default()
        };
        let store = Store::builder()
            .config(config.clone())
            .source(sample())
            .build()
            .unwrap();
        let payload = store.export(ExportSink::Return, Some("pass")).unwrap().unwrap();

        let mut back = Store::with_config(config);
        back.import(payload, Some("pass")).unwrap();
        assert_eq!(back.object(), &sample(), "{:?}", crypto);
    }
}

#[test]
fn import_detects_json_text() {
    let mut store = Store::new();
    store.import(r#"{"a": [1, 2]}"#, None).unwrap();
    assert_eq!(store.get_at("/a/1").unwrap(), Node::Int(2));
}

#[test]
fn json_imports_whatever_the_transport_encoding() {
    let config = StoreConfig {
        algorithm: Algorithm::Base64,
        ..StoreConfig::default()
    };
    let mut store = Store::with_config(config.clone());
    store.import(r#"{"a":1}"#, None).unwrap();
    assert_eq!(store.get_at("/a").unwrap(), Node::Int(1));

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.json");
    std::fs::write(&file, r#"{"b": [true]}"#).unwrap();
    store.import(file, None).unwrap();
    assert_eq!(store.get_at("/b/0").unwrap(), Node::Bool(true));

    let payload = store.export(ExportSink::Return, None).unwrap().unwrap();
    let mut back = Store::with_config(config);
    back.import(payload, None).unwrap();
    assert_eq!(back.object(), store.object());
}

#[test]
fn import_rejects_unreachable_files() {
    let dir = tempfile::tempdir().unwrap();
    let orphan = dir.path().join("missing").join("doc.json");
    let err = Store::new().import(orphan, None).unwrap_err();
    assert!(matches!(err, Error::InvalidFile { .. }));
}

#[test]
fn import_rejects_garbage() {
    let err = Store::new().import("certainly not json", None).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn serialized_bytes_import_directly() {
    let bytes = serial::to_bytes(&sample()).unwrap();
    let mut store = Store::new();
    store.import(bytes, None).unwrap();
    assert_eq!(store.object(), &sample());
}

#[test]
fn configured_algorithm_applies_to_unkeyed_io() {
    let config = StoreConfig {
        algorithm: Algorithm::Uu,
        ..StoreConfig::default()
    };
    let mut store = Store::with_config(config.clone());
    store.set_object(sample());
    let payload = store.export(ExportSink::Return, None).unwrap().unwrap();
    assert!(payload.ends_with(b"`\n"));

    let mut back = Store::with_config(config);
    back.import(payload, None).unwrap();
    assert_eq!(back.object(), &sample());
}

#[test]
fn unkeyed_io_goes_through_the_codec() {
    let config = StoreConfig {
        algorithm: Algorithm::Rot13,
        ..StoreConfig::default()
    };
    let mut store = Store::with_config(config);
    store.set_object(sample());
    let payload = store.export(ExportSink::Return, None).unwrap().unwrap();
    let expected = StandardCodec::new(Algorithm::Rot13).encode(&sample()).unwrap();
    assert_eq!(payload, expected.to_vec());
}

/// Codec that wraps compact JSON in angle brackets.
struct Bracketed;

impl Codec for Bracketed {
    fn encode(&self, node: &Node) -> Result<Bytes, Error> {
        Ok(Bytes::from(format!("<{}>", node)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Node, Error> {
        let inner = bytes
            .strip_prefix(b"<")
            .and_then(|rest| rest.strip_suffix(b">"))
            .ok_or_else(|| Error::decode("bracketed", "missing brackets"))?;
        Ok(serde_json::from_slice(inner)?)
    }
}

#[test]
fn builder_installs_a_custom_codec() {
    let store = Store::builder().codec(Bracketed).source(sample()).build().unwrap();
    let payload = store.export(ExportSink::Return, None).unwrap().unwrap();
    assert_eq!(payload.first(), Some(&b'<'));

    let mut back = Store::builder().codec(Bracketed).build().unwrap();
    back.import(payload, None).unwrap();
    assert_eq!(back.object(), &sample());

    let mut clone = back.clone();
    assert!(matches!(clone.import("plain", None), Err(Error::Decode { .. })));
}

#[test]
fn export_to_writer_and_callback() {
    let store = Store::from_node(sample());

    let mut buffer: Vec<u8> = Vec::new();
    assert_eq!(store.export(ExportSink::Writer(&mut buffer), None).unwrap(), None);
    assert_eq!(Node::from(serde_json::from_slice::<serde_json::Value>(&buffer).unwrap()), sample());

    let mut seen = None;
    let mut callback = |payload: &[u8], key: Option<&str>, source: &Store| {
        seen = Some((payload.len(), key.map(str::to_string), source.object().len()));
    };
    store
        .export(ExportSink::Callback(&mut callback), Some("k"))
        .unwrap();
    let (len, key, entries) = seen.unwrap();
    assert!(len > 0);
    assert_eq!(key.as_deref(), Some("k"));
    assert_eq!(entries, 3);
}

/// Hook that stores the JSON text backwards and ignores the key.
struct Mirror;

impl CryptoHook for Mirror {
    fn encrypt(&self, document: &Node, _key: &str) -> Result<Vec<u8>, Error> {
        let mut bytes = serde_json::to_vec(document)?;
        bytes.reverse();
        Ok(bytes)
    }

    fn decrypt(&self, payload: &[u8], _key: &str) -> Result<Node, Error> {
        let mut bytes = payload.to_vec();
        bytes.reverse();
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[test]
fn crypto_hook_replaces_builtin_ciphers() {
    let store = Store::builder()
        .crypto_hook(Mirror)
        .source(sample())
        .build()
        .unwrap();
    let payload = store.export(ExportSink::Return, Some("unused")).unwrap().unwrap();
    assert_eq!(payload.first(), Some(&b'}'));

    let mut back = Store::builder().crypto_hook(Mirror).build().unwrap();
    back.import(payload, Some("unused")).unwrap();
    assert_eq!(back.object(), &sample());
}

#[test]
fn save_without_file_returns_payload() {
    let store = Store::from_node(json!({"x": 1}));
    assert_eq!(store.save(None).unwrap(), Some(br#"{"x":1}"#.to_vec()));
}
