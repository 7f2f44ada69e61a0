//! End-to-end tests for the disk cache: compute on miss, reuse on hit,
//! invalidation by modification time, and error reporting.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stowage_cache::{
    BoxError, ByExist, ByFields, ByHashIter, CacheError, DiskCache, Header, Producer, Source,
    SourceKind,
};

fn set_mtime(path: &Path, time: SystemTime) {
    let f = fs::OpenOptions::new().write(true).open(path).unwrap();
    f.set_modified(time).unwrap();
}

fn upper(source: &Source, _: Option<&str>) -> Result<String, BoxError> {
    let path = source.as_path().ok_or("expected a path")?;
    Ok(fs::read_to_string(path)?.to_uppercase())
}

fn artifact_files(cache: &DiskCache) -> usize {
    fs::read_dir(cache.folder())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "bin"))
        .count()
}

#[test]
fn compute_once_then_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("greeting.txt");
    fs::write(&src, "hello").unwrap();
    let cache = DiskCache::by_hash(dir.path().join("cache")).unwrap();
    let source = Source::path(&src);

    let (value, digest) = cache
        .load_or_compute(&source, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_eq!(value.as_deref(), Some("HELLO"));
    assert_eq!(artifact_files(&cache), 1);

    let (again, digest_again) = cache
        .load_or_compute::<String>(
            &source,
            Some(Producer::new("upper", |_, _| panic!("producer must not run on a hit"))),
            false,
        )
        .unwrap();
    assert_eq!(again.as_deref(), Some("HELLO"));
    assert_eq!(digest, digest_again);
    assert_eq!(artifact_files(&cache), 1);
}

#[test]
fn content_change_gives_new_entry() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("greeting.txt");
    fs::write(&src, "hello").unwrap();
    let cache = DiskCache::by_hash(dir.path().join("cache")).unwrap();
    let source = Source::path(&src);

    let (_, first) = cache
        .load_or_compute(&source, Some(Producer::new("upper", upper)), false)
        .unwrap();
    fs::write(&src, "goodbye").unwrap();
    let (value, second) = cache
        .load_or_compute(&source, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(value.as_deref(), Some("GOODBYE"));
    // Old entries are never removed.
    assert_eq!(cache.entries().unwrap().len(), 2);
}

#[test]
fn mtime_cache_recomputes_after_source_changes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("data.txt");
    fs::write(&src, "abc").unwrap();
    let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    set_mtime(&src, base);

    let cache = DiskCache::by_mtime(dir.path().join("cache")).unwrap();
    let source = Source::path(&src);
    let (value, digest) = cache
        .load_or_compute(&source, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_eq!(value.as_deref(), Some("ABC"));

    let (hit, _) = cache.load::<String>(&source).unwrap();
    assert!(hit.is_none(), "empty reader id is a different key");

    let (hit, _) = cache
        .load_or_compute::<String>(
            &source,
            Some(Producer::new("upper", |_, _| Err("should be cached".into()))),
            false,
        )
        .unwrap();
    assert_eq!(hit.as_deref(), Some("ABC"));

    fs::write(&src, "abcdef").unwrap();
    set_mtime(&src, SystemTime::now() + Duration::from_secs(60));
    let (value, digest_after) = cache
        .load_or_compute(&source, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_eq!(value.as_deref(), Some("ABCDEF"));
    // Named by path, so the same file keeps its digest.
    assert_eq!(digest, digest_after);
}

#[test]
fn multi_path_sets_ignore_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();
    let cache = DiskCache::by_multi_mtime(dir.path().join("cache")).unwrap();

    let count = |source: &Source, _: Option<&str>| -> Result<usize, BoxError> {
        Ok(source.as_paths().map_or(0, <[_]>::len))
    };
    let (n, forward) = cache
        .load_or_compute(&Source::paths([&a, &b]), Some(Producer::new("count", count)), false)
        .unwrap();
    assert_eq!(n, Some(2));
    let (n, backward) = cache
        .load_or_compute::<usize>(
            &Source::paths([&b, &a]),
            Some(Producer::new("count", |_, _| panic!("permuted set must hit"))),
            false,
        )
        .unwrap();
    assert_eq!(forward, backward);
    assert_eq!(n, Some(2));

    let unnamed_ab = cache.header_for(&Source::paths([&a, &b]), "").unwrap();
    let unnamed_ba = cache.header_for(&Source::paths([&b, &a]), "").unwrap();
    assert_eq!(
        cache.stem_for(&unnamed_ab).unwrap(),
        cache.stem_for(&unnamed_ba).unwrap()
    );
}

#[test]
fn text_sources_reach_the_producer_as_paths() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("greeting.txt");
    fs::write(&src, "hello").unwrap();
    let text = Source::from(src.to_string_lossy().into_owned());

    let by_hash = DiskCache::by_hash(dir.path().join("by_hash")).unwrap();
    let (value, digest) = by_hash
        .load_or_compute(&text, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_eq!(value.as_deref(), Some("HELLO"));
    let (again, same) = by_hash
        .load_or_compute::<String>(
            &Source::path(&src),
            Some(Producer::new("upper", |_, _| panic!("path form must hit"))),
            false,
        )
        .unwrap();
    assert_eq!(again.as_deref(), Some("HELLO"));
    assert_eq!(digest, same);

    let by_mtime = DiskCache::by_mtime(dir.path().join("by_mtime")).unwrap();
    let (value, _) = by_mtime
        .load_or_compute(&text, Some(Producer::new("upper", upper)), false)
        .unwrap();
    assert_eq!(value.as_deref(), Some("HELLO"));
}

#[test]
fn unregistered_source_kind_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::by_hash(dir.path().join("cache")).unwrap();
    let err = cache
        .load::<String>(&Source::hashes(["deadbeef"]))
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::NoMatchingHeader {
            kind: SourceKind::Hashes
        }
    ));
    assert!(err.to_string().contains("hashes"));
}

#[test]
fn object_sources_with_custom_registration() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = DiskCache::new(dir.path().join("cache")).unwrap();
    cache.register_header_type(SourceKind::Object, |source, reader_id| {
        Ok(Header::new(source, reader_id, stowage_cache::ByObj, ByExist))
    });

    let settings = vec![("width", 80u32), ("height", 24)];
    let source = Source::object(&settings).unwrap();
    let stem = cache.save(&"rendered".to_string(), &source).unwrap();

    let same = Source::object(&vec![("width", 80u32), ("height", 24)]).unwrap();
    let (value, loaded) = cache.load::<String>(&same).unwrap();
    assert_eq!(loaded, stem);
    assert_eq!(value.as_deref(), Some("rendered"));

    let fields = cache.read_sidecar(&stem).unwrap().unwrap();
    let source_field = fields.iter().find(|(k, _)| k == "source").unwrap();
    assert!(source_field.1.contains("width"));
}

#[test]
fn hash_lists_are_order_independent() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = DiskCache::new(dir.path().join("cache")).unwrap();
    cache.register_header_type(SourceKind::Hashes, |source, reader_id| {
        Ok(Header::new(source, reader_id, ByHashIter, ByExist))
    });
    let stem = cache
        .save(&42u64, &Source::hashes(["c1", "a2", "b3"]))
        .unwrap();
    let (value, other) = cache
        .load::<u64>(&Source::hashes(["b3", "c1", "a2"]))
        .unwrap();
    assert_eq!(value, Some(42));
    assert_eq!(stem, other);
}

#[test]
fn field_headers_via_registration() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = DiskCache::new(dir.path().join("cache")).unwrap();
    cache.register_header_type(SourceKind::Text, |source, reader_id| {
        Ok(Header::new(source, reader_id, ByFields, ByExist).with_field("dialect", "v2"))
    });
    let stem = cache.save(&vec![1u8, 2, 3], &Source::from("anything")).unwrap();
    let fields = cache.read_sidecar(&stem).unwrap().unwrap();
    assert!(fields.contains(&("dialect".to_string(), "v2".to_string())));
    assert!(fields.contains(&("source".to_string(), "anything".to_string())));
}

#[test]
fn corrupted_artifact_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("greeting.txt");
    fs::write(&src, "hello").unwrap();
    let cache = DiskCache::by_hash(dir.path().join("cache")).unwrap();
    let source = Source::path(&src);
    let stem = cache.save(&"HELLO".to_string(), &source).unwrap();

    fs::write(cache.artifact_path(&stem), b"\xff\xff\xff\xff").unwrap();
    let err = cache.load::<String>(&source).unwrap_err();
    assert!(matches!(err, CacheError::Serialization { .. }));
}

#[test]
fn missing_source_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::by_hash(dir.path().join("cache")).unwrap();
    let err = cache
        .load::<String>(&Source::path(dir.path().join("absent.txt")))
        .unwrap_err();
    assert!(matches!(err, CacheError::Io { .. }));
}

#[test]
fn missing_path_fails_before_the_producer_runs() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.txt");
    let cache = DiskCache::by_mtime(dir.path().join("cache")).unwrap();
    let err = cache
        .load_or_compute::<String>(
            &Source::path(&absent),
            Some(Producer::new("upper", |_, _| panic!("no source, no producer call"))),
            false,
        )
        .unwrap_err();
    assert!(matches!(err, CacheError::Io { ref path, .. } if *path == absent));
    assert_eq!(cache.entries().unwrap().len(), 0);
}
