//! Table cache behaviour across threads
use hclparse::cache::TableCache;
use hclparse::{ParseTable, Parser, ParserConfig, Value};
use pretty_assertions::assert_eq;

#[test]
fn concurrent_cold_builds_leave_one_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parsetab.bin");

    let tables: Vec<ParseTable> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                scope.spawn(move || TableCache::new(path).load_or_build())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let fresh = ParseTable::build();
    assert!(tables.iter().all(|table| *table == fresh));
    assert_eq!(TableCache::new(path).load().unwrap(), fresh);

    // no temporary files left behind
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn parsers_from_a_shared_cache_agree() {
    let dir = tempfile::tempdir().unwrap();
    let config = ParserConfig::with_cache_file(dir.path().join("tables").join("parsetab.bin"));

    let parsers: Vec<Parser> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| Parser::from_config(&config)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for parser in &parsers {
        let value = parser.parse("svc a { port = 1 }").unwrap();
        assert_eq!(
            value.get("svc").and_then(|svc| svc.get("a")).and_then(|a| a.get("port")),
            Some(&Value::Int(1))
        );
    }
}

#[test]
fn corrupt_cache_does_not_fail_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parsetab.bin");
    std::fs::write(&path, vec![0xff; 512]).unwrap();

    let parser = Parser::from_config(&ParserConfig::with_cache_file(&path));
    assert_eq!(
        parser.parse("a = true").unwrap().get("a"),
        Some(&Value::Bool(true))
    );
    assert_eq!(TableCache::new(path).load().unwrap(), ParseTable::build());
}
