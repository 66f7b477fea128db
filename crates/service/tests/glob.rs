//! Integration tests for Glob

mod common;

use ::common::entry::DirEntry;
use ::common::error::DirError;

use crate::common::{ctx, setup_with_root, user, OWNER};

fn names(entries: &[DirEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[tokio::test]
async fn test_literal_pattern_matches_one_entry() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/f", "x").await.unwrap();

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/f")
        .await
        .unwrap();
    assert_eq!(names(&found.entries), ["ann@example.com/f"]);
    assert!(!found.follow_link);

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/missing")
        .await
        .unwrap();
    assert!(found.entries.is_empty());
}

#[tokio::test]
async fn test_wildcard_below_regular_file_matches_nothing() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/file", "x")
        .await
        .unwrap();

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/file/*")
        .await
        .unwrap();
    assert!(found.entries.is_empty());
}

#[tokio::test]
async fn test_wildcards_expand_level_by_level() {
    let env = setup_with_root().await;
    env.mkdir(OWNER, "ann@example.com/a").await.unwrap();
    env.mkdir(OWNER, "ann@example.com/b").await.unwrap();
    env.put_file(OWNER, "ann@example.com/a/x.txt", "1").await.unwrap();
    env.put_file(OWNER, "ann@example.com/a/y.md", "2").await.unwrap();
    env.put_file(OWNER, "ann@example.com/b/x.txt", "3").await.unwrap();

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/*/x.txt")
        .await
        .unwrap();
    assert_eq!(
        names(&found.entries),
        ["ann@example.com/a/x.txt", "ann@example.com/b/x.txt"]
    );

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/a/*")
        .await
        .unwrap();
    assert_eq!(
        names(&found.entries),
        ["ann@example.com/a/x.txt", "ann@example.com/a/y.md"]
    );

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/[ab]/?.txt")
        .await
        .unwrap();
    assert_eq!(found.entries.len(), 2);
}

#[tokio::test]
async fn test_links_interrupt_expansion() {
    let env = setup_with_root().await;
    env.mkdir(OWNER, "ann@example.com/a").await.unwrap();
    env.put_file(OWNER, "ann@example.com/a/f", "x").await.unwrap();
    let link = DirEntry::link(
        "ann@example.com/l".into(),
        "bob@example.com/".into(),
        user(OWNER),
    );
    env.server.put(&ctx(OWNER), link).await.unwrap();

    let found = env
        .server
        .glob(&ctx(OWNER), "ann@example.com/*/f")
        .await
        .unwrap();
    assert!(found.follow_link);
    assert_eq!(
        names(&found.entries),
        ["ann@example.com/a/f", "ann@example.com/l"]
    );
}

#[tokio::test]
async fn test_glob_rights() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/f", "x").await.unwrap();

    assert!(matches!(
        env.server.glob(&ctx("bob@example.com"), "ann@example.com/*").await,
        Err(DirError::Private(_))
    ));

    env.put_file(OWNER, "ann@example.com/Access", "read: bob@example.com")
        .await
        .unwrap();
    assert!(matches!(
        env.server.glob(&ctx("bob@example.com"), "ann@example.com/*").await,
        Err(DirError::Permission(_))
    ));

    env.put_file(OWNER, "ann@example.com/Access", "list: bob@example.com")
        .await
        .unwrap();
    let found = env
        .server
        .glob(&ctx("bob@example.com"), "ann@example.com/*")
        .await
        .unwrap();
    assert_eq!(
        names(&found.entries),
        ["ann@example.com/Access", "ann@example.com/f"]
    );
    // listed but not readable: contents are elided, Access files are not
    let f = &found.entries[1];
    assert!(f.incomplete);
    assert!(f.blocks.is_empty());
    assert!(!found.entries[0].incomplete);
}

#[tokio::test]
async fn test_bad_pattern_is_invalid() {
    let env = setup_with_root().await;
    assert!(matches!(
        env.server.glob(&ctx(OWNER), "ann@example.com/[a").await,
        Err(DirError::Invalid { .. })
    ));
}
