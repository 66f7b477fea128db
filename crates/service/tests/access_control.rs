//! Integration tests for Access and Group files as seen through the
//! directory operations

mod common;

use ::common::entry::{DirEntry, Packing};
use ::common::error::DirError;

use crate::common::{complete, ctx, setup_http_env, setup_test_env, setup_with_root, user, OWNER};

#[tokio::test]
async fn test_private_until_access_file_grants_read() {
    let env = setup_test_env().await;
    let owner = "a@x.com";
    env.mkdir(owner, "a@x.com/").await.unwrap();
    env.mkdir(owner, "a@x.com/docs").await.unwrap();
    env.put_file(owner, "a@x.com/docs/f", "contents")
        .await
        .unwrap();

    assert!(matches!(
        env.lookup("b@x.com", "a@x.com/docs/f").await,
        Err(DirError::Private(_))
    ));

    env.put_file(owner, "a@x.com/Access", "read: *@x.com")
        .await
        .unwrap();

    let entry = complete(env.lookup("b@x.com", "a@x.com/docs/f").await.unwrap());
    assert!(!entry.incomplete);
    assert_eq!(entry.blocks.len(), 1);

    // the grant is by domain
    assert!(matches!(
        env.lookup("b@y.com", "a@x.com/docs/f").await,
        Err(DirError::Private(_))
    ));
}

#[tokio::test]
async fn test_some_rights_turn_private_into_permission() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/Access", "list: bob@example.com")
        .await
        .unwrap();

    assert!(matches!(
        env.put_file("bob@example.com", "ann@example.com/f", "x").await,
        Err(DirError::Permission(_))
    ));
    assert!(matches!(
        env.put_file("carol@example.com", "ann@example.com/f", "x").await,
        Err(DirError::Private(_))
    ));
}

#[tokio::test]
async fn test_create_and_write_are_distinct() {
    let env = setup_with_root().await;
    env.put_file(
        OWNER,
        "ann@example.com/Access",
        "create, read: bob@example.com\n*: ann@example.com",
    )
    .await
    .unwrap();

    let mut entry = env.file_entry("bob@example.com", "ann@example.com/new", "x");
    let created = env
        .server
        .put(&ctx("bob@example.com"), entry.clone())
        .await
        .unwrap();
    assert_eq!(complete(created).writer, user("bob@example.com"));

    entry.sequence = 0;
    assert!(matches!(
        env.server.put(&ctx("bob@example.com"), entry).await,
        Err(DirError::Permission(_))
    ));
}

#[tokio::test]
async fn test_groups_grant_transitively() {
    let env = setup_with_root().await;
    env.mkdir(OWNER, "ann@example.com/Group").await.unwrap();
    env.put_file(OWNER, "ann@example.com/Group/friends", "bob@example.com, family")
        .await
        .unwrap();
    env.put_file(OWNER, "ann@example.com/Group/family", "carol@example.com")
        .await
        .unwrap();
    env.put_file(OWNER, "ann@example.com/f", "x").await.unwrap();
    env.put_file(
        OWNER,
        "ann@example.com/Access",
        "read: friends\n*: ann@example.com",
    )
    .await
    .unwrap();

    for reader in ["bob@example.com", "carol@example.com"] {
        let entry = complete(env.lookup(reader, "ann@example.com/f").await.unwrap());
        assert!(!entry.incomplete, "{reader} should read");
    }
    assert!(matches!(
        env.lookup("dave@example.com", "ann@example.com/f").await,
        Err(DirError::Private(_))
    ));

    // membership changes apply immediately
    env.put_file(OWNER, "ann@example.com/Group/family", "dave@example.com")
        .await
        .unwrap();
    assert!(env.lookup("dave@example.com", "ann@example.com/f").await.is_ok());
    assert!(matches!(
        env.lookup("carol@example.com", "ann@example.com/f").await,
        Err(DirError::Private(_))
    ));
}

#[tokio::test]
async fn test_deleting_access_file_restores_owner_only() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/f", "x").await.unwrap();
    env.put_file(OWNER, "ann@example.com/Access", "read: all")
        .await
        .unwrap();
    assert!(env.lookup("bob@example.com", "ann@example.com/f").await.is_ok());

    env.delete(OWNER, "ann@example.com/Access").await.unwrap();
    assert!(matches!(
        env.lookup("bob@example.com", "ann@example.com/f").await,
        Err(DirError::Private(_))
    ));
}

#[tokio::test]
async fn test_owner_keeps_control_of_access_files() {
    let env = setup_with_root().await;
    // grants the owner nothing on ordinary files
    env.put_file(OWNER, "ann@example.com/Access", "read: bob@example.com")
        .await
        .unwrap();
    assert!(matches!(
        env.put_file(OWNER, "ann@example.com/f", "x").await,
        Err(DirError::Private(_))
    ));

    env.put_file(OWNER, "ann@example.com/Access", "*: ann@example.com")
        .await
        .unwrap();
    assert!(env.put_file(OWNER, "ann@example.com/f", "x").await.is_ok());
}

#[tokio::test]
async fn test_special_files_are_validated() {
    let env = setup_with_root().await;

    assert!(matches!(
        env.put_file(OWNER, "ann@example.com/Access", "read bob@example.com")
            .await,
        Err(DirError::Invalid { .. })
    ));

    let mut encrypted = env.file_entry(OWNER, "ann@example.com/Access", "read: all");
    encrypted.packing = Packing::EE;
    assert!(matches!(
        env.server.put(&ctx(OWNER), encrypted).await,
        Err(DirError::Invalid { .. })
    ));

    assert!(matches!(
        env.mkdir(OWNER, "ann@example.com/Access").await,
        Err(DirError::Invalid { .. })
    ));

    assert!(matches!(
        env.put_file(OWNER, "ann@example.com/Group", "bob@example.com")
            .await,
        Err(DirError::Invalid { .. })
    ));

    env.mkdir(OWNER, "ann@example.com/Group").await.unwrap();
    assert!(matches!(
        env.put_file(OWNER, "ann@example.com/Group/bob@example.com", "x")
            .await,
        Err(DirError::Invalid { .. })
    ));
    let link = DirEntry::link(
        "ann@example.com/Group/l".into(),
        "bob@example.com/Group/x".into(),
        user(OWNER),
    );
    assert!(matches!(
        env.server.put(&ctx(OWNER), link).await,
        Err(DirError::Invalid { .. })
    ));
}

#[tokio::test]
async fn test_only_the_owner_writes_special_files() {
    let env = setup_with_root().await;
    env.put_file(OWNER, "ann@example.com/Access", "*: all")
        .await
        .unwrap();

    assert!(matches!(
        env.put_file("bob@example.com", "ann@example.com/Access", "*: bob@example.com")
            .await,
        Err(DirError::Permission(_))
    ));
    assert!(env
        .put_file("bob@example.com", "ann@example.com/notes", "hi")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_access_file_with_huge_block_is_invalid() {
    let env = setup_http_env().await;
    let eve = "eve@example.com";
    env.mkdir(eve, "eve@example.com/").await.unwrap();

    let mut access = DirEntry::file("eve@example.com/Access".into(), user(eve), Packing::Plain);
    let mut block = env.content.store(b"r: all");
    block.size = i64::MAX;
    access.blocks.push(block);

    assert!(matches!(
        env.server.put(&ctx(eve), access).await,
        Err(DirError::Invalid { .. })
    ));
    assert!(matches!(
        env.lookup(eve, "eve@example.com/Access").await,
        Err(DirError::NotExist(_))
    ));
}
