//! Integration tests for WhichAccess

mod common;

use ::common::error::DirError;

use crate::common::{complete, ctx, setup_with_root, OWNER};

#[tokio::test]
async fn test_fresh_root_has_no_access_file() {
    let env = setup_with_root().await;

    let found = env
        .server
        .which_access(&ctx(OWNER), &"ann@example.com/".into())
        .await
        .unwrap();
    assert!(complete(found).is_none());

    // the path need not exist
    let found = env
        .server
        .which_access(&ctx(OWNER), &"ann@example.com/not/there".into())
        .await
        .unwrap();
    assert!(complete(found).is_none());

    assert!(matches!(
        env.server
            .which_access(&ctx("bob@example.com"), &"ann@example.com/".into())
            .await,
        Err(DirError::Private(_))
    ));
}

#[tokio::test]
async fn test_nearest_access_file_is_reported() {
    let env = setup_with_root().await;
    env.mkdir(OWNER, "ann@example.com/a").await.unwrap();
    env.mkdir(OWNER, "ann@example.com/a/b").await.unwrap();
    env.put_file(OWNER, "ann@example.com/Access", "r: all")
        .await
        .unwrap();
    env.put_file(OWNER, "ann@example.com/a/Access", "r,l: bob@example.com, ann@example.com")
        .await
        .unwrap();

    let found = complete(
        env.server
            .which_access(&ctx(OWNER), &"ann@example.com/a/b/f".into())
            .await
            .unwrap(),
    );
    assert_eq!(found.unwrap().name.as_str(), "ann@example.com/a/Access");

    // anyone may now ask about the top level
    let found = complete(
        env.server
            .which_access(&ctx("carol@example.com"), &"ann@example.com/x".into())
            .await
            .unwrap(),
    );
    assert_eq!(found.unwrap().name.as_str(), "ann@example.com/Access");
}
