use async_trait::async_trait;
use sqlx::{Row, SqliteConnection};

use common::dir_store::{DirStore, DirStoreError, EntryRef, LogOp, LogRecord, PutCondition};
use common::entry::{DirBlock, DirEntry, EntryKind, Sequence};
use common::path::{Parsed, PathName, UserName};

use super::types::{block_from_row, decode_error, entry_from_row, kind_code, kind_from_code, ENTRY_COLUMNS};
use super::Database;

type StoreResult<T> = Result<T, DirStoreError<sqlx::Error>>;

async fn fetch_blocks(conn: &mut SqliteConnection, put_id: i64) -> Result<Vec<DirBlock>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT transport, net_addr, reference, block_offset, block_size, packdata
        FROM block
        WHERE put = ?
        ORDER BY position
        "#,
    )
    .bind(put_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(block_from_row).collect()
}

async fn fetch_entry(conn: &mut SqliteConnection, name: &PathName) -> Result<Option<DirEntry>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM projection pr
        INNER JOIN log_operation o ON pr.operation = o.id
        INNER JOIN log_put p ON o.put = p.id
        WHERE pr.name = ?
        "#
    );
    let Some(row) = sqlx::query(&query)
        .bind(name.as_str())
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let (mut entry, put_id) = entry_from_row(&row)?;
    entry.blocks = fetch_blocks(conn, put_id).await?;
    Ok(Some(entry))
}

async fn fetch_children(conn: &mut SqliteConnection, parent: &PathName) -> Result<Vec<DirEntry>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM projection pr
        INNER JOIN log_operation o ON pr.operation = o.id
        INNER JOIN log_put p ON o.put = p.id
        WHERE pr.parent = ?
        ORDER BY pr.name
        "#
    );
    let rows = sqlx::query(&query)
        .bind(parent.as_str())
        .fetch_all(&mut *conn)
        .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let (mut entry, put_id) = entry_from_row(row)?;
        entry.blocks = fetch_blocks(conn, put_id).await?;
        entries.push(entry);
    }
    Ok(entries)
}

async fn root_id(conn: &mut SqliteConnection, user: &UserName) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM root WHERE username = ?")
        .bind(user.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| r.try_get("id")).transpose()
}

async fn current_sequence(conn: &mut SqliteConnection, name: &PathName) -> Result<Option<Sequence>, sqlx::Error> {
    let row = sqlx::query("SELECT sequence FROM projection WHERE name = ?")
        .bind(name.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| r.try_get("sequence")).transpose()
}

/// `1 + max(sequence)` over `path` and every existing ancestor.
async fn next_sequence(conn: &mut SqliteConnection, path: &Parsed) -> Result<Sequence, sqlx::Error> {
    let mut max = 0;
    for i in 0..=path.n_elem() {
        if let Some(seq) = current_sequence(conn, &path.first(i).path()).await? {
            max = max.max(seq);
        }
    }
    Ok(max + 1)
}

async fn bump_ancestors(conn: &mut SqliteConnection, path: &Parsed, seq: Sequence) -> Result<(), sqlx::Error> {
    for ancestor in path.ancestors() {
        sqlx::query("UPDATE projection SET sequence = ? WHERE name = ?")
            .bind(seq)
            .bind(ancestor.path().as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn upsert_row(conn: &mut SqliteConnection, path: &Parsed, operation: i64, seq: Sequence) -> Result<(), sqlx::Error> {
    let parent = path.parent().map(|p| p.path().as_str().to_string());
    sqlx::query(
        r#"
        INSERT INTO projection (name, parent, operation, sequence)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            operation = excluded.operation,
            sequence = excluded.sequence
        "#,
    )
    .bind(path.path().as_str())
    .bind(parent)
    .bind(operation)
    .bind(seq)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn remove_row(conn: &mut SqliteConnection, name: &PathName) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projection WHERE name = ?")
        .bind(name.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_put(conn: &mut SqliteConnection, entry: &DirEntry) -> Result<i64, sqlx::Error> {
    let put_id = sqlx::query(
        r#"
        INSERT INTO log_put (writer, kind, link, packing, packdata)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.writer.as_str())
    .bind(kind_code(entry.kind))
    .bind(entry.link.as_ref().map(|l| l.as_str().to_string()))
    .bind(u8::from(entry.packing) as i64)
    .bind(&entry.packdata)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for (position, block) in entry.blocks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO block (put, position, transport, net_addr, reference, block_offset, block_size, packdata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(put_id)
        .bind(position as i64)
        .bind(u8::from(block.location.endpoint.transport) as i64)
        .bind(&block.location.endpoint.net_addr)
        .bind(&block.location.reference)
        .bind(block.offset)
        .bind(block.size)
        .bind(&block.packdata)
        .execute(&mut *conn)
        .await?;
    }
    Ok(put_id)
}

async fn append_operation(
    conn: &mut SqliteConnection,
    root: i64,
    path: &Parsed,
    timestamp: i64,
    seq: Sequence,
    put: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO log_operation (root, path, timestamp, sequence, put)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(root)
    .bind(path.file_path())
    .bind(timestamp)
    .bind(seq)
    .bind(put)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

impl Database {
    /// Discards the projection and rebuilds it by replaying every logged
    /// operation in order. Returns the number of operations replayed.
    pub async fn rebuild_projection(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM projection").execute(&mut *tx).await?;

        let ops = sqlx::query(
            r#"
            SELECT o.id AS id, r.username AS username, o.path AS path, o.put AS put
            FROM log_operation o
            INNER JOIN root r ON o.root = r.id
            ORDER BY o.id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        for row in &ops {
            let username: String = row.try_get("username")?;
            let file_path: String = row.try_get("path")?;
            let path = Parsed::parse(&PathName::new(format!("{username}{file_path}")))
                .map_err(|e| decode_error(e.to_string()))?;
            let id: i64 = row.try_get("id")?;
            let put: Option<i64> = row.try_get("put")?;

            match put {
                Some(_) => {
                    let seq = next_sequence(&mut tx, &path).await?;
                    bump_ancestors(&mut tx, &path, seq).await?;
                    upsert_row(&mut tx, &path, id, seq).await?;
                }
                None => {
                    remove_row(&mut tx, &path.path()).await?;
                    let seq = next_sequence(&mut tx, &path).await?;
                    bump_ancestors(&mut tx, &path, seq).await?;
                }
            }
        }

        tx.commit().await?;
        tracing::info!(operations = ops.len(), "rebuilt projection from log");
        Ok(ops.len() as u64)
    }
}

#[async_trait]
impl DirStore for Database {
    type Error = sqlx::Error;

    async fn lookup_elem(&self, path: &Parsed) -> StoreResult<Option<EntryRef>> {
        let mut tx = self.begin().await?;

        let mut found = None;
        for i in 0..=path.n_elem() {
            let prefix = path.first(i);
            let row = sqlx::query(
                r#"
                SELECT pr.operation AS operation, pr.sequence AS sequence, p.kind AS kind
                FROM projection pr
                INNER JOIN log_operation o ON pr.operation = o.id
                INNER JOIN log_put p ON o.put = p.id
                WHERE pr.name = ?
                "#,
            )
            .bind(prefix.path().as_str())
            .fetch_optional(&mut *tx)
            .await?;
            let Some(row) = row else {
                break;
            };

            let kind = kind_from_code(row.try_get("kind")?)?;
            found = Some(EntryRef {
                id: row.try_get("operation")?,
                path: prefix,
                kind,
                sequence: row.try_get("sequence")?,
            });
            if kind != EntryKind::Directory {
                break;
            }
        }

        tx.commit().await?;
        Ok(found)
    }

    async fn lookup_all(&self, path: &Parsed) -> StoreResult<Vec<DirEntry>> {
        let mut tx = self.begin().await?;

        let mut chain = Vec::new();
        for i in 0..=path.n_elem() {
            let Some(entry) = fetch_entry(&mut tx, &path.first(i).path()).await? else {
                break;
            };
            let is_link = entry.is_link();
            chain.push(entry);
            if is_link {
                break;
            }
        }

        tx.commit().await?;
        Ok(chain)
    }

    async fn lookup(&self, name: &PathName) -> StoreResult<Option<DirEntry>> {
        let mut tx = self.begin().await?;
        let entry = fetch_entry(&mut tx, name).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn list(&self, dir: &EntryRef) -> StoreResult<Vec<DirEntry>> {
        if dir.kind != EntryKind::Directory {
            return Ok(Vec::new());
        }
        let mut tx = self.begin().await?;
        let entries = fetch_children(&mut tx, &dir.path.path()).await?;
        tx.commit().await?;
        Ok(entries)
    }

    async fn put(&self, entry: &DirEntry, condition: PutCondition) -> StoreResult<Sequence> {
        let path = Parsed::parse(&entry.name).map_err(DirStoreError::InvalidPath)?;
        let name = path.path();

        let mut tx = self.begin().await?;
        // the first statement writes so the write lock is held before any read
        let put_id = insert_put(&mut tx, entry).await?;

        if path.is_root() {
            sqlx::query(
                r#"
                INSERT INTO root (username, created_at)
                VALUES (?, ?)
                ON CONFLICT(username) DO NOTHING
                "#,
            )
            .bind(path.user().as_str())
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
        }
        let Some(root) = root_id(&mut tx, path.user()).await? else {
            return Err(DirStoreError::RootNotFound(path.user().clone()));
        };

        let current = current_sequence(&mut tx, &name).await?;
        if !condition.holds(current) {
            return Err(DirStoreError::Conflict {
                name,
                condition,
                current,
            });
        }

        let seq = next_sequence(&mut tx, &path).await?;
        let operation = append_operation(&mut tx, root, &path, entry.time, seq, Some(put_id)).await?;
        bump_ancestors(&mut tx, &path, seq).await?;
        upsert_row(&mut tx, &path, operation, seq).await?;

        tx.commit().await?;
        Ok(seq)
    }

    async fn delete(&self, path: &Parsed) -> StoreResult<Sequence> {
        let name = path.path();

        let mut tx = self.begin().await?;
        remove_row(&mut tx, &name).await?;

        let Some(root) = root_id(&mut tx, path.user()).await? else {
            return Err(DirStoreError::RootNotFound(path.user().clone()));
        };

        let seq = next_sequence(&mut tx, path).await?;
        append_operation(&mut tx, root, path, chrono::Utc::now().timestamp(), seq, None).await?;
        bump_ancestors(&mut tx, path, seq).await?;

        tx.commit().await?;
        Ok(seq)
    }

    async fn log(&self, user: &UserName) -> StoreResult<Vec<LogRecord>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT
                o.id AS id,
                r.username || o.path AS name,
                o.timestamp AS timestamp,
                o.sequence AS sequence,
                o.put AS put_id,
                p.writer AS writer,
                p.kind AS kind,
                p.link AS link,
                p.packing AS packing,
                p.packdata AS packdata
            FROM log_operation o
            INNER JOIN root r ON o.root = r.id
            LEFT JOIN log_put p ON o.put = p.id
            WHERE r.username = ?
            ORDER BY o.id
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let put_id: Option<i64> = row.try_get("put_id")?;
            let op = match put_id {
                Some(put_id) => {
                    let (mut entry, _) = entry_from_row(row)?;
                    entry.blocks = fetch_blocks(&mut tx, put_id).await?;
                    LogOp::Put(Box::new(entry))
                }
                None => LogOp::Delete,
            };
            let name: String = row.try_get("name")?;
            records.push(LogRecord {
                id: row.try_get("id")?,
                name: PathName::new(name),
                time: row.try_get("timestamp")?,
                sequence: row.try_get("sequence")?,
                op,
            });
        }

        tx.commit().await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::entry::{Endpoint, Location, Packing, Transport};

    fn user() -> UserName {
        UserName::parse("foo@example.com").unwrap()
    }

    fn path(s: &str) -> Parsed {
        Parsed::parse(&PathName::from(s)).unwrap()
    }

    fn dir(name: &str) -> DirEntry {
        DirEntry::directory(name.into(), user())
    }

    fn file(name: &str) -> DirEntry {
        let mut entry = DirEntry::file(name.into(), user(), Packing::EEIntegrity);
        entry.time = 1_700_000_000;
        entry.packdata = vec![7, 7, 7];
        entry.blocks = vec![
            DirBlock {
                location: Location {
                    endpoint: Endpoint {
                        transport: Transport::Remote,
                        net_addr: "store.example.com:443".into(),
                    },
                    reference: "block-a".into(),
                },
                offset: 0,
                size: 100,
                packdata: vec![1],
            },
            DirBlock {
                location: Location {
                    endpoint: Endpoint {
                        transport: Transport::Remote,
                        net_addr: "store.example.com:443".into(),
                    },
                    reference: "block-b".into(),
                },
                offset: 100,
                size: 20,
                packdata: vec![2],
            },
        ];
        entry
    }

    async fn seq_of(db: &Database, name: &str) -> Sequence {
        db.lookup(&name.into()).await.unwrap().unwrap().sequence
    }

    async fn projection(db: &Database) -> Vec<(String, Option<String>, i64, i64)> {
        sqlx::query("SELECT name, parent, operation, sequence FROM projection ORDER BY name")
            .fetch_all(&**db)
            .await
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r.get("name"),
                    r.get("parent"),
                    r.get("operation"),
                    r.get("sequence"),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_put_assigns_cascading_sequences() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap(), 1);
        assert_eq!(db.put(&dir("foo@example.com/bar"), PutCondition::Any).await.unwrap(), 2);
        assert_eq!(db.put(&dir("foo@example.com/bar/baz"), PutCondition::Any).await.unwrap(), 3);
        assert_eq!(db.put(&dir("foo@example.com/bar/baz"), PutCondition::Any).await.unwrap(), 4);

        let chain = db.lookup_all(&path("foo@example.com/bar/baz")).await.unwrap();
        let seqs: Vec<Sequence> = chain.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, [4, 4, 4]);
    }

    #[tokio::test]
    async fn test_sibling_write_never_lowers_root() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        db.put(&dir("foo@example.com/a"), PutCondition::Any).await.unwrap();
        db.put(&dir("foo@example.com/b"), PutCondition::Any).await.unwrap();
        for _ in 0..3 {
            db.put(&file("foo@example.com/a/f"), PutCondition::Any).await.unwrap();
        }
        let root_before = seq_of(&db, "foo@example.com/").await;

        let seq = db.put(&file("foo@example.com/b/g"), PutCondition::Any).await.unwrap();
        assert!(seq > root_before);
        assert_eq!(seq_of(&db, "foo@example.com/").await, seq);
        assert!(seq_of(&db, "foo@example.com/a").await < seq);
    }

    #[tokio::test]
    async fn test_delete_truncates_chain_and_bumps_parent() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        db.put(&dir("foo@example.com/bar"), PutCondition::Any).await.unwrap();

        assert_eq!(db.delete(&path("foo@example.com/bar")).await.unwrap(), 3);
        assert_eq!(seq_of(&db, "foo@example.com/").await, 3);

        let chain = db.lookup_all(&path("foo@example.com/bar")).await.unwrap();
        assert_eq!(chain.len(), 1);

        // a new lineage starts above every previous ancestor sequence
        let seq = db.put(&dir("foo@example.com/bar"), PutCondition::NotExist).await.unwrap();
        assert_eq!(seq, 4);
    }

    #[tokio::test]
    async fn test_lookup_elem() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.lookup_elem(&path("foo@example.com/x")).await.unwrap().is_none());

        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        let found = db.lookup_elem(&path("foo@example.com/x/y")).await.unwrap().unwrap();
        assert!(found.path.is_root());
        assert_eq!(found.kind, EntryKind::Directory);

        db.put(&file("foo@example.com/f"), PutCondition::Any).await.unwrap();
        let found = db.lookup_elem(&path("foo@example.com/f/under")).await.unwrap().unwrap();
        assert_eq!(found.path, path("foo@example.com/f"));
        assert_eq!(found.kind, EntryKind::File);
    }

    #[tokio::test]
    async fn test_lookup_all_stops_at_link() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        db.put(
            &DirEntry::link("foo@example.com/l".into(), "bar@example.com/t".into(), user()),
            PutCondition::Any,
        )
        .await
        .unwrap();

        let chain = db.lookup_all(&path("foo@example.com/l/a/b")).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain[1].is_link());
        assert_eq!(chain[1].link.as_ref().unwrap().as_str(), "bar@example.com/t");
    }

    #[tokio::test]
    async fn test_entries_round_trip_with_blocks() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        let stored = file("foo@example.com/f");
        db.put(&stored, PutCondition::NotExist).await.unwrap();

        let got = db.lookup(&"foo@example.com/f".into()).await.unwrap().unwrap();
        assert_eq!(got.blocks, stored.blocks);
        assert_eq!(got.packdata, stored.packdata);
        assert_eq!(got.packing, Packing::EEIntegrity);
        assert_eq!(got.time, 1_700_000_000);
        assert_eq!(got.writer, user());
    }

    #[tokio::test]
    async fn test_list_orders_children() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        for name in ["foo", "baz", "bar"] {
            db.put(&dir(&format!("foo@example.com/{name}")), PutCondition::Any)
                .await
                .unwrap();
        }
        db.put(&dir("foo@example.com/bar/nested"), PutCondition::Any).await.unwrap();

        let root = db.lookup_elem(&path("foo@example.com/")).await.unwrap().unwrap();
        let names: Vec<String> = db
            .list(&root)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(
            names,
            ["foo@example.com/bar", "foo@example.com/baz", "foo@example.com/foo"]
        );
    }

    #[tokio::test]
    async fn test_conditional_put() {
        let db = Database::in_memory().await.unwrap();
        assert!(matches!(
            db.put(&dir("foo@example.com/a"), PutCondition::Any).await,
            Err(DirStoreError::RootNotFound(_))
        ));
        db.put(&dir("foo@example.com/"), PutCondition::NotExist).await.unwrap();
        db.put(&file("foo@example.com/f"), PutCondition::NotExist).await.unwrap();
        let seq = seq_of(&db, "foo@example.com/f").await;

        // two writers holding the same sequence: one wins
        db.put(&file("foo@example.com/f"), PutCondition::Sequence(seq)).await.unwrap();
        assert!(matches!(
            db.put(&file("foo@example.com/f"), PutCondition::Sequence(seq)).await,
            Err(DirStoreError::Conflict { .. })
        ));

        // nothing from the failed put was kept
        let log = db.log(&user()).await.unwrap();
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_log_records_puts_and_deletes() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        db.put(&file("foo@example.com/f"), PutCondition::Any).await.unwrap();
        db.delete(&path("foo@example.com/f")).await.unwrap();

        let log = db.log(&user()).await.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].name.as_str(), "foo@example.com/");
        match &log[1].op {
            LogOp::Put(entry) => {
                assert_eq!(entry.name.as_str(), "foo@example.com/f");
                assert_eq!(entry.blocks.len(), 2);
            }
            LogOp::Delete => panic!("expected a put"),
        }
        assert_eq!(log[2].op, LogOp::Delete);
        assert_eq!(log[2].sequence, 3);
        assert!(db
            .log(&UserName::parse("other@example.com").unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_projection_matches_replay() {
        let db = Database::in_memory().await.unwrap();
        db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        db.put(&dir("foo@example.com/a"), PutCondition::Any).await.unwrap();
        db.put(&file("foo@example.com/a/f"), PutCondition::Any).await.unwrap();
        db.put(&file("foo@example.com/a/f"), PutCondition::Any).await.unwrap();
        db.put(&dir("foo@example.com/b"), PutCondition::Any).await.unwrap();
        db.delete(&path("foo@example.com/a/f")).await.unwrap();
        db.put(&file("foo@example.com/b/g"), PutCondition::Any).await.unwrap();

        let before = projection(&db).await;
        let replayed = db.rebuild_projection().await.unwrap();
        assert_eq!(replayed, 7);
        assert_eq!(projection(&db).await, before);
    }

    #[tokio::test]
    async fn test_on_disk_database_survives_reopen() {
        let dir_path = tempfile::tempdir().unwrap();
        let url = url::Url::parse(&format!(
            "sqlite://{}",
            dir_path.path().join("dir.db").display()
        ))
        .unwrap();

        {
            let db = Database::connect(&url).await.unwrap();
            db.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
            db.put(&file("foo@example.com/f"), PutCondition::Any).await.unwrap();
            db.close().await;
        }

        let db = Database::connect(&url).await.unwrap();
        assert_eq!(seq_of(&db, "foo@example.com/f").await, 2);
        assert_eq!(seq_of(&db, "foo@example.com/").await, 2);
    }
}
