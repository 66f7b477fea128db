use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::entry::{DirBlock, DirEntry, EntryKind, Endpoint, Location, Packing, Transport};
use common::path::{PathName, UserName};

pub fn kind_code(kind: EntryKind) -> i64 {
    match kind {
        EntryKind::File => 0,
        EntryKind::Directory => 1,
        EntryKind::Link => 2,
    }
}

pub fn kind_from_code(code: i64) -> Result<EntryKind, sqlx::Error> {
    match code {
        0 => Ok(EntryKind::File),
        1 => Ok(EntryKind::Directory),
        2 => Ok(EntryKind::Link),
        other => Err(decode_error(format!("unknown entry kind {other}"))),
    }
}

pub fn decode_error(msg: impl Into<String>) -> sqlx::Error {
    let msg: String = msg.into();
    sqlx::Error::Decode(msg.into())
}

/// Columns every entry query selects, in this shape:
/// `name, sequence, timestamp, put_id, writer, kind, link, packing, packdata`.
pub const ENTRY_COLUMNS: &str = r#"
    pr.name AS name,
    pr.sequence AS sequence,
    o.timestamp AS timestamp,
    p.id AS put_id,
    p.writer AS writer,
    p.kind AS kind,
    p.link AS link,
    p.packing AS packing,
    p.packdata AS packdata
"#;

/// Decodes an entry without its blocks. Returns the `log_put` id so the
/// caller can attach them.
pub fn entry_from_row(row: &SqliteRow) -> Result<(DirEntry, i64), sqlx::Error> {
    let name: String = row.try_get("name")?;
    let writer: String = row.try_get("writer")?;
    let writer = UserName::parse(&writer).map_err(|e| decode_error(e.to_string()))?;
    let packing: i64 = row.try_get("packing")?;
    let packing = u8::try_from(packing)
        .map_err(|e| decode_error(e.to_string()))
        .and_then(|p| Packing::try_from(p).map_err(|e| decode_error(e.to_string())))?;
    let link: Option<String> = row.try_get("link")?;
    let name = PathName::new(name);

    let entry = DirEntry {
        signed_name: name.clone(),
        name,
        kind: kind_from_code(row.try_get("kind")?)?,
        incomplete: false,
        packing,
        time: row.try_get("timestamp")?,
        blocks: Vec::new(),
        packdata: row.try_get("packdata")?,
        link: link.map(PathName::new),
        writer,
        sequence: row.try_get("sequence")?,
    };
    Ok((entry, row.try_get("put_id")?))
}

pub fn block_from_row(row: &SqliteRow) -> Result<DirBlock, sqlx::Error> {
    let transport: i64 = row.try_get("transport")?;
    let transport = u8::try_from(transport)
        .map_err(|e| decode_error(e.to_string()))
        .and_then(|t| Transport::try_from(t).map_err(|e| decode_error(e.to_string())))?;
    Ok(DirBlock {
        location: Location {
            endpoint: Endpoint {
                transport,
                net_addr: row.try_get("net_addr")?,
            },
            reference: row.try_get("reference")?,
        },
        offset: row.try_get("block_offset")?,
        size: row.try_get("block_size")?,
        packdata: row.try_get("packdata")?,
    })
}
