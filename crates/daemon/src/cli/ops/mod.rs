pub mod glob;
pub mod health;
pub mod lookup;
pub mod mkdir;
pub mod rm;
pub mod serve;
pub mod which_access;

pub use glob::Glob;
pub use health::Health;
pub use lookup::Lookup;
pub use mkdir::Mkdir;
pub use rm::Rm;
pub use serve::Serve;
pub use which_access::WhichAccess;

use common::entry::DirEntry;

/// One line per entry, as printed by the client commands.
pub(crate) fn format_entry(entry: &DirEntry) -> String {
    let kind = if entry.is_dir() {
        "dir"
    } else if entry.is_link() {
        "link"
    } else {
        "file"
    };
    let mut line = format!("{} ({}) seq={}", entry.name, kind, entry.sequence);
    if let Some(target) = &entry.link {
        line.push_str(&format!(" -> {}", target));
    }
    if entry.is_regular() {
        match entry.size() {
            Some(size) => line.push_str(&format!(" size={}", size)),
            None => line.push_str(" size=?"),
        }
    }
    if entry.incomplete {
        line.push_str(" [incomplete]");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::entry::Packing;
    use common::path::UserName;

    #[test]
    fn test_format_entry() {
        let ann = UserName::parse("ann@example.com").unwrap();
        let mut dir = DirEntry::directory("ann@example.com/d".into(), ann.clone());
        dir.sequence = 4;
        assert_eq!(format_entry(&dir), "ann@example.com/d (dir) seq=4");

        let link = DirEntry::link("ann@example.com/l".into(), "bob@example.com/x".into(), ann.clone());
        assert_eq!(
            format_entry(&link),
            "ann@example.com/l (link) seq=0 -> bob@example.com/x"
        );

        let mut file = DirEntry::file("ann@example.com/f".into(), ann, Packing::Plain);
        file.mark_incomplete();
        assert_eq!(format_entry(&file), "ann@example.com/f (file) seq=0 size=0 [incomplete]");
    }
}
