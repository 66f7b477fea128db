/**
 * Access file and group file grammar, plus
 *  the rules for evaluating a right against them.
 */
pub mod access;
/**
 * The storage contract for directory trees
 *  and an in-memory implementation of it.
 */
pub mod dir_store;
/**
 * Directory entries: the metadata record
 *  for every name in a tree.
 */
pub mod entry;
/**
 * Client-visible errors and the link
 *  resolution result type.
 */
pub mod error;
/**
 * User names, wire path names and
 *  their cleaned, parsed form.
 */
pub mod path;

pub mod prelude {
    pub use crate::access::{Access, Grantee, Right};
    pub use crate::dir_store::{DirStore, DirStoreError, EntryRef, PutCondition};
    pub use crate::entry::{
        DirBlock, DirEntry, EntryKind, Packing, Sequence, SEQ_BASE, SEQ_IGNORE, SEQ_NOT_EXIST,
    };
    pub use crate::error::{DirError, ErrorKind, Resolution};
    pub use crate::path::{Parsed, PathName, UserName};
}
