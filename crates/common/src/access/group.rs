use super::{is_group_file, tokens, AccessError, Grantee};
use crate::path::Parsed;

/// Parses the member list of a group file.
///
/// Members are separated by commas or whitespace and may be users,
/// `*@domain` wildcards, `all`, or other groups. `#` starts a comment.
pub fn parse_group(name: &Parsed, data: &[u8]) -> Result<Vec<Grantee>, AccessError> {
    let path = name.path();
    if !is_group_file(name) || name.n_elem() < 2 {
        return Err(AccessError::Syntax {
            name: path,
            line: 0,
            msg: "not a group file".to_string(),
        });
    }
    let text = std::str::from_utf8(data).map_err(|_| AccessError::NotUtf8(path.clone()))?;

    let mut members = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or_default();
        for token in tokens(content) {
            let member =
                Grantee::parse(token, name.user()).ok_or_else(|| AccessError::InvalidGrantee {
                    name: path.clone(),
                    line: index + 1,
                    grantee: token.to_string(),
                })?;
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }
    Ok(members)
}
