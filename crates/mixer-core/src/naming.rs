//! Placeholder prefixes and chain alias naming.
//!
//! Parts mark the members they expect from elsewhere with [`REQUIRES_PREFIX`]
//! and the hooks that delegate to the next layer of an override chain with
//! [`NEXT_PREFIX`]. When several parts define the same method, the copies are
//! stored under chain aliases: `print`, `print#0`, `print#1`, ... where the
//! unsuffixed name is the outermost, publicly visible layer.

use crate::error::CoreError;

/// Prefix of members a part requires from the target or a sibling part
pub const REQUIRES_PREFIX: &str = "_this_";

/// Prefix of abstract hooks calling into the next deeper layer
pub const NEXT_PREFIX: &str = "_super_";

/// Separator between a base name and its chain depth
pub const ALIAS_SEP: char = '#';

/// Compute the alias one layer deeper than `name`
///
/// # Examples
/// ```
/// use mixer_core::naming::next_alias;
/// assert_eq!(next_alias("print").unwrap(), "print#0");
/// assert_eq!(next_alias("print#0").unwrap(), "print#1");
/// assert_eq!(next_alias("print#9").unwrap(), "print#10");
/// assert!(next_alias("print#x").is_err());
/// ```
pub fn next_alias(name: &str) -> Result<String, CoreError> {
    match name.rsplit_once(ALIAS_SEP) {
        None if !name.is_empty() => Ok(format!("{}{}0", name, ALIAS_SEP)),
        None => Err(CoreError::MalformedAlias(name.to_string())),
        Some((base, depth)) => {
            let valid = !base.is_empty()
                && !base.contains(ALIAS_SEP)
                && !depth.is_empty()
                && depth.bytes().all(|b| b.is_ascii_digit());
            if !valid {
                return Err(CoreError::MalformedAlias(name.to_string()));
            }
            let next = depth
                .parse::<u32>()
                .ok()
                .and_then(|depth| depth.checked_add(1))
                .ok_or_else(|| CoreError::MalformedAlias(name.to_string()))?;
            Ok(format!("{}{}{}", base, ALIAS_SEP, next))
        }
    }
}

/// The base name of an alias (`print#3` -> `print`)
pub fn alias_base(alias: &str) -> &str {
    alias.split_once(ALIAS_SEP).map_or(alias, |(base, _)| base)
}

/// Whether `alias` is `base` itself or one of its chain aliases
pub fn is_alias_of(alias: &str, base: &str) -> bool {
    alias_base(alias) == base
}

/// Chain depth of an alias: `None` for the outermost layer, `Some(k)` for `base#k`
pub fn alias_depth(alias: &str) -> Option<u32> {
    alias
        .split_once(ALIAS_SEP)
        .and_then(|(_, depth)| depth.parse().ok())
}

/// Name with the binding placeholder prefix removed, if it had one
pub fn strip_requires(name: &str) -> Option<&str> {
    name.strip_prefix(REQUIRES_PREFIX)
}

/// Base name targeted by a chain placeholder, if `name` is one
pub fn strip_next(name: &str) -> Option<&str> {
    name.strip_prefix(NEXT_PREFIX)
}
