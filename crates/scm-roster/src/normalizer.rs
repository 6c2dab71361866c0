//! Directory normalization.
//!
//! Converts [`RawDirectoryUser`] entries into [`CanonicalUser`] records and
//! applies the fixed exclusion policy:
//! - deleted accounts are dropped
//! - the platform's built-in system bot ([`SYSTEM_BOT_ID`]) is dropped
//!
//! A bad entry never aborts the batch. Entries without an id cannot be keyed
//! and are skipped; every other missing field degrades to `None`/`false`.

use tracing::debug;

use crate::{CanonicalUser, RawDirectoryUser};

/// Reserved id of the built-in system bot. Not configurable.
pub const SYSTEM_BOT_ID: &str = "USLACKBOT";

/// Project a raw entry into a canonical record, without exclusion rules.
///
/// Returns `None` only when the entry has no usable id.
pub fn to_canonical(raw: &RawDirectoryUser) -> Option<CanonicalUser> {
    let id = raw.id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

    Some(CanonicalUser {
        id: id.to_string(),
        email: raw.email.clone(),
        is_deleted: raw.deleted.unwrap_or(false),
        bot_id: raw.bot_id.clone(),
        is_bot: raw.is_bot.unwrap_or(false),
        is_admin: raw.is_admin.unwrap_or(false),
        is_owner: raw.is_owner.unwrap_or(false),
    })
}

/// Normalize a batch of directory entries, preserving input order.
pub fn normalize(raw: &[RawDirectoryUser]) -> Vec<CanonicalUser> {
    let mut out = Vec::with_capacity(raw.len());
    for entry in raw {
        let Some(user) = to_canonical(entry) else {
            debug!("skipping directory entry without id");
            continue;
        };
        if user.is_deleted || user.id == SYSTEM_BOT_ID {
            continue;
        }
        out.push(user);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, email: Option<&str>) -> RawDirectoryUser {
        RawDirectoryUser {
            id: Some(id.to_string()),
            email: email.map(str::to_string),
            ..RawDirectoryUser::default()
        }
    }

    #[test]
    fn deleted_entries_are_dropped() {
        let mut gone = raw("U2", Some("b@x.com"));
        gone.deleted = Some(true);
        let out = normalize(&[raw("U1", Some("a@x.com")), gone]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "U1");
    }

    #[test]
    fn system_bot_is_dropped() {
        let mut sb = raw(SYSTEM_BOT_ID, None);
        sb.is_bot = Some(false);
        let out = normalize(&[sb, raw("U1", Some("a@x.com"))]);
        assert!(out.iter().all(|u| u.id != SYSTEM_BOT_ID));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn other_bots_are_kept() {
        let mut b = raw("B1", None);
        b.is_bot = Some(true);
        b.bot_id = Some("BX".to_string());
        let out = normalize(&[b]);
        assert_eq!(out, vec![CanonicalUser::bot("B1", "BX")]);
    }

    #[test]
    fn missing_flags_default_to_false() {
        let out = normalize(&[raw("U1", None)]);
        let u = &out[0];
        assert!(!u.is_bot && !u.is_admin && !u.is_owner && !u.is_deleted);
        assert_eq!(u.email, None);
    }

    #[test]
    fn entry_without_id_does_not_abort_batch() {
        let out = normalize(&[
            RawDirectoryUser::default(),
            raw("  ", Some("blank@x.com")),
            raw("U9", Some("z@x.com")),
        ]);
        assert_eq!(out, vec![CanonicalUser::human("U9", "z@x.com")]);
    }

    #[test]
    fn role_flags_are_projected() {
        let mut r = raw("U1", Some("boss@x.com"));
        r.is_admin = Some(true);
        r.is_owner = Some(true);
        let u = to_canonical(&r).unwrap();
        assert!(u.is_admin);
        assert!(u.is_owner);
    }
}
