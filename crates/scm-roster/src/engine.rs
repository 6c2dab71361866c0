use std::collections::{HashMap, HashSet};

use crate::{CanonicalUser, ReconcileResult};

/// First directory entry per email. Duplicate emails are not disambiguated.
fn index_by_email(directory: &[CanonicalUser]) -> HashMap<&str, &CanonicalUser> {
    let mut by_email: HashMap<&str, &CanonicalUser> = HashMap::new();
    for u in directory {
        if let Some(email) = u.email_str() {
            by_email.entry(email).or_insert(u);
        }
    }
    by_email
}

/// First directory entry per id.
fn index_by_id(directory: &[CanonicalUser]) -> HashMap<&str, &CanonicalUser> {
    let mut by_id: HashMap<&str, &CanonicalUser> = HashMap::new();
    for u in directory {
        by_id.entry(u.id.as_str()).or_insert(u);
    }
    by_id
}

/// Diff a desired email roster against current channel membership.
///
/// - Member ids are resolved through `directory`. Ids missing from the
///   snapshot are reported in `unresolved_member_ids` and otherwise ignored.
/// - Emails are compared exactly (case-sensitive).
/// - `desired_emails_in_channel` is a set (unique, desired order); invite
///   candidates keep duplicates from `desired`.
///
/// Pure: the same three inputs always give the same result.
pub fn reconcile(
    desired: &[String],
    member_ids: &[String],
    directory: &[CanonicalUser],
) -> ReconcileResult {
    let by_id = index_by_id(directory);
    let by_email = index_by_email(directory);

    // 1) + 2) Partition channel members.
    let mut current_human_emails: Vec<String> = Vec::new();
    let mut channel_bot_ids: Vec<String> = Vec::new();
    let mut unresolved_member_ids: Vec<String> = Vec::new();
    for member_id in member_ids {
        match by_id.get(member_id.as_str()) {
            None => unresolved_member_ids.push(member_id.clone()),
            Some(u) if u.is_bot => channel_bot_ids.push(u.id.clone()),
            Some(u) => {
                if let Some(email) = u.email_str() {
                    current_human_emails.push(email.to_string());
                }
            }
        }
    }

    // 3) Desired emails already satisfied.
    let humans: HashSet<&str> = current_human_emails.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut desired_emails_in_channel: Vec<String> = Vec::new();
    for email in desired {
        if humans.contains(email.as_str()) && seen.insert(email.as_str()) {
            desired_emails_in_channel.push(email.clone());
        }
    }
    let satisfied: HashSet<&str> = desired_emails_in_channel
        .iter()
        .map(String::as_str)
        .collect();

    // 4) Removals. Every email here came from a directory entry, so the
    // lookup cannot miss.
    let users_to_remove: Vec<CanonicalUser> = current_human_emails
        .iter()
        .filter(|e| !satisfied.contains(e.as_str()))
        .filter_map(|e| by_email.get(e.as_str()).map(|u| (*u).clone()))
        .collect();

    // 5) + 6) Invites, split by directory lookup.
    let mut users_to_invite: Vec<CanonicalUser> = Vec::new();
    let mut emails_to_invite_unknown: Vec<String> = Vec::new();
    for email in desired.iter().filter(|e| !satisfied.contains(e.as_str())) {
        match by_email.get(email.as_str()) {
            Some(u) => users_to_invite.push((*u).clone()),
            None => emails_to_invite_unknown.push(email.clone()),
        }
    }

    ReconcileResult {
        desired_emails: desired.to_vec(),
        desired_emails_in_channel,
        users_to_invite,
        emails_to_invite_unknown,
        users_to_remove,
        current_human_emails,
        channel_bot_ids,
        unresolved_member_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn bot_members_are_not_humans() {
        let dir = vec![
            CanonicalUser::human("U1", "a@x.com"),
            CanonicalUser::bot("B1", "BB1"),
        ];
        let r = reconcile(&s(&["a@x.com"]), &s(&["U1", "B1"]), &dir);
        assert_eq!(r.current_human_emails, s(&["a@x.com"]));
        assert_eq!(r.channel_bot_ids, s(&["B1"]));
        assert!(r.users_to_remove.is_empty());
    }

    #[test]
    fn unresolved_member_is_excluded_but_surfaced() {
        let dir = vec![CanonicalUser::human("U1", "a@x.com")];
        let r = reconcile(&[], &s(&["U1", "U404"]), &dir);
        assert_eq!(r.current_human_emails, s(&["a@x.com"]));
        assert_eq!(r.unresolved_member_ids, s(&["U404"]));
        assert_eq!(r.users_to_remove.len(), 1);
    }

    #[test]
    fn human_without_email_is_ignored() {
        let mut u = CanonicalUser::human("U1", "x");
        u.email = None;
        let r = reconcile(&[], &s(&["U1"]), &[u]);
        assert!(r.current_human_emails.is_empty());
        assert!(r.users_to_remove.is_empty());
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let dir = vec![CanonicalUser::human("U1", "A@x.com")];
        let r = reconcile(&s(&["a@x.com"]), &s(&["U1"]), &dir);
        assert!(r.desired_emails_in_channel.is_empty());
        assert_eq!(r.emails_to_invite_unknown, s(&["a@x.com"]));
        assert_eq!(r.users_to_remove[0].id, "U1");
    }

    #[test]
    fn duplicate_desired_in_channel_counted_once() {
        let dir = vec![CanonicalUser::human("U1", "a@x.com")];
        let r = reconcile(&s(&["a@x.com", "a@x.com"]), &s(&["U1"]), &dir);
        assert_eq!(r.desired_emails_in_channel, s(&["a@x.com"]));
        assert!(r.users_to_invite.is_empty());
        assert!(r.is_in_sync());
    }

    #[test]
    fn duplicate_directory_email_resolves_to_first_entry() {
        let dir = vec![
            CanonicalUser::human("U1", "dup@x.com"),
            CanonicalUser::human("U2", "dup@x.com"),
        ];
        let r = reconcile(&s(&["dup@x.com"]), &[], &dir);
        assert_eq!(r.users_to_invite.len(), 1);
        assert_eq!(r.users_to_invite[0].id, "U1");
    }

    #[test]
    fn empty_roster_removes_every_human() {
        let dir = vec![
            CanonicalUser::human("U1", "a@x.com"),
            CanonicalUser::human("U2", "b@x.com"),
            CanonicalUser::bot("B1", "BB1"),
        ];
        let r = reconcile(&[], &s(&["U1", "U2", "B1"]), &dir);
        let ids: Vec<&str> = r.users_to_remove.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2"]);
    }

    #[test]
    fn removal_lookup_by_email_can_hit_a_bot_record() {
        // A bot entry sharing an email with a human precedes it in the directory.
        let mut bot = CanonicalUser::bot("B1", "BB1");
        bot.email = Some("shared@x.com".to_string());
        let dir = vec![bot, CanonicalUser::human("U1", "shared@x.com")];
        let r = reconcile(&[], &s(&["U1"]), &dir);
        assert_eq!(r.users_to_remove.len(), 1);
        assert!(r.users_to_remove[0].is_bot);
        assert_eq!(r.humans_to_remove().count(), 0);
    }
}
