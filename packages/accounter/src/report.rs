//! Duplicate detection and first-seen collapse over normalized members.

use std::collections::{BTreeSet, HashSet};

use crate::member::{Member, MemberWithDuplicates};

/// Build one report entry per distinct email, ascending by email.
///
/// The representative for an email is the first member fetched with it;
/// the rest, in fetch order, become its `email_duplicates`. Members
/// sharing the representative's name under a different email become its
/// `name_duplicates`. When `filter_email` is set, only that email's
/// entry is built.
pub fn build_report(members: &[Member], filter_email: Option<&str>) -> Vec<MemberWithDuplicates> {
    let emails: BTreeSet<&str> = members.iter().map(|m| m.email.as_str()).collect();

    let mut report = Vec::new();

    for email in emails {
        if let Some(filter) = filter_email {
            if filter != email {
                continue;
            }
        }

        let by_email: Vec<&Member> = members.iter().filter(|m| m.email == email).collect();
        let Some((representative, rest)) = by_email.split_first() else {
            continue;
        };

        let name_duplicates = members
            .iter()
            .filter(|m| m.name == representative.name && m.email != representative.email)
            .cloned()
            .collect();

        report.push(MemberWithDuplicates {
            member: (*representative).clone(),
            email_duplicates: rest.iter().map(|m| (*m).clone()).collect(),
            name_duplicates,
        });
    }

    report
}

/// Greedy first-seen collapse of a report.
///
/// Entries are walked in report order; an entry whose representative id
/// was already seen is dropped. Keeping an entry marks its own id, plus
/// every `email_duplicates` id when `by_email` and every
/// `name_duplicates` id when `by_name`. Ids are marked only through
/// entries that themselves survive, so duplicate chains do not merge
/// transitively. With neither flag set the report is returned unchanged.
pub fn collapse(
    report: Vec<MemberWithDuplicates>,
    by_email: bool,
    by_name: bool,
) -> Vec<MemberWithDuplicates> {
    if !by_email && !by_name {
        return report;
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut collapsed = Vec::new();

    for entry in report {
        if seen.contains(&entry.member.id) {
            continue;
        }
        seen.insert(entry.member.id.clone());

        if by_email {
            for duplicate in &entry.email_duplicates {
                seen.insert(duplicate.id.clone());
            }
        }
        if by_name {
            for duplicate in &entry.name_duplicates {
                seen.insert(duplicate.id.clone());
            }
        }

        collapsed.push(entry);
    }

    collapsed
}
