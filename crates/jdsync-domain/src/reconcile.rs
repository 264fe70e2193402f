//! Reconciliation of panel records with a captured cookie.
//!
//! The panel may hold any number of records for an account: none yet, the
//! right one, stale ones, or duplicates left behind by racing invocations.
//! [`reconcile`] turns that snapshot into a [`Plan`] whose execution leaves
//! exactly one record holding the captured cookie.
//!
//! | records for account | one equals cookie | plan |
//! |---------------------|-------------------|------|
//! | 0                   | -                 | `Create` |
//! | 1                   | yes               | `NoOp` |
//! | ≥ 2                 | yes               | `PruneDuplicates` |
//! | ≥ 1                 | no                | `ReplaceAll` |
//!
//! Records listed without a numeric id cannot be deleted. They still count
//! as belonging to the account but never appear in a plan's `remove` list.

use jdsync_client::{NewRecord, RECORD_NAME, RecordId, RemoteRecord};

use crate::credential::CredentialExtractor;

/// What to do on the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The panel already holds exactly the right record.
    NoOp,
    /// Keep the matching record and delete the rest.
    PruneDuplicates {
        keep: Option<RecordId>,
        remove: Vec<RecordId>,
    },
    /// Delete every record for the account and create a fresh one.
    ReplaceAll {
        remove: Vec<RecordId>,
        create: NewRecord,
    },
    /// No record exists for the account yet.
    Create(NewRecord),
}

/// Plan discriminant, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    NoOp,
    PruneDuplicates,
    ReplaceAll,
    Create,
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanKind::NoOp => write!(f, "no_op"),
            PlanKind::PruneDuplicates => write!(f, "prune_duplicates"),
            PlanKind::ReplaceAll => write!(f, "replace_all"),
            PlanKind::Create => write!(f, "create"),
        }
    }
}

impl Plan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Plan::NoOp => PlanKind::NoOp,
            Plan::PruneDuplicates { .. } => PlanKind::PruneDuplicates,
            Plan::ReplaceAll { .. } => PlanKind::ReplaceAll,
            Plan::Create(_) => PlanKind::Create,
        }
    }

    /// Whether the plan leaves the cookie value itself unchanged on the
    /// panel. Such plans are not announced to the user.
    pub fn is_value_unchanged(&self) -> bool {
        matches!(self, Plan::NoOp | Plan::PruneDuplicates { .. })
    }
}

/// The record the panel should end up holding for an account.
pub fn desired_record(account_id: &str, cookie: &str) -> NewRecord {
    NewRecord {
        name: RECORD_NAME.to_string(),
        value: cookie.to_string(),
        remarks: format!("Account: {}", account_id),
    }
}

/// Records that belong to `account_id`.
///
/// A record belongs to an account when it carries the cookie record name
/// and its value embeds that account id.
pub fn records_for_account<'a>(
    records: &'a [RemoteRecord],
    account_id: &str,
    extractor: &CredentialExtractor,
) -> Vec<&'a RemoteRecord> {
    records
        .iter()
        .filter(|r| r.name == RECORD_NAME)
        .filter(|r| extractor.account_of(&r.value).as_deref() == Some(account_id))
        .collect()
}

/// Decide how to converge the panel on `desired_cookie` for `account_id`.
pub fn reconcile(
    records: &[RemoteRecord],
    account_id: &str,
    desired_cookie: &str,
    extractor: &CredentialExtractor,
) -> Plan {
    let matching = records_for_account(records, account_id, extractor);

    if matching.is_empty() {
        return Plan::Create(desired_record(account_id, desired_cookie));
    }

    match matching.iter().find(|r| r.value == desired_cookie) {
        Some(_) if matching.len() == 1 => Plan::NoOp,
        Some(exact) => {
            let others: Vec<&RemoteRecord> = matching
                .iter()
                .copied()
                .filter(|r| !std::ptr::eq(*r, *exact))
                .collect();
            let remove = removable_ids(&others);
            if remove.is_empty() {
                Plan::NoOp
            } else {
                Plan::PruneDuplicates {
                    keep: exact.id,
                    remove,
                }
            }
        }
        None => Plan::ReplaceAll {
            remove: removable_ids(&matching),
            create: desired_record(account_id, desired_cookie),
        },
    }
}

/// Ids of the records that can be deleted; id-less records are skipped.
fn removable_ids(records: &[&RemoteRecord]) -> Vec<RecordId> {
    records
        .iter()
        .filter_map(|r| {
            if r.id.is_none() {
                tracing::warn!(name = %r.name, "Record has no numeric id, leaving it in place");
            }
            r.id
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIRED: &str = "pt_key=NEWNEWNEWNEW;pt_pin=user1;";

    fn record(id: i64, name: &str, value: &str) -> RemoteRecord {
        RemoteRecord {
            id: Some(RecordId(id)),
            name: name.to_string(),
            value: value.to_string(),
            remarks: String::new(),
        }
    }

    fn plan(records: &[RemoteRecord]) -> Plan {
        reconcile(records, "user1", DESIRED, &CredentialExtractor::default())
    }

    #[test]
    fn test_no_records_creates() {
        let p = plan(&[]);
        assert_eq!(p, Plan::Create(desired_record("user1", DESIRED)));
        if let Plan::Create(create) = p {
            assert_eq!(create.name, "JD_COOKIE");
            assert_eq!(create.remarks, "Account: user1");
        }
    }

    #[test]
    fn test_other_accounts_are_ignored() {
        let records = [
            record(1, "JD_COOKIE", "pt_key=AAAAAAAAAAAA;pt_pin=user2;"),
            record(2, "JD_COOKIE", "pt_key=AAAAAAAAAAAA;pt_pin=user10;"),
        ];
        assert_eq!(plan(&records).kind(), PlanKind::Create);
    }

    #[test]
    fn test_other_record_names_are_ignored() {
        let records = [record(1, "JD_COOKIE_BAK", DESIRED)];
        assert_eq!(plan(&records).kind(), PlanKind::Create);
    }

    #[test]
    fn test_single_exact_match_is_noop() {
        let records = [record(5, "JD_COOKIE", DESIRED)];
        assert_eq!(plan(&records), Plan::NoOp);
    }

    #[test]
    fn test_duplicates_are_pruned() {
        let records = [
            record(1, "JD_COOKIE", "pt_key=OLDOLDOLDOLD;pt_pin=user1;"),
            record(2, "JD_COOKIE", DESIRED),
            record(3, "JD_COOKIE", "pt_key=OLDEROLDEROLDER;pt_pin=user1;"),
            record(4, "JD_COOKIE", "pt_key=AAAAAAAAAAAA;pt_pin=user2;"),
        ];
        assert_eq!(
            plan(&records),
            Plan::PruneDuplicates {
                keep: Some(RecordId(2)),
                remove: vec![RecordId(1), RecordId(3)],
            }
        );
    }

    #[test]
    fn test_exact_duplicates_keep_first() {
        let records = [record(7, "JD_COOKIE", DESIRED), record(8, "JD_COOKIE", DESIRED)];
        assert_eq!(
            plan(&records),
            Plan::PruneDuplicates {
                keep: Some(RecordId(7)),
                remove: vec![RecordId(8)],
            }
        );
    }

    #[test]
    fn test_stale_record_is_replaced() {
        let records = [record(9, "JD_COOKIE", "pt_key=OLDOLDOLDOLD;pt_pin=user1;")];
        match plan(&records) {
            Plan::ReplaceAll { remove, create } => {
                assert_eq!(remove, vec![RecordId(9)]);
                assert_eq!(create.value, DESIRED);
            }
            other => panic!("expected ReplaceAll, got {:?}", other),
        }
    }

    fn idless(value: &str) -> RemoteRecord {
        RemoteRecord {
            id: None,
            ..record(0, "JD_COOKIE", value)
        }
    }

    #[test]
    fn test_idless_stale_record_is_not_removed() {
        let records = [
            idless("pt_key=OLDOLDOLDOLD;pt_pin=user1;"),
            record(4, "JD_COOKIE", "pt_key=OLDEROLDEROLDER;pt_pin=user1;"),
        ];
        match plan(&records) {
            Plan::ReplaceAll { remove, create } => {
                assert_eq!(remove, vec![RecordId(4)]);
                assert_eq!(create.value, DESIRED);
            }
            other => panic!("expected ReplaceAll, got {:?}", other),
        }
    }

    #[test]
    fn test_idless_exact_match_keeps_and_prunes_others() {
        let records = [
            idless(DESIRED),
            record(6, "JD_COOKIE", "pt_key=OLDOLDOLDOLD;pt_pin=user1;"),
        ];
        assert_eq!(
            plan(&records),
            Plan::PruneDuplicates {
                keep: None,
                remove: vec![RecordId(6)],
            }
        );
    }

    #[test]
    fn test_only_idless_duplicates_is_noop() {
        let records = [
            record(2, "JD_COOKIE", DESIRED),
            idless("pt_key=OLDOLDOLDOLD;pt_pin=user1;"),
        ];
        assert_eq!(plan(&records), Plan::NoOp);
    }

    #[test]
    fn test_encoded_account_in_record_matches() {
        let extractor = CredentialExtractor::default();
        let records = [record(3, "JD_COOKIE", "pt_key=OLDOLDOLDOLD;pt_pin=jd_%E4%BA%AC;")];
        let p = reconcile(&records, "jd_京", "pt_key=NEWNEWNEWNEW;pt_pin=jd_京;", &extractor);
        assert_eq!(p.kind(), PlanKind::ReplaceAll);
    }

    #[test]
    fn test_value_unchanged_plans() {
        assert!(Plan::NoOp.is_value_unchanged());
        assert!(
            Plan::PruneDuplicates {
                keep: Some(RecordId(1)),
                remove: vec![]
            }
            .is_value_unchanged()
        );
        assert!(!Plan::Create(desired_record("u", "c")).is_value_unchanged());
    }
}
