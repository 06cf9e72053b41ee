use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::PhoneNumber;
use super::verification::VerificationCode;

/// Wrong guesses allowed before a pending code is discarded.
pub const MAX_FAILED_ATTEMPTS: u8 = 5;

/// A code that has been sent but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub phone: PhoneNumber,
    pub code: VerificationCode,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: u8,
}

impl PendingVerification {
    pub fn issue(
        phone: PhoneNumber,
        code: VerificationCode,
        issued_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            phone,
            code,
            issued_at,
            expires_at: issued_at + ttl,
            failed_attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Compare a submitted code, counting the attempt when it is wrong.
    pub fn check(&mut self, submitted: &str, now: DateTime<Utc>) -> ConfirmOutcome {
        if self.is_expired(now) {
            return ConfirmOutcome::Expired;
        }
        if self.code.as_str() == submitted.trim() {
            return ConfirmOutcome::Confirmed;
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            ConfirmOutcome::Exhausted
        } else {
            ConfirmOutcome::Mismatch {
                remaining_attempts: MAX_FAILED_ATTEMPTS - self.failed_attempts,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Mismatch { remaining_attempts: u8 },
    Exhausted,
    Expired,
    NotFound,
}

impl ConfirmOutcome {
    /// Whether the pending record is finished with after this outcome.
    fn retires_record(self) -> bool {
        matches!(self, Self::Confirmed | Self::Exhausted | Self::Expired)
    }
}

/// Short-lived storage for issued verification codes.
pub trait VerificationStore: Send + Sync {
    /// Save a pending code, replacing any earlier one for the same phone.
    fn put(&self, pending: PendingVerification) -> Result<(), StoreError>;
    /// Check a code atomically; confirmed, expired, and exhausted records are removed.
    fn confirm(
        &self,
        phone: &PhoneNumber,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, StoreError>;
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("verification store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store. Codes do not survive a restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVerificationStore {
    records: Arc<Mutex<HashMap<PhoneNumber, PendingVerification>>>,
}

impl InMemoryVerificationStore {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<PhoneNumber, PendingVerification>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("verification mutex poisoned".to_string()))
    }

    pub fn pending(&self, phone: &PhoneNumber) -> Result<Option<PendingVerification>, StoreError> {
        Ok(self.lock()?.get(phone).cloned())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

impl VerificationStore for InMemoryVerificationStore {
    fn put(&self, pending: PendingVerification) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let now = pending.issued_at;
        guard.retain(|_, record| !record.is_expired(now));
        guard.insert(pending.phone.clone(), pending);
        Ok(())
    }

    fn confirm(
        &self,
        phone: &PhoneNumber,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, StoreError> {
        let mut guard = self.lock()?;
        let Some(record) = guard.get_mut(phone) else {
            return Ok(ConfirmOutcome::NotFound);
        };

        let outcome = record.check(code, now);
        if outcome.retires_record() {
            guard.remove(phone);
        }
        Ok(outcome)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, record| !record.is_expired(now));
        Ok(before - guard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("6045551234").expect("valid phone")
    }

    fn pending(code: &str) -> PendingVerification {
        PendingVerification::issue(
            phone(),
            VerificationCode::from_digits(code).expect("valid code"),
            issued_at(),
            Duration::minutes(10),
        )
    }

    #[test]
    fn confirmed_code_is_single_use() {
        let store = InMemoryVerificationStore::default();
        store.put(pending("482913")).expect("saved");

        let now = issued_at() + Duration::minutes(2);
        assert_eq!(
            store.confirm(&phone(), "482913", now).expect("store ok"),
            ConfirmOutcome::Confirmed
        );
        assert_eq!(
            store.confirm(&phone(), "482913", now).expect("store ok"),
            ConfirmOutcome::NotFound
        );
    }

    #[test]
    fn expired_code_is_rejected_and_removed() {
        let store = InMemoryVerificationStore::default();
        store.put(pending("482913")).expect("saved");

        let now = issued_at() + Duration::minutes(10);
        assert_eq!(
            store.confirm(&phone(), "482913", now).expect("store ok"),
            ConfirmOutcome::Expired
        );
        assert!(store.pending(&phone()).expect("store ok").is_none());
    }

    #[test]
    fn wrong_guesses_exhaust_the_code() {
        let store = InMemoryVerificationStore::default();
        store.put(pending("482913")).expect("saved");
        let now = issued_at() + Duration::minutes(1);

        for remaining in (1..MAX_FAILED_ATTEMPTS).rev() {
            assert_eq!(
                store.confirm(&phone(), "000000", now).expect("store ok"),
                ConfirmOutcome::Mismatch {
                    remaining_attempts: remaining
                }
            );
        }
        assert_eq!(
            store.confirm(&phone(), "000000", now).expect("store ok"),
            ConfirmOutcome::Exhausted
        );
        assert_eq!(
            store.confirm(&phone(), "482913", now).expect("store ok"),
            ConfirmOutcome::NotFound
        );
    }

    #[test]
    fn reissuing_replaces_the_previous_code() {
        let store = InMemoryVerificationStore::default();
        store.put(pending("111111")).expect("saved");
        store.put(pending("222222")).expect("saved");

        let now = issued_at() + Duration::minutes(1);
        assert!(matches!(
            store.confirm(&phone(), "111111", now).expect("store ok"),
            ConfirmOutcome::Mismatch { .. }
        ));
        assert_eq!(
            store.confirm(&phone(), "222222", now).expect("store ok"),
            ConfirmOutcome::Confirmed
        );
    }

    #[test]
    fn purge_drops_only_expired_records() {
        let store = InMemoryVerificationStore::default();
        store.put(pending("111111")).expect("saved");
        let other = PendingVerification::issue(
            PhoneNumber::parse("7785550000").expect("valid phone"),
            VerificationCode::from_digits("333333").expect("valid code"),
            issued_at() + Duration::minutes(8),
            Duration::minutes(10),
        );
        store.put(other).expect("saved");

        let purged = store
            .purge_expired(issued_at() + Duration::minutes(12))
            .expect("store ok");
        assert_eq!(purged, 1);
        assert_eq!(store.len().expect("store ok"), 1);
    }
}
