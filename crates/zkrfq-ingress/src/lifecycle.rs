//! Order lifecycle state machine.
//!
//! Status is evaluated lazily: every read and every write first calls
//! [`refresh`], there are no timers.
//!
//! ```text
//! refresh:  non-terminal & expiry <= now & !MATCHED   → EXPIRED
//!           PENDING_ATTESTATION & mask complete       → OPEN
//! guard:    expiry → attestation completeness → status precondition
//! ```

use zkrfq_types::{Order, Result, RfqError, RfqOperation, RfqStatus, constants};

use crate::attestation::{compute_mask, is_complete};

/// The status `order` should have at `now` given attestation `mask`.
#[must_use]
pub fn next_status(order: &Order, mask: u8, now: u64) -> RfqStatus {
    match order.status {
        status if status.is_terminal() => status,
        RfqStatus::Matched => RfqStatus::Matched,
        _ if order.is_expired_at(now) => RfqStatus::Expired,
        RfqStatus::PendingAttestation if is_complete(mask) => RfqStatus::Open,
        status => status,
    }
}

/// Recompute the mask and apply any lazy transition.
///
/// Returns `true` if the status changed.
pub fn refresh(order: &mut Order, now: u64) -> bool {
    order.attest_mask = compute_mask(&order.attestations);
    let next = next_status(order, order.attest_mask, now);
    if next == order.status {
        return false;
    }
    tracing::info!(
        rfq_id = %order.rfq_id,
        from = %order.status,
        to = %next,
        mask = order.attest_mask,
        "RFQ status refreshed"
    );
    order.status = next;
    true
}

/// Check that `operation` may proceed on a freshly refreshed `order`.
///
/// # Errors
/// - `RfqExpired` if `expiry <= now` (checked first, including for `MATCHED`)
/// - `AttestationMissing` if the mask is incomplete (quote, match, settle)
/// - `InvalidState` if the status precondition fails
pub fn guard(order: &Order, operation: RfqOperation, now: u64) -> Result<()> {
    let invalid = || RfqError::InvalidState {
        rfq_id: order.rfq_id,
        operation,
        status: order.status,
    };

    match operation {
        RfqOperation::Cancel => {
            return if order.status.is_terminal() {
                Err(invalid())
            } else {
                Ok(())
            };
        }
        RfqOperation::Attest => {
            check_expiry(order, now)?;
            return match order.status {
                RfqStatus::PendingAttestation | RfqStatus::Open => Ok(()),
                _ => Err(invalid()),
            };
        }
        RfqOperation::Quote | RfqOperation::Match | RfqOperation::Settle => {}
    }

    check_expiry(order, now)?;
    if !is_complete(order.attest_mask) {
        tracing::warn!(
            rfq_id = %order.rfq_id,
            %operation,
            mask = order.attest_mask,
            "guard rejected: attestations incomplete"
        );
        return Err(RfqError::AttestationMissing {
            rfq_id: order.rfq_id,
            mask: order.attest_mask,
            required: constants::REQUIRED_MASK,
        });
    }
    let required = if operation == RfqOperation::Settle {
        RfqStatus::Matched
    } else {
        RfqStatus::Open
    };
    if order.status != required {
        tracing::warn!(
            rfq_id = %order.rfq_id,
            %operation,
            status = %order.status,
            "guard rejected: wrong status"
        );
        return Err(invalid());
    }
    Ok(())
}

fn check_expiry(order: &Order, now: u64) -> Result<()> {
    if order.is_expired_at(now) {
        tracing::warn!(rfq_id = %order.rfq_id, expiry = order.expiry, now, "guard rejected: expired");
        return Err(RfqError::RfqExpired {
            rfq_id: order.rfq_id,
            expiry: order.expiry,
            now,
        });
    }
    Ok(())
}

/// Move `order` to `target` on behalf of `operation`.
///
/// # Errors
/// `InvalidState` if the transition is not allowed from the current status.
pub fn transition(order: &mut Order, target: RfqStatus, operation: RfqOperation) -> Result<()> {
    if !order.status.can_transition_to(target) {
        return Err(RfqError::InvalidState {
            rfq_id: order.rfq_id,
            operation,
            status: order.status,
        });
    }
    tracing::info!(
        rfq_id = %order.rfq_id,
        from = %order.status,
        to = %target,
        %operation,
        "RFQ transition"
    );
    order.status = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use zkrfq_types::{Address, AttestationKind, Bytes32, OrderFields, RfqId};

    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn order(expiry: u64) -> Order {
        Order::new(
            RfqId::new(),
            Bytes32([0xAA; 32]),
            OrderFields::dummy(Address([1; 20]), expiry),
            NOW,
        )
    }

    fn attested(expiry: u64) -> Order {
        let mut o = order(expiry);
        for kind in AttestationKind::REQUIRED {
            o.attestations.insert(kind, Bytes32([kind.type_code() + 1; 32]));
        }
        o
    }

    #[test]
    fn fresh_order_stays_pending() {
        let mut o = order(NOW + 600);
        assert!(!refresh(&mut o, NOW));
        assert_eq!(o.status, RfqStatus::PendingAttestation);
        assert_eq!(o.attest_mask, 0);
    }

    #[test]
    fn full_mask_opens() {
        let mut o = attested(NOW + 600);
        assert!(refresh(&mut o, NOW));
        assert_eq!(o.status, RfqStatus::Open);
        assert_eq!(o.attest_mask, constants::REQUIRED_MASK);
        // idempotent
        assert!(!refresh(&mut o, NOW));
    }

    #[test]
    fn expiry_wins_over_open() {
        let mut o = attested(NOW + 600);
        refresh(&mut o, NOW);
        assert!(refresh(&mut o, NOW + 600));
        assert_eq!(o.status, RfqStatus::Expired);
        // attestations arriving before expiry but refreshed after still expire
        let mut late = attested(NOW + 10);
        refresh(&mut late, NOW + 10);
        assert_eq!(late.status, RfqStatus::Expired);
    }

    #[test]
    fn matched_is_exempt_from_expiry() {
        let mut o = attested(NOW + 600);
        refresh(&mut o, NOW);
        transition(&mut o, RfqStatus::Matched, RfqOperation::Match).unwrap();
        assert!(!refresh(&mut o, NOW + 10_000));
        assert_eq!(o.status, RfqStatus::Matched);
        // but the settle guard still rejects
        let err = guard(&o, RfqOperation::Settle, NOW + 10_000).unwrap_err();
        assert!(matches!(err, RfqError::RfqExpired { .. }), "Got: {err:?}");
    }

    #[test]
    fn terminal_states_never_refresh() {
        let mut o = attested(NOW + 600);
        o.status = RfqStatus::Cancelled;
        assert!(!refresh(&mut o, NOW + 10_000));
        assert_eq!(o.status, RfqStatus::Cancelled);
    }

    #[test]
    fn guard_order_is_expiry_then_mask_then_status() {
        // expired and unattested: expiry reported
        let mut o = order(NOW + 5);
        refresh(&mut o, NOW + 5);
        assert!(matches!(
            guard(&o, RfqOperation::Quote, NOW + 5),
            Err(RfqError::RfqExpired { .. })
        ));

        // live but unattested: mask reported
        let mut o = order(NOW + 600);
        refresh(&mut o, NOW);
        assert!(matches!(
            guard(&o, RfqOperation::Match, NOW),
            Err(RfqError::AttestationMissing { mask: 0, required: 0b111, .. })
        ));

        // open but settle requires MATCHED
        let mut o = attested(NOW + 600);
        refresh(&mut o, NOW);
        assert!(guard(&o, RfqOperation::Quote, NOW).is_ok());
        assert!(guard(&o, RfqOperation::Match, NOW).is_ok());
        assert!(matches!(
            guard(&o, RfqOperation::Settle, NOW),
            Err(RfqError::InvalidState { status: RfqStatus::Open, operation: RfqOperation::Settle, .. })
        ));
    }

    #[test]
    fn attest_allowed_until_matched() {
        let mut o = order(NOW + 600);
        assert!(guard(&o, RfqOperation::Attest, NOW).is_ok());
        o.status = RfqStatus::Open;
        assert!(guard(&o, RfqOperation::Attest, NOW).is_ok());
        o.status = RfqStatus::Matched;
        assert!(matches!(
            guard(&o, RfqOperation::Attest, NOW),
            Err(RfqError::InvalidState { .. })
        ));
    }

    #[test]
    fn cancel_from_any_pre_settled_state() {
        for status in [RfqStatus::PendingAttestation, RfqStatus::Open, RfqStatus::Matched] {
            let mut o = order(NOW + 600);
            o.status = status;
            assert!(guard(&o, RfqOperation::Cancel, NOW).is_ok());
            transition(&mut o, RfqStatus::Cancelled, RfqOperation::Cancel).unwrap();
        }
        for status in [RfqStatus::Settled, RfqStatus::Expired, RfqStatus::Cancelled] {
            let mut o = order(NOW + 600);
            o.status = status;
            assert!(guard(&o, RfqOperation::Cancel, NOW).is_err());
        }
    }

    #[test]
    fn illegal_transition_rejected() {
        let mut o = order(NOW + 600);
        let err = transition(&mut o, RfqStatus::Settled, RfqOperation::Settle).unwrap_err();
        assert!(matches!(err, RfqError::InvalidState { .. }));
        assert_eq!(o.status, RfqStatus::PendingAttestation);
    }
}
