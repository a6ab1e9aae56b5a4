//! Inter-outlet transfer orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::inventory::ItemKind;
use super::material::canonical_code;
use crate::error::{DomainError, DomainResult};
use crate::types::LocationKey;

/// Transfer order lifecycle.
///
/// `Pending -> Approved -> InTransit -> Delivered`, with `Cancelled`
/// reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    InTransit,
    Delivered,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Delivered => "delivered",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "in_transit" => Some(TransferStatus::InTransit),
            "delivered" => Some(TransferStatus::Delivered),
            "cancelled" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Delivered | TransferStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        match (self, next) {
            (Pending, Approved) | (Approved, InTransit) | (InTransit, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a transfer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLine {
    pub item_code: String,
    pub item_name: String,
    pub item_kind: ItemKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// `quantity * unit_price`
    pub line_total: Decimal,
}

/// Status change audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: TransferStatus,
    pub to: TransferStatus,
    pub changed_by: String,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOrder {
    pub id: Uuid,
    pub order_number: String,
    pub from_location: LocationKey,
    pub to_location: LocationKey,
    pub items: Vec<TransferLine>,
    /// Sum of line totals
    pub total_value: Decimal,
    pub status: TransferStatus,
    pub requested_by: String,
    pub notes: Option<String>,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Requested line on a new transfer order
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransferLine {
    pub item_code: String,
    pub item_name: String,
    pub item_kind: ItemKind,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransferOrder {
    pub from_location: LocationKey,
    pub to_location: LocationKey,
    pub items: Vec<NewTransferLine>,
    pub requested_by: String,
    pub notes: Option<String>,
}

impl TransferOrder {
    pub fn create(input: NewTransferOrder, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.from_location.is_empty() {
            return Err(DomainError::validation("fromLocation", "is required"));
        }
        if input.to_location.is_empty() {
            return Err(DomainError::validation("toLocation", "is required"));
        }
        if input.from_location == input.to_location {
            return Err(DomainError::validation(
                "toLocation",
                "must differ from the source location",
            ));
        }
        if input.items.is_empty() {
            return Err(DomainError::validation("items", "at least one line is required"));
        }
        if input.requested_by.trim().is_empty() {
            return Err(DomainError::validation("requestedBy", "is required"));
        }

        let mut items = Vec::with_capacity(input.items.len());
        for (index, line) in input.items.into_iter().enumerate() {
            let item_code = canonical_code(&line.item_code)
                .ok_or_else(|| DomainError::validation(format!("items[{}].itemCode", index), "is required"))?;
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::validation(
                    format!("items[{}].quantity", index),
                    "must be positive",
                ));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(DomainError::validation(
                    format!("items[{}].unitPrice", index),
                    "must not be negative",
                ));
            }
            items.push(TransferLine {
                item_code,
                item_name: line.item_name,
                item_kind: line.item_kind,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.quantity * line.unit_price,
            });
        }

        let total_value = items.iter().map(|l| l.line_total).sum();
        let id = Uuid::new_v4();

        Ok(TransferOrder {
            id,
            order_number: order_number(now, id),
            from_location: input.from_location,
            to_location: input.to_location,
            items,
            total_value,
            status: TransferStatus::Pending,
            requested_by: input.requested_by.trim().to_string(),
            notes: input.notes,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `next`, recording who made the change. Terminal orders and
    /// out-of-order transitions are rejected without modifying the order.
    pub fn transition(
        &mut self,
        next: TransferStatus,
        changed_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(StatusChange {
            from: self.status,
            to: next,
            changed_by: changed_by.to_string(),
            reason,
            changed_at: now,
        });
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// True when stock already left the source location
    pub fn was_dispatched(&self) -> bool {
        self.history.iter().any(|c| c.to == TransferStatus::InTransit)
    }
}

fn order_number(now: DateTime<Utc>, id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("TO-{}-{}", now.format("%Y%m%d"), simple[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(code: &str, qty: &str, price: &str) -> NewTransferLine {
        NewTransferLine {
            item_code: code.to_string(),
            item_name: code.to_string(),
            item_kind: ItemKind::RawMaterial,
            quantity: dec(qty),
            unit_price: dec(price),
        }
    }

    fn order(lines: Vec<NewTransferLine>) -> DomainResult<TransferOrder> {
        TransferOrder::create(
            NewTransferOrder {
                from_location: LocationKey::new("central_kitchen"),
                to_location: LocationKey::new("mall_360"),
                items: lines,
                requested_by: "chef.amal".to_string(),
                notes: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn totals_are_sum_of_lines() {
        let order = order(vec![line("a1", "2.5", "4"), line("b2", "3", "1.5")]).unwrap();
        assert_eq!(order.items[0].line_total, dec("10"));
        assert_eq!(order.items[1].line_total, dec("4.5"));
        assert_eq!(order.total_value, dec("14.5"));
        assert_eq!(order.items[0].item_code, "A1");
        assert_eq!(order.status, TransferStatus::Pending);
        assert!(order.order_number.starts_with("TO-"));
    }

    #[test]
    fn rejects_same_location_and_bad_lines() {
        let same = TransferOrder::create(
            NewTransferOrder {
                from_location: LocationKey::new("mall_360"),
                to_location: LocationKey::new("Mall 360"),
                items: vec![line("a1", "1", "1")],
                requested_by: "x".to_string(),
                notes: None,
            },
            Utc::now(),
        );
        assert!(same.is_err());
        assert!(order(vec![]).is_err());
        assert!(order(vec![line("a1", "0", "1")]).is_err());
        assert!(order(vec![line("a1", "1", "-1")]).is_err());
    }

    #[test]
    fn happy_path_transitions() {
        let mut order = order(vec![line("a1", "1", "1")]).unwrap();
        order.transition(TransferStatus::Approved, "mgr", None, Utc::now()).unwrap();
        order.transition(TransferStatus::InTransit, "driver", None, Utc::now()).unwrap();
        assert!(order.was_dispatched());
        order.transition(TransferStatus::Delivered, "mgr", None, Utc::now()).unwrap();
        assert_eq!(order.history.len(), 3);
        assert!(order.status.is_terminal());
    }

    #[test]
    fn cannot_skip_or_leave_terminal_states() {
        let mut order = order(vec![line("a1", "1", "1")]).unwrap();
        assert!(order.transition(TransferStatus::Delivered, "x", None, Utc::now()).is_err());
        assert!(order.transition(TransferStatus::InTransit, "x", None, Utc::now()).is_err());

        order
            .transition(TransferStatus::Cancelled, "x", Some("not needed".into()), Utc::now())
            .unwrap();
        let err = order.transition(TransferStatus::Approved, "x", None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert!(order.transition(TransferStatus::Cancelled, "x", None, Utc::now()).is_err());
        assert_eq!(order.history.len(), 1);
    }

    #[test]
    fn cancel_allowed_from_every_non_terminal_state() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::Approved,
            TransferStatus::InTransit,
        ] {
            assert!(status.can_transition_to(TransferStatus::Cancelled));
        }
        assert!(!TransferStatus::Delivered.can_transition_to(TransferStatus::Cancelled));
    }
}
