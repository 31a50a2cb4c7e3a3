//! Human-readable rendering of response envelopes

use tangle_simulator::codec::payloads::{
    RejectionPayload, ResponseBody, ResponseEnvelope, SettlementPayload, TransactionPayload,
};

/// First 8 bytes of a hash, enough to tell transactions apart in a log
pub fn short(id: &[u8; 32]) -> String {
    hex::encode(&id[..8])
}

pub fn render(envelope: &ResponseEnvelope) -> String {
    if let Some(error) = &envelope.error {
        return format!("error {:?}/{:?}: {}", error.category, error.code, error.message);
    }
    match &envelope.body {
        Some(body) => render_body(body),
        None => "empty response".to_string(),
    }
}

fn render_body(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Issued(receipt) => format!(
            "issued {} {:?}{}",
            short(&receipt.transaction_id),
            receipt.status,
            render_settlement(&receipt.settlement)
        ),
        ResponseBody::Advanced(receipt) => format!(
            "advanced {} milestone(s){}",
            receipt.milestones.len(),
            render_settlement(&receipt.settlement)
        ),
        ResponseBody::Transaction(Some(tx)) => render_transaction(tx),
        ResponseBody::Transaction(None) => "transaction not found".to_string(),
        ResponseBody::Balance(balance) => format!(
            "balance {} confirmed={} pending={:+}",
            short(&balance.address),
            balance.confirmed,
            balance.pending_delta
        ),
        ResponseBody::Tips(tips) => format!(
            "tips [{}]",
            tips.iter().map(short).collect::<Vec<_>>().join(", ")
        ),
        ResponseBody::Snapshot(snapshot) => {
            let mut out = format!(
                "snapshot clock={} milestones={} transactions={} tips={}",
                snapshot.clock,
                snapshot.milestone_count,
                snapshot.transactions.len(),
                snapshot.frontier.len()
            );
            for (address, balance) in &snapshot.balances {
                out.push_str(&format!("\n    {} = {}", short(address), balance));
            }
            for tx in &snapshot.transactions {
                out.push_str("\n    ");
                out.push_str(&render_transaction(tx));
            }
            out
        }
    }
}

fn render_transaction(tx: &TransactionPayload) -> String {
    let mut out = format!(
        "{} {:?} t={} {:?} weight={}",
        short(&tx.id),
        tx.kind,
        tx.timestamp,
        tx.status,
        tx.approval_weight
    );
    if let Some(reason) = &tx.rejection {
        out.push_str(&format!(" ({})", render_rejection(reason)));
    }
    out
}

fn render_rejection(reason: &RejectionPayload) -> String {
    match reason {
        RejectionPayload::DoubleSpend { winner } => {
            format!("double-spend, lost to {}", short(winner))
        }
        RejectionPayload::InsufficientBalance { address } => {
            format!("insufficient balance on {}", short(address))
        }
    }
}

fn render_settlement(settlement: &SettlementPayload) -> String {
    let mut out = String::new();
    for id in &settlement.confirmed {
        out.push_str(&format!("\n    confirmed {}", short(id)));
    }
    for (id, reason) in &settlement.rejected {
        out.push_str(&format!("\n    rejected {} ({})", short(id), render_rejection(reason)));
    }
    out
}
