//! Generated VAT postings.
//!
//! A posting carrying a VAT amount gets at most one companion posting for
//! the tax, placed right after it in the stream. Sales-side rules are
//! checked before purchase-side ones.

use crate::core::{Transaction, VatAccounts};
use rust_decimal::Decimal;

fn leading_digit_in(code: &str, digits: &[char]) -> bool {
    code.chars().next().is_some_and(|c| digits.contains(&c))
}

/// The VAT posting for `tx`, if one applies.
pub fn vat_posting(tx: &Transaction, accounts: &VatAccounts) -> Option<Transaction> {
    if tx.vat_amount <= Decimal::ZERO || tx.synthetic {
        return None;
    }

    let (debit, credit) = if leading_digit_in(&tx.credit_account, &['5', '7']) {
        let customs = tx
            .voucher_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(&accounts.customs_voucher_type));
        let output = if customs {
            &accounts.output_customs
        } else {
            &accounts.output
        };
        (tx.debit_account.clone(), output.clone())
    } else if leading_digit_in(&tx.debit_account, &['1', '2', '6', '8']) {
        let input = if tx.debit_account.starts_with(&accounts.fixed_asset_prefix) {
            &accounts.input_fixed_asset
        } else {
            &accounts.input
        };
        (input.clone(), tx.credit_account.clone())
    } else {
        return None;
    };

    let label = tx
        .description
        .clone()
        .or_else(|| tx.voucher_no.as_ref().map(|no| format!("voucher {}", no)))
        .unwrap_or_default();

    Some(Transaction {
        debit_account: debit,
        credit_account: credit,
        amount: tx.vat_amount,
        quantity: Decimal::ZERO,
        unit_price: None,
        warehouse: None,
        item: None,
        vat_amount: Decimal::ZERO,
        description: Some(format!("VAT on {}", label).trim_end().to_string()),
        item_name: None,
        item_spec: None,
        movement: None,
        synthetic: true,
        ..tx.clone()
    })
}

/// The stream with VAT postings inserted after their source rows.
pub fn expand_vat(transactions: &[Transaction], accounts: &VatAccounts) -> Vec<Transaction> {
    let mut out = Vec::with_capacity(transactions.len());
    let mut generated = 0usize;
    for tx in transactions {
        out.push(tx.clone());
        if let Some(vat) = vat_posting(tx, accounts) {
            log::debug!(
                "{}: VAT {} posted Dr {} / Cr {}",
                tx.source,
                vat.amount,
                vat.debit_account,
                vat.credit_account
            );
            out.push(vat);
            generated += 1;
        }
    }
    log::info!("{} VAT postings generated", generated);
    out
}
