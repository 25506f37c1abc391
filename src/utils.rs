use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

pub fn write_csv<I, R, W>(records: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
    W: std::io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Rounded table with numbers right-aligned below the header.
pub fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}

pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Amount column that stays blank for zero, as in printed ledgers.
pub fn format_side(value: Decimal) -> String {
    if value.is_zero() {
        String::new()
    } else {
        format_amount(value)
    }
}

pub fn format_quantity(qty: Decimal) -> String {
    let s = format!("{:.4}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

pub fn format_unit_cost(cost: Decimal) -> String {
    format!("{:.4}", cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(dec!(7)), "7");
        assert_eq!(format_quantity(dec!(2.50)), "2.5");
        assert_eq!(format_quantity(dec!(0.0001)), "0.0001");
    }

    #[test]
    fn zero_sides_are_blank() {
        assert_eq!(format_side(Decimal::ZERO), "");
        assert_eq!(format_side(dec!(85.333)), "85.33");
    }
}
