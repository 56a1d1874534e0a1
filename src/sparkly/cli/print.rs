use colored::Colorize;
use sparkly::ident::DecodedId;
use sparkly::value::FieldValue;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const DETAIL_WIDTH: usize = 30;

/// One line of a listing.
pub(super) struct Row {
    pub label: String,
    pub detail: String,
    pub id: String,
}

pub(super) fn print_rows(rows: &[Row], noun: &str) {
    if rows.is_empty() {
        println!("No {} found.", noun);
        return;
    }

    for (i, row) in rows.iter().enumerate() {
        let idx_str = format!("{:>4}. ", i + 1);
        let available = LINE_WIDTH.saturating_sub(idx_str.width() + DETAIL_WIDTH);
        let label = truncate_to_width(&row.label, available);
        let padding = available.saturating_sub(label.width());
        let detail = truncate_to_width(&row.detail, DETAIL_WIDTH);

        println!(
            "{}{}{}{}",
            idx_str.yellow(),
            label,
            " ".repeat(padding),
            format!("{:>width$}", detail, width = DETAIL_WIDTH).dimmed()
        );
        println!("{}{}", " ".repeat(idx_str.width()), row.id.dimmed());
    }
}

pub(super) fn print_decoded(identifier: &str, decoded: &DecodedId) {
    let mut pairs = vec![
        ("type", decoded.resource_type.to_string()),
        ("token", decoded.resource_type.wire_token().to_string()),
        ("region", decoded.region.clone()),
    ];
    if let Some(parent) = &decoded.parent_uuid {
        pairs.push(("parent", parent.clone()));
    }
    pairs.push(("uuid", decoded.uuid.clone()));

    println!("{}", identifier.bold());
    for (key, value) in pairs {
        println!("  {}{}", format!("{:<8}", key).dimmed(), value);
    }
}

pub(super) fn print_fields(fields: &[(&str, FieldValue)]) {
    let key_width = fields.iter().map(|(name, _)| name.width()).max().unwrap_or(0);
    for (name, value) in fields {
        let padding = " ".repeat(key_width.saturating_sub(name.width()) + 2);
        let rendered = if value.is_null() {
            value.to_string().dimmed()
        } else {
            value.to_string().normal()
        };
        println!("{}{}{}", name.bold(), padding, rendered);
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}
