//! Table formatting utilities using comfy-table.

use comfy_table::{Cell, Table};

/// Prints workspaces as `(name, location, scripts)` rows.
pub fn print_workspace_table(rows: &[(String, String, Vec<String>)]) {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Workspace").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Location").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Scripts").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    for (name, location, scripts) in rows {
        let scripts = if scripts.is_empty() {
            "(none)".to_string()
        } else {
            scripts.join(", ")
        };
        table.add_row(vec![
            Cell::new(name).fg(comfy_table::Color::White),
            Cell::new(location).fg(comfy_table::Color::Cyan),
            Cell::new(scripts).fg(comfy_table::Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}
