//! Category display formatting
//!
//! Categories print as a tree with their subcategories underneath.

use crate::models::Subcategory;
use crate::services::CategoryWithSubcategories;

/// Format categories as a tree; `usage` gives an optional count per category
pub fn format_category_tree(
    tree: &[CategoryWithSubcategories],
    usage: impl Fn(&CategoryWithSubcategories) -> Option<usize>,
) -> String {
    if tree.is_empty() {
        return "No categories found.\n\nRun 'tally init' to create default categories.\n"
            .to_string();
    }

    let mut output = String::new();

    for node in tree {
        let count = usage(node)
            .map(|n| format!(" ({} transaction{})", n, if n == 1 { "" } else { "s" }))
            .unwrap_or_default();
        output.push_str(&format!("{}{}  [{}]\n", node.category.name, count, node.category.id));

        for (j, sub) in node.subcategories.iter().enumerate() {
            let is_last = j == node.subcategories.len() - 1;
            let prefix = if is_last { "└── " } else { "├── " };
            output.push_str(&format!("  {}{}\n", prefix, sub.name));
        }
    }

    output
}

/// Format the subcategories of one category
pub fn format_subcategory_list(category_name: &str, subcategories: &[Subcategory]) -> String {
    if subcategories.is_empty() {
        return format!("{} has no subcategories.\n", category_name);
    }

    let mut output = format!("{}:\n", category_name);
    for sub in subcategories {
        output.push_str(&format!("  {}  [{}]\n", sub.name, sub.id));
    }
    output
}
