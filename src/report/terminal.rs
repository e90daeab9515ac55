use crate::analysis::UnusedResource;
use crate::model::ResourceType;
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    safe_mode: bool,
}

impl TerminalReporter {
    pub fn new(safe_mode: bool) -> Self {
        Self { safe_mode }
    }

    pub fn report(&self, unused: &[UnusedResource], total: usize) -> Result<()> {
        if unused.is_empty() {
            println!("{}", "No unused resources found!".green().bold());
            return Ok(());
        }

        // Group by type; items are already sorted by name within a type
        let mut by_type: BTreeMap<ResourceType, Vec<&UnusedResource>> = BTreeMap::new();
        for item in unused {
            by_type.entry(item.resource_type).or_default().push(item);
        }

        println!();
        println!(
            "{}",
            format!("Found {} unused resources:", unused.len())
                .yellow()
                .bold()
        );
        println!();

        for (resource_type, items) in &by_type {
            println!(
                "{} {}",
                resource_type.name().cyan().bold(),
                format!("({})", items.len()).dimmed()
            );
            for item in items {
                self.print_item(item);
            }
            println!();
        }

        self.print_summary(unused, total, by_type.len());
        Ok(())
    }

    fn print_item(&self, item: &UnusedResource) {
        let id = match item.id {
            Some(id) => format!("0x{:08x}", id),
            None => "-".repeat(10),
        };
        let package = item
            .package
            .as_deref()
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();

        println!("  {} {}{}", id.dimmed(), item.url().white(), package.dimmed());
        for file in &item.files {
            println!("    {} {}", "→".dimmed(), file.dimmed());
        }
    }

    fn print_summary(&self, unused: &[UnusedResource], total: usize, types: usize) {
        let files: usize = unused.iter().map(|item| item.files.len()).sum();

        println!("{}", "─".repeat(60).dimmed());
        println!(
            "Summary: {} of {} resources unused across {} types, {} files",
            unused.len().to_string().yellow(),
            total,
            types,
            files
        );
        println!();

        if !self.safe_mode {
            println!(
                "{}",
                "⚠ Strict shrink mode: resources looked up by name at runtime are not guessed"
                    .yellow()
            );
        }
        println!(
            "{}",
            "Tip: Add tools:keep=\"@type/name\" to a keep file to retain a resource".dimmed()
        );
    }
}
