//! `hostbind layout`: top-level sections of the document.

use hostbind_engine::idl::layout;
use hostbind_engine::IdlDocument;

pub fn execute(api: &IdlDocument) -> anyhow::Result<()> {
    for entry in layout(api) {
        let sample = if entry.sample.is_empty() {
            String::new()
        } else {
            format!("  ({}, ...)", entry.sample.join(", "))
        };
        println!("{:<28} {:<7} {:>6}{}", entry.key, entry.kind, entry.len, sample);
    }
    Ok(())
}
