//! `hostbind query`: print the node at a path.

use anyhow::Context;
use hostbind_engine::idl::pretty_string;
use hostbind_engine::IdlDocument;

pub fn execute(api: &IdlDocument, path: &str, max_depth: usize, json: bool) -> anyhow::Result<()> {
    let node = api
        .get_via_path(path)
        .with_context(|| format!("no node at '{}'", path))?;
    if json {
        println!("{}", serde_json::to_string_pretty(node.value())?);
    } else {
        println!("{}", pretty_string(node, max_depth));
    }
    Ok(())
}
