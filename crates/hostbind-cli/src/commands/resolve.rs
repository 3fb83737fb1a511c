//! `hostbind resolve`: type-strings to descriptors.

use std::sync::Arc;

use hostbind_engine::{IdlDocument, TypeResolver};

pub fn execute(api: Arc<IdlDocument>, types: &[String]) -> anyhow::Result<()> {
    let resolver = TypeResolver::new(api);
    let mut failed = 0;
    for text in types {
        match resolver.resolve(text) {
            Ok(info) => {
                let descriptor = info.property_info("");
                println!("{} => {} ({:?})", text, info.canonical(), info.kind());
                println!(
                    "    type: {}  class_name: {:?}  hint: {:?} {:?}",
                    descriptor.ty.name(),
                    descriptor.class_name,
                    descriptor.hint,
                    descriptor.hint_string
                );
            }
            Err(err) => {
                failed += 1;
                println!("{} => error: {}", text, err);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} type-strings did not resolve", failed, types.len());
    }
    Ok(())
}
