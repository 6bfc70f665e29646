use log::debug;

use super::symbols::SymbolTable;
use crate::shell::error::ShellError;
use crate::shell::parser::{CommandLine, Origin};

/// Replaces the text of every variable node with its value from `symbols`.
/// Values are substituted once and never rescanned.
pub fn expand(line: &mut CommandLine, symbols: &SymbolTable) -> Result<(), ShellError> {
    for stage in line.layout()? {
        for id in stage {
            let node = line.node_mut(id);
            if node.origin != Origin::Variable {
                continue;
            }
            let name = node.variable_name.as_deref().unwrap_or_default();
            let value = symbols.lookup(name);
            debug!("变量替换: ${} -> {:?}", name, value);
            node.variable_value = Some(value.clone());
            node.text = Some(value);
        }
    }
    Ok(())
}
