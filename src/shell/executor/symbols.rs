use std::collections::HashMap;

/// Shell variables. Names are case sensitive; lookups of unknown names
/// yield an empty string.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    vars: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn update(&mut self, name: &str, value: &str) {
        match self.vars.get_mut(name) {
            Some(slot) => {
                slot.clear();
                slot.push_str(value);
            }
            None => {
                self.vars.insert(name.to_owned(), value.to_owned());
            }
        }
    }

    pub fn lookup(&self, name: &str) -> String {
        self.vars.get(name).cloned().unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.vars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drops every binding; the table stays usable.
    pub fn teardown(&mut self) {
        self.vars.clear();
    }
}
