//! Per-assembly state: the address cursor and the label table.
use std::collections::HashMap;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Environment {
    address: u32,
    symbols: HashMap<String, u32>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::with_origin(0)
    }

    pub fn with_origin(origin: u32) -> Self {
        Environment { address: origin, symbols: HashMap::new() }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn set_address(&mut self, address: u32) {
        self.address = address;
    }

    /// Advance the cursor by `step` bytes.
    pub fn next(&mut self, step: u32) {
        self.address = self.address.wrapping_add(step);
    }

    /// Bind `name` to the current address, returning the address it was
    /// previously bound to. A redefinition replaces the old binding.
    pub fn define(&mut self, name: &str) -> Option<u32> {
        self.symbols.insert(name.to_owned(), self.address)
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.symbols.get(name).copied()
    }

    /// All labels ordered by address, then name.
    pub fn symbols(&self) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self.symbols.iter()
            .map(|(name, &addr)| (name.clone(), addr))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}
