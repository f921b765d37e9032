//! Argument name normalization and run-scoped synthetic names

/// Replace every whitespace character with `_`
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Native local holding the converted value of an argument
pub fn symbol(name: &str) -> String {
    format!("{}_arg", normalize_name(name))
}

/// Boundary temporary receiving the raw object before conversion
pub fn boundary_symbol(name: &str) -> String {
    format!("{}_pyarg", normalize_name(name))
}

/// Whether `name` can be used verbatim as a native identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Source of synthetic names for unnamed arguments.
///
/// One allocator belongs to one generation run. Names are `_00000000`,
/// `_00000001`, ... in allocation order, so the same declarations processed
/// in the same order always receive the same names.
#[derive(Debug, Default)]
pub struct NameAllocator {
    next: u32,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> String {
        let name = format!("_{:08}", self.next);
        self.next += 1;
        name
    }

    /// Start numbering from zero again
    pub fn reset(&mut self) {
        self.next = 0;
    }

    pub fn allocated(&self) -> u32 {
        self.next
    }
}
