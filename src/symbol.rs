use core::fmt;
use std::{collections::HashMap, hash::{Hash, Hasher}, rc::Rc};

pub(crate) const NIL: &str = "NIL";
pub(crate) const T: &str = "T";


/// Canonical handle for an interned, uppercased name.
///
/// Two symbols are equal only when they are the same interned instance, so
/// comparing and hashing never touch the name itself.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_nil(&self) -> bool {
        // Interning makes name equality coincide with identity within a table
        &*self.0 == NIL
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Interning table owned by a single evaluation session.
///
/// The symbols the evaluator recognises structurally (NIL, T and the special
/// form keywords) are interned up front and kept at hand.
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    nil: Symbol,
    t: Symbol,
    quote: Symbol,
    set: Symbol,
    defun: Symbol,
    cond: Symbol,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut symbols = HashMap::new();
        let mut intern = |name: &str| Self::intern_into(&mut symbols, name);

        let nil = intern(NIL);
        let t = intern(T);
        let quote = intern("QUOTE");
        let set = intern("SET");
        let defun = intern("DEFUN");
        let cond = intern("COND");

        Self { symbols, nil, t, quote, set, defun, cond }
    }

    fn intern_into(symbols: &mut HashMap<String, Symbol>, name: &str) -> Symbol {
        let name = name.to_uppercase();
        if let Some(symbol) = symbols.get(&name) {
            return symbol.clone();
        }

        let symbol = Symbol(Rc::from(name.as_str()));
        symbols.insert(name, symbol.clone());
        symbol
    }

    /// Returns the canonical symbol for `name`, ignoring letter case.
    pub fn intern(&mut self, name: &str) -> Symbol {
        Self::intern_into(&mut self.symbols, name)
    }

    pub fn nil(&self) -> &Symbol { &self.nil }
    pub fn t(&self) -> &Symbol { &self.t }
    pub fn quote(&self) -> &Symbol { &self.quote }
    pub fn set(&self) -> &Symbol { &self.set }
    pub fn defun(&self) -> &Symbol { &self.defun }
    pub fn cond(&self) -> &Symbol { &self.cond }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
