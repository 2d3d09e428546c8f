use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::debug;

use crate::{error::LispError, expression::Expression, symbol::Symbol};


#[derive(Debug)]
struct Frame {
    bindings: RefCell<HashMap<Symbol, Expression>>,
    parent: Option<Environment>,
}

/// A lexical scope: bindings of its own plus the scope it was created under.
///
/// Cloning hands out another reference to the same scope. A scope lives as
/// long as something refers to it, so a call frame goes away when the call
/// returns unless a function defined inside it is still around. A function
/// bound in the very scope it closes over keeps that scope alive for good.
#[derive(Debug, Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// Creates an empty scope under `parent`, or a root scope.
    pub fn create(parent: Option<&Environment>) -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: parent.cloned(),
        }))
    }

    /// Binds `symbol` in this scope itself, replacing any previous binding here.
    pub fn define(&self, symbol: Symbol, value: Expression) {
        self.0.bindings.borrow_mut().insert(symbol, value);
    }

    fn defining_scope(&self, symbol: &Symbol) -> Option<&Environment> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if scope.0.bindings.borrow().contains_key(symbol) {
                return Some(scope);
            }
            current = scope.0.parent.as_ref();
        }
        None
    }

    pub fn probe(&self, symbol: &Symbol) -> Option<Expression> {
        self.defining_scope(symbol)
            .and_then(|scope| scope.0.bindings.borrow().get(symbol).cloned())
    }

    pub fn resolve(&self, symbol: &Symbol) -> Result<Expression, LispError> {
        self.probe(symbol)
            .ok_or_else(|| LispError::UndefinedSymbol(symbol.name().to_owned()))
    }

    /// Overwrites the nearest existing binding of `symbol`.
    pub fn assign(&self, symbol: &Symbol, value: Expression) -> Result<(), LispError> {
        let scope = self.defining_scope(symbol)
            .ok_or_else(|| LispError::UndefinedSymbol(symbol.name().to_owned()))?;
        scope.define(symbol.clone(), value);
        Ok(())
    }

    /// Creates a child scope binding `formals` to `arguments` positionally.
    /// A bare symbol in tail position of `formals` takes the remaining
    /// arguments as a list.
    pub fn extend(&self, formals: &Expression, arguments: &Expression) -> Result<Environment, LispError> {
        let mut bindings = vec![];
        let mut formal = formals;
        let mut argument = arguments;

        loop {
            match formal {
                Expression::Symbol(symbol) if symbol.is_nil() => {
                    if !argument.is_nil() {
                        return Err(LispError::ArityMismatch(format!(
                            "too many arguments: expected {}, got {}",
                            formals.iter().count(), arguments.iter().count()
                        )));
                    }
                    break;
                },
                Expression::Symbol(rest) => {
                    bindings.push((rest.clone(), argument.clone()));
                    break;
                },
                Expression::Pair(pair) => {
                    let name = pair.head().as_symbol()
                        .ok_or_else(|| LispError::TypeMismatch(format!("parameter {} is not a symbol", pair.head())))?;
                    let next = match argument {
                        Expression::Pair(next) => next,
                        _ if argument.is_nil() => return Err(LispError::ArityMismatch(format!(
                            "too few arguments: expected {}, got {}",
                            formals.iter().count(), arguments.iter().count()
                        ))),
                        _ => return Err(LispError::TypeMismatch(format!("argument list {} is not a list", arguments))),
                    };

                    bindings.push((name.clone(), next.head().clone()));
                    formal = pair.tail();
                    argument = next.tail();
                },
                other => return Err(LispError::TypeMismatch(format!("parameter {} is not a symbol", other))),
            }
        }

        debug!("new scope with {} binding(s)", bindings.len());
        let child = Self::create(Some(self));
        for (symbol, value) in bindings {
            child.define(symbol, value);
        }
        Ok(child)
    }
}
