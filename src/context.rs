use std::{collections::HashMap, io::{self, Write}};

use log::trace;

use crate::{
    builtin::{builtin_table, Builtin},
    environment::Environment,
    error::LispError,
    expression::Expression,
    interpreter::{apply, evaluate, EvaluationResult},
    parser::{parse, ParseResult, Reader},
    symbol::{Symbol, SymbolTable},
};


/// One interpreter session.
///
/// Owns everything an evaluation touches: the symbol table, the global
/// scope, the primitive dispatch table and the sink that
/// `PRINT` writes to. Sessions share nothing, so several can live side by
/// side in one process.
pub struct EvaluationContext {
    symbols: SymbolTable,
    global: Environment,
    builtins: HashMap<Symbol, Builtin>,
    output: Box<dyn Write>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    pub fn with_output(output: impl Write + 'static) -> Self {
        let mut symbols = SymbolTable::new();
        let global = Environment::create(None);
        let mut builtins = HashMap::new();

        // NIL, T and every primitive name evaluate to themselves
        for symbol in [symbols.nil().clone(), symbols.t().clone()] {
            global.define(symbol.clone(), Expression::Symbol(symbol));
        }
        for &(name, builtin) in builtin_table() {
            let symbol = symbols.intern(name);
            builtins.insert(symbol.clone(), builtin);
            global.define(symbol.clone(), Expression::Symbol(symbol));
        }

        Self {
            symbols,
            global,
            builtins,
            output: Box::new(output),
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    pub fn global_environment(&self) -> &Environment {
        &self.global
    }

    pub(crate) fn builtin(&self, symbol: &Symbol) -> Option<Builtin> {
        self.builtins.get(symbol).copied()
    }

    pub fn is_builtin(&self, symbol: &Symbol) -> bool {
        self.builtins.contains_key(symbol)
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub fn nil(&self) -> Expression {
        Expression::Symbol(self.symbols.nil().clone())
    }

    pub fn t(&self) -> Expression {
        Expression::Symbol(self.symbols.t().clone())
    }

    pub fn truth(&self, value: bool) -> Expression {
        if value { self.t() } else { self.nil() }
    }

    /// Builds a proper list holding `values`.
    pub fn list(&self, values: Vec<Expression>) -> Expression {
        Expression::list_from(values, self.nil())
    }

    /// Reads the next expression from `reader`, interning into this session.
    pub fn read(&mut self, reader: &mut Reader<'_>) -> ParseResult<Option<Expression>> {
        reader.parse_expression(&mut self.symbols)
    }

    pub fn parse(&mut self, input: &str) -> ParseResult<Vec<Expression>> {
        parse(input, &mut self.symbols)
    }

    /// Evaluates `expression` in the global scope.
    pub fn evaluate(&mut self, expression: &Expression) -> EvaluationResult {
        let global = self.global.clone();
        evaluate(expression, &global, self)
    }

    pub fn evaluate_in(&mut self, expression: &Expression, environment: &Environment) -> EvaluationResult {
        evaluate(expression, environment, self)
    }

    pub fn apply(&mut self, operator: &Expression, arguments: Vec<Expression>) -> EvaluationResult {
        apply(operator, arguments, self)
    }

    /// Reads the first expression of `input` and evaluates it.
    pub fn evaluate_str(&mut self, input: &str) -> EvaluationResult {
        let mut reader = Reader::new(input);
        let expression = self.read(&mut reader)?
            .ok_or_else(|| LispError::Syntax("empty expression".to_owned()))?;

        trace!("evaluating source {:?}", input);
        self.evaluate(&expression)
    }

    /// Evaluates every expression in `input` in order, stopping at the first
    /// failure.
    pub fn evaluate_all(&mut self, input: &str) -> Result<Vec<Expression>, LispError> {
        let mut reader = Reader::new(input);
        let mut results = vec![];

        while let Some(expression) = self.read(&mut reader)? {
            results.push(self.evaluate(&expression)?);
        }

        Ok(results)
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::ErrorKind, test_utils::SharedBuffer};

    use super::*;

    fn context() -> EvaluationContext {
        EvaluationContext::with_output(io::sink())
    }

    #[test]
    fn global_scope_binds_constants_and_primitives() -> anyhow::Result<()> {
        let mut context = context();
        assert_eq!(context.evaluate_str("NIL")?.to_string(), "NIL");
        assert_eq!(context.evaluate_str("t")?.to_string(), "T");
        assert_eq!(context.evaluate_str("car")?.to_string(), "CAR");
        assert_eq!(context.evaluate_str("+")?.to_string(), "+");

        let car = context.intern("CAR");
        let first = context.intern("FIRST");
        assert!(context.is_builtin(&car));
        assert!(context.is_builtin(&first));
        assert!(!context.is_builtin(&context.symbols().quote().clone()));
        Ok(())
    }

    #[test]
    fn empty_source_is_a_syntax_error() {
        let mut context = context();
        assert_eq!(context.evaluate_str("  ; nothing").err().map(|e| e.kind()), Some(ErrorKind::Syntax));
    }

    #[test]
    fn evaluate_str_reads_only_the_first_expression() -> anyhow::Result<()> {
        let mut context = context();
        assert_eq!(context.evaluate_str("(SET a 1) (SET a 2)")?.to_string(), "1");
        assert_eq!(context.evaluate_str("a")?.to_string(), "1");
        Ok(())
    }

    #[test]
    fn evaluate_all_runs_in_order() -> anyhow::Result<()> {
        let mut context = context();
        let results = context.evaluate_all("(SET a 1) (SET b (+ a 1)) (LIST a b)")?;
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].to_string(), "(1 2)");

        let failed = context.evaluate_all("(SET c 1) (CAR c) (SET c 2)");
        assert_eq!(failed.err().map(|e| e.kind()), Some(ErrorKind::AtomDecomposition));
        assert_eq!(context.evaluate_str("c")?.to_string(), "1");
        Ok(())
    }

    #[test]
    fn apply_dispatches_primitives_and_functions() -> anyhow::Result<()> {
        let mut context = context();
        let plus = context.evaluate_str("+")?;
        let sum = context.apply(&plus, vec![Expression::Number(2), Expression::Number(3)])?;
        assert_eq!(sum.to_string(), "5");

        let double = context.evaluate_all("(DEFUN (double x) (* 2 x)) double")?.remove(1);
        assert_eq!(context.apply(&double, vec![Expression::Number(21)])?.to_string(), "42");

        let quote = Expression::Symbol(context.symbols().quote().clone());
        assert_eq!(
            context.apply(&quote, vec![]).err().map(|e| e.kind()),
            Some(ErrorKind::ApplyNonFunction)
        );
        Ok(())
    }

    #[test]
    fn sessions_are_independent() -> anyhow::Result<()> {
        let mut first = context();
        let mut second = context();
        first.evaluate_str("(SET only-here 1)")?;
        assert_eq!(second.evaluate_str("only-here").err().map(|e| e.kind()), Some(ErrorKind::UndefinedSymbol));
        Ok(())
    }

    #[test]
    fn print_goes_to_the_session_sink() -> anyhow::Result<()> {
        let output = SharedBuffer::default();
        let mut context = EvaluationContext::with_output(output.clone());
        context.evaluate_str("(PRINT \"Hola Mundo\")")?;
        assert!(output.contents().contains("Hola Mundo"));
        Ok(())
    }
}
