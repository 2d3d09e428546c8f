use std::rc::Rc;

use itertools::Itertools;
use log::{debug, trace};

use crate::{
    context::EvaluationContext,
    environment::Environment,
    error::LispError,
    expression::{Expression, Function, Pair},
    symbol::{Symbol, SymbolTable},
};

pub type EvaluationResult = Result<Expression, LispError>;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecialForm {
    Quote,
    Set,
    Defun,
    Cond,
}

impl SpecialForm {
    fn recognize(symbol: &Symbol, symbols: &SymbolTable) -> Option<Self> {
        if symbol == symbols.quote() { Some(Self::Quote) }
        else if symbol == symbols.set() { Some(Self::Set) }
        else if symbol == symbols.defun() { Some(Self::Defun) }
        else if symbol == symbols.cond() { Some(Self::Cond) }
        else { None }
    }
}

/// Collects the operands of a special form, requiring a proper list of
/// exactly `count` elements.
fn form_operands<'e>(form: &str, operands: &'e Expression, count: usize) -> Result<Vec<&'e Expression>, LispError> {
    let mut items = operands.iter();
    let values = items.by_ref().collect_vec();

    if !items.terminator().is_nil() || values.len() != count {
        return Err(LispError::Syntax(format!(
            "{} expects exactly {} operand(s) in (... {})", form, count, operands
        )));
    }
    Ok(values)
}

fn evaluate_quote(operands: &Expression) -> EvaluationResult {
    let operands = form_operands("QUOTE", operands, 1)?;
    Ok(operands[0].clone())
}

fn evaluate_set(operands: &Expression, environment: &Environment, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Rebinds the nearest scope that already holds the name; an unbound name
    // is defined in the current scope.

    let operands = form_operands("SET", operands, 2)?;
    let symbol = operands[0].as_symbol()
        .ok_or_else(|| LispError::Syntax(format!("SET expects a symbol, got {}", operands[0])))?
        .clone();

    let value = evaluate(operands[1], environment, ctx)?;
    if environment.probe(&symbol).is_some() {
        environment.assign(&symbol, value.clone())?;
    } else {
        environment.define(symbol.clone(), value.clone());
    }

    debug!("SET {} = {}", symbol, value);
    Ok(value)
}

fn evaluate_defun(operands: &Expression, environment: &Environment) -> EvaluationResult {
    // (DEFUN (name . parameters) body) binds name in the current scope to a
    // function closing over that same scope

    let operands = form_operands("DEFUN", operands, 2)?;
    let header = operands[0].as_pair()
        .ok_or_else(|| LispError::Syntax(format!("DEFUN expects a (name . parameters) header, got {}", operands[0])))?;
    let name = header.head().as_symbol()
        .ok_or_else(|| LispError::Syntax(format!("DEFUN expects a symbol as function name, got {}", header.head())))?
        .clone();

    let function = Function::new(header.tail().clone(), operands[1].clone(), environment.clone());
    environment.define(name.clone(), Expression::Function(Rc::new(function)));

    debug!("DEFUN {} {}", name, header.tail());
    Ok(Expression::Symbol(name))
}

fn evaluate_cond(clauses: &Expression, environment: &Environment, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Clauses are tried in order and only up to the first match. A literal T
    // condition is taken without evaluation.

    let mut items = clauses.iter();
    for clause in items.by_ref() {
        let parts = clause.to_vec()
            .filter(|parts| parts.len() == 2)
            .ok_or_else(|| LispError::Syntax(format!("malformed COND clause {}", clause)))?;
        let (condition, result) = (&parts[0], &parts[1]);

        let always = matches!(condition, Expression::Symbol(symbol) if symbol == ctx.symbols().t());
        if always || !evaluate(condition, environment, ctx)?.is_nil() {
            return evaluate(result, environment, ctx);
        }
    }

    if !items.terminator().is_nil() {
        return Err(LispError::Syntax(format!("malformed COND clause list ending in {}", items.terminator())));
    }
    Ok(ctx.nil())
}

fn evaluate_arguments(arguments: &Expression, environment: &Environment, ctx: &mut EvaluationContext) -> Result<Vec<Expression>, LispError> {
    if !arguments.is_list() {
        return Err(LispError::Syntax(format!("malformed argument list {}", arguments)));
    }

    arguments.iter()
        .map(|argument| evaluate(argument, environment, ctx))
        .collect()
}

fn evaluate_pair(pair: &Pair, environment: &Environment, ctx: &mut EvaluationContext) -> EvaluationResult {
    let form = pair.head().as_symbol()
        .and_then(|symbol| SpecialForm::recognize(symbol, ctx.symbols()));

    match form {
        Some(SpecialForm::Quote) => evaluate_quote(pair.tail()),
        Some(SpecialForm::Set) => evaluate_set(pair.tail(), environment, ctx),
        Some(SpecialForm::Defun) => evaluate_defun(pair.tail(), environment),
        Some(SpecialForm::Cond) => evaluate_cond(pair.tail(), environment, ctx),
        None => {
            let operator = evaluate(pair.head(), environment, ctx)?;
            let arguments = evaluate_arguments(pair.tail(), environment, ctx)?;
            apply(&operator, arguments, ctx)
        }
    }
}

/// Applies an evaluated operator to already-evaluated arguments.
pub(crate) fn apply(operator: &Expression, arguments: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    match operator {
        Expression::Function(function) => {
            trace!("apply function to {} argument(s)", arguments.len());
            let arguments = ctx.list(arguments);
            let scope = function.environment().extend(function.parameters(), &arguments)?;
            evaluate(function.body(), &scope, ctx)
        },
        Expression::Symbol(symbol) => match ctx.builtin(symbol) {
            Some(builtin) => {
                trace!("apply {} to {} argument(s)", symbol, arguments.len());
                builtin(arguments, ctx)
            },
            None => Err(LispError::ApplyNonFunction(symbol.name().to_owned())),
        },
        other => Err(LispError::ApplyNonFunction(other.to_string())),
    }
}

pub(crate) fn evaluate(expression: &Expression, environment: &Environment, ctx: &mut EvaluationContext) -> EvaluationResult {
    trace!("evaluate {}", expression);
    match expression {
        Expression::Number(_) | Expression::String(_) | Expression::Function(_) => Ok(expression.clone()),
        Expression::Symbol(symbol) => environment.resolve(symbol),
        Expression::Pair(pair) => evaluate_pair(pair, environment, ctx),
    }
}



#[cfg(test)]
mod tests {
    use std::io;

    use anyhow::bail;

    use crate::{error::ErrorKind, test_utils::{all_testcases, load_test_pair, Expectation, SharedBuffer}};

    use super::*;

    fn assert_run(testcase: &str, entries: &[(String, Expectation)]) -> anyhow::Result<()> {
        let mut evaluation_context = EvaluationContext::with_output(io::sink());
        for (lineno, (source, expected)) in entries.iter().enumerate() {
            let result = evaluation_context.evaluate_str(source.as_str())
                .map(|value| value.to_string())
                .map_err(|err| format!("{:?}", err.kind()));
            let expected = expected.to_result()?;

            if result != expected {
                bail!("Testcase({}, {}): {}\nGot {:?}, expected {:?}", testcase, lineno + 1, source, result, expected);
            }
        }

        Ok(())
    }

    #[test]
    fn evaluate_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            let entries = load_test_pair(testcase)?;
            assert_run(testcase, &entries)?;
        }

        Ok(())
    }

    fn run(ctx: &mut EvaluationContext, source: &str) -> anyhow::Result<String> {
        let results = ctx.evaluate_all(source)?;
        match results.last() {
            Some(value) => Ok(value.to_string()),
            None => bail!("no expressions in {:?}", source),
        }
    }

    #[test]
    fn recursive_functions() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(DEFUN (fact n) (COND ((= n 0) 1) (T (* n (fact (- n 1))))))")?;
        assert_eq!(run(&mut ctx, "(fact 5)")?, "120");

        run(&mut ctx, "(DEFUN (fib n) (COND ((< n 2) n) (T (+ (fib (- n 1)) (fib (- n 2))))))")?;
        assert_eq!(run(&mut ctx, "(fib 5)")?, "5");
        assert_eq!(run(&mut ctx, "(fib 20)")?, "6765");
        Ok(())
    }

    #[test]
    fn cond_stops_at_the_first_match() -> anyhow::Result<()> {
        let output = SharedBuffer::default();
        let mut ctx = EvaluationContext::with_output(output.clone());

        assert_eq!(run(&mut ctx, "(COND ((> 3 2) 'A) ((PRINT 'evaluated) 'B))")?, "A");
        assert_eq!(output.contents(), "");

        assert_eq!(run(&mut ctx, "(COND ((PRINT 'first) 'A) ((< 2 3) 'B))")?, "B");
        assert_eq!(output.contents(), "FIRST \n");
        Ok(())
    }

    #[test]
    fn literal_t_condition_is_not_evaluated() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        // Rebinding T does not change how a literal T clause is taken
        run(&mut ctx, "(SET T NIL)")?;
        assert_eq!(run(&mut ctx, "(COND (T 'taken))")?, "TAKEN");
        Ok(())
    }

    #[test]
    fn set_inside_a_function_updates_the_enclosing_binding() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(SET total 0) (DEFUN (add-to-total k) (SET total (+ total k)))")?;
        run(&mut ctx, "(add-to-total 5) (add-to-total 7)")?;
        assert_eq!(run(&mut ctx, "total")?, "12");
        Ok(())
    }

    #[test]
    fn parameters_shadow_without_leaking() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(SET x 1) (DEFUN (f x) (SET x 99))")?;
        assert_eq!(run(&mut ctx, "(f 2)")?, "99");
        assert_eq!(run(&mut ctx, "x")?, "1");
        Ok(())
    }

    #[test]
    fn closures_see_later_global_definitions() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(DEFUN (spam) (* eggs 3))")?;
        assert_eq!(ctx.evaluate_str("(spam)").err().map(|e| e.kind()), Some(ErrorKind::UndefinedSymbol));
        run(&mut ctx, "(SET eggs 20)")?;
        assert_eq!(run(&mut ctx, "(spam)")?, "60");
        Ok(())
    }

    #[test]
    fn nested_definitions_close_over_the_call_scope() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(DEFUN (outer n) (CONS (DEFUN (inner) n) (inner)))")?;
        assert_eq!(run(&mut ctx, "(outer 7)")?, "(INNER . 7)");
        assert_eq!(ctx.evaluate_str("(inner)").err().map(|e| e.kind()), Some(ErrorKind::UndefinedSymbol));
        Ok(())
    }

    #[test]
    fn variadic_functions() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        run(&mut ctx, "(DEFUN (tail-of head . others) others)")?;
        assert_eq!(run(&mut ctx, "(tail-of 1 2 3)")?, "(2 3)");
        assert_eq!(run(&mut ctx, "(tail-of 1)")?, "NIL");
        assert_eq!(ctx.evaluate_str("(tail-of)").err().map(|e| e.kind()), Some(ErrorKind::ArityMismatch));
        Ok(())
    }

    #[test]
    fn arguments_evaluate_left_to_right() -> anyhow::Result<()> {
        let output = SharedBuffer::default();
        let mut ctx = EvaluationContext::with_output(output.clone());
        assert_eq!(run(&mut ctx, "(LIST (PRINT 1) (PRINT 2) (PRINT 3))")?, "(NIL NIL NIL)");
        assert_eq!(output.contents(), "1 \n2 \n3 \n");
        Ok(())
    }

    #[test]
    fn errors_propagate_unchanged() {
        let mut ctx = EvaluationContext::with_output(io::sink());
        let result = ctx.evaluate_all("(DEFUN (deep n) (COND ((= n 0) (/ 1 0)) (T (deep (- n 1))))) (deep 10)");
        assert_eq!(result.err(), Some(LispError::DivideByZero));
    }

    #[test]
    fn evaluating_in_a_child_scope() -> anyhow::Result<()> {
        let mut ctx = EvaluationContext::with_output(io::sink());
        let global = ctx.global_environment().clone();
        let formals = ctx.parse("(a b)")?.remove(0);
        let arguments = ctx.parse("(1 2)")?.remove(0);
        let scope = global.extend(&formals, &arguments)?;

        let expression = ctx.parse("(+ a b)")?.remove(0);
        assert_eq!(ctx.evaluate_in(&expression, &scope)?.to_string(), "3");
        assert_eq!(ctx.evaluate(&expression).err().map(|e| e.kind()), Some(ErrorKind::UndefinedSymbol));
        Ok(())
    }
}
