use itertools::Itertools;
use log::warn;

use crate::{context::EvaluationContext, error::LispError, expression::Expression, interpreter::EvaluationResult};

pub(crate) type Builtin = fn(Vec<Expression>, &mut EvaluationContext) -> EvaluationResult;


fn arguments<const N: usize>(name: &str, values: Vec<Expression>) -> Result<[Expression; N], LispError> {
    let count = values.len();
    values.try_into()
        .map_err(|_| LispError::ArityMismatch(format!("{} expects {} argument(s), got {}", name, N, count)))
}

fn expect_numbers(name: &str, values: &[Expression]) -> Result<Vec<i64>, LispError> {
    values.iter()
        .map(|value| match value {
            Expression::Number(number) => Ok(*number),
            other => Err(LispError::TypeMismatch(format!("{} expects numbers, got {}", name, other)))
        }).collect()
}

fn builtin_car(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = arguments::<1>("CAR", values)?;
    match value.as_pair() {
        Some(pair) => Ok(pair.head().clone()),
        None => Err(LispError::AtomDecomposition(format!("CAR of {}", value)))
    }
}

fn builtin_cdr(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = arguments::<1>("CDR", values)?;
    match value.as_pair() {
        Some(pair) => Ok(pair.tail().clone()),
        None => Err(LispError::AtomDecomposition(format!("CDR of {}", value)))
    }
}

fn builtin_cons(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let [head, tail] = arguments::<2>("CONS", values)?;
    Ok(Expression::cons(head, tail))
}

fn builtin_list(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    Ok(ctx.list(values))
}

fn builtin_eq(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [a, b] = arguments::<2>("EQ", values)?;
    Ok(ctx.truth(a.is_identical(&b)))
}

fn builtin_equal(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [a, b] = arguments::<2>("EQUAL", values)?;
    Ok(ctx.truth(a.equal(&b)))
}

fn builtin_atom(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = arguments::<1>("ATOM", values)?;
    Ok(ctx.truth(value.is_atom()))
}

fn builtin_is_list(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = arguments::<1>("LIST?", values)?;
    Ok(ctx.truth(value.is_list()))
}

fn builtin_concat(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    // Strings contribute their raw text, everything else its printed form
    let text = values.iter()
        .map(|value| match value {
            Expression::String(text) => text.to_string(),
            other => other.to_string(),
        })
        .join("");
    Ok(Expression::string(&text))
}

fn builtin_length(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = arguments::<1>("LENGTH", values)?;
    match value {
        Expression::String(text) => Ok(Expression::Number(text.chars().count() as i64)),
        other => Err(LispError::TypeMismatch(format!("LENGTH expects a string, got {}", other)))
    }
}

fn builtin_add(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let values = expect_numbers("+", &values)?;
    Ok(Expression::Number(values.into_iter().fold(0, i64::wrapping_add)))
}

fn builtin_sub(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let values = expect_numbers("-", &values)?;
    match values.split_first() {
        None => Err(LispError::ArityMismatch("- expects at least 1 argument, got 0".to_owned())),
        Some((first, [])) => Ok(Expression::Number(first.wrapping_neg())),
        Some((first, rest)) => Ok(Expression::Number(rest.iter().fold(*first, |a, b| a.wrapping_sub(*b)))),
    }
}

fn builtin_mul(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let values = expect_numbers("*", &values)?;
    Ok(Expression::Number(values.into_iter().fold(1, i64::wrapping_mul)))
}

fn divide(dividend: i64, divisor: i64) -> Result<i64, LispError> {
    if divisor == 0 { return Err(LispError::DivideByZero); }
    Ok(dividend.wrapping_div(divisor))
}

fn builtin_div(values: Vec<Expression>, _ctx: &mut EvaluationContext) -> EvaluationResult {
    let values = expect_numbers("/", &values)?;
    match values.split_first() {
        None => Err(LispError::ArityMismatch("/ expects at least 1 argument, got 0".to_owned())),
        Some((first, [])) => divide(1, *first).map(Expression::Number),
        Some((first, rest)) => rest.iter()
            .try_fold(*first, |a, b| divide(a, *b))
            .map(Expression::Number),
    }
}

fn builtin_compare<F: Fn(i64, i64) -> bool>(name: &str, values: Vec<Expression>, ctx: &EvaluationContext, f: F) -> EvaluationResult {
    let values = arguments::<2>(name, values)?;
    let [a, b] = [&values[0], &values[1]].map(|value| match value {
        Expression::Number(number) => Ok(*number),
        other => Err(LispError::TypeMismatch(format!("{} expects numbers, got {}", name, other)))
    });
    Ok(ctx.truth(f(a?, b?)))
}

fn builtin_less(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    builtin_compare("<", values, ctx, |a, b| a < b)
}

fn builtin_greater(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    builtin_compare(">", values, ctx, |a, b| a > b)
}

fn builtin_print(values: Vec<Expression>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let line = values.iter()
        .map(|value| format!("{} ", value))
        .join("");

    if let Err(err) = writeln!(ctx.output(), "{}", line) {
        warn!("PRINT failed to write output: {}", err);
    }
    Ok(ctx.nil())
}

static BUILTINS: &[(&str, Builtin)] = &[
    ("CAR", builtin_car),
    ("FIRST", builtin_car),
    ("CDR", builtin_cdr),
    ("REST", builtin_cdr),
    ("CONS", builtin_cons),
    ("LIST", builtin_list),

    ("EQ", builtin_eq),
    ("EQUAL", builtin_equal),
    ("EQUAL?", builtin_equal),
    ("=", builtin_equal),
    ("ATOM", builtin_atom),
    ("LIST?", builtin_is_list),

    ("CONCAT", builtin_concat),
    ("LENGTH", builtin_length),

    ("+", builtin_add),
    ("ADD", builtin_add),
    ("-", builtin_sub),
    ("SUB", builtin_sub),
    ("*", builtin_mul),
    ("MUL", builtin_mul),
    ("/", builtin_div),
    ("DIV", builtin_div),

    ("<", builtin_less),
    ("LESS", builtin_less),
    (">", builtin_greater),
    ("GREATER", builtin_greater),

    ("PRINT", builtin_print),
];

/// Primitive names, aliases included, with the function each dispatches to.
pub(crate) fn builtin_table() -> &'static [(&'static str, Builtin)] {
    BUILTINS
}
