//! Recursive evaluator walking the syntax tree against an environment.
//!
//! Runtime failures are not `Err`s: they are `Value::Error` results that
//! short-circuit every rule on their way back to the driver. A `return`
//! travels the same way, wrapped in `Value::Return` until a program or call
//! boundary dissolves it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::object::{Env, Function, HashPair, Native, Type, Value};

/// Evaluate a whole program. `None` means the program produced nothing
/// observable (it was empty or ended in a `let`).
pub fn eval_program(program: &Program, env: &Rc<Env>) -> Option<Value> {
    let mut result = None;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Some(Value::Return(value)) => return Some(*value),
            Some(error @ Value::Error(_)) => return Some(error),
            other => result = other,
        }
    }
    result
}

fn eval_statement(statement: &Stmt, env: &Rc<Env>) -> Option<Value> {
    match statement {
        Stmt::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return Some(value);
            }
            env.set(name.clone(), value);
            None
        }
        Stmt::Return(expression) => {
            let value = eval_expression(expression, env);
            if value.is_error() {
                Some(value)
            } else {
                Some(Value::Return(Box::new(value)))
            }
        }
        Stmt::Expr(expression) => Some(eval_expression(expression, env)),
    }
}

/// Unlike `eval_program` this does not dissolve a return carrier: a `return`
/// nested in a block must reach the enclosing call boundary intact.
fn eval_block(block: &Block, env: &Rc<Env>) -> Option<Value> {
    let mut result = None;
    for statement in &block.statements {
        result = eval_statement(statement, env);
        if matches!(result, Some(Value::Return(_)) | Some(Value::Error(_))) {
            return result;
        }
    }
    result
}

fn eval_expression(expression: &Expr, env: &Rc<Env>) -> Value {
    match expression {
        Expr::Integer(value) => Value::Integer(*value),
        Expr::Boolean(value) => Value::Boolean(*value),
        Expr::Str(value) => Value::Str(Rc::new(value.clone())),
        Expr::Identifier(name) => eval_identifier(name, env),
        Expr::Prefix { op, rhs } => {
            let rhs = eval_expression(rhs, env);
            if rhs.is_error() {
                return rhs;
            }
            eval_prefix_expression(*op, rhs)
        }
        Expr::Infix { op, lhs, rhs } => {
            let lhs = eval_expression(lhs, env);
            if lhs.is_error() {
                return lhs;
            }
            let rhs = eval_expression(rhs, env);
            if rhs.is_error() {
                return rhs;
            }
            eval_infix_expression(*op, lhs, rhs)
        }
        Expr::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_ref(), env),
        Expr::Function { parameters, body } => Value::Function(Rc::new(Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        })),
        Expr::Call { callee, arguments } => {
            let callee = eval_expression(callee, env);
            if callee.is_error() {
                return callee;
            }
            match eval_expressions(arguments, env) {
                Ok(arguments) => apply_function(callee, arguments),
                Err(error) => error,
            }
        }
        Expr::Array(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Value::Array(Rc::new(elements)),
            Err(error) => error,
        },
        Expr::Index { left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expr::Hash(pairs) => eval_hash_literal(pairs, env),
    }
}

fn eval_identifier(name: &str, env: &Rc<Env>) -> Value {
    if let Some(value) = env.get(name) {
        return value;
    }
    if let Some(native) = lookup_native(name) {
        return Value::Native(native);
    }
    Value::Error(format!("Identifier not found: {}", name))
}

fn eval_prefix_expression(op: PrefixOp, rhs: Value) -> Value {
    match op {
        PrefixOp::Bang => Value::Boolean(!rhs.is_truthy()),
        PrefixOp::Minus => match rhs {
            Value::Integer(value) => Value::Integer(value.wrapping_neg()),
            other => Value::Error(format!("Wrong expression type: -{}", other.get_type())),
        },
    }
}

fn eval_infix_expression(op: InfixOp, lhs: Value, rhs: Value) -> Value {
    if let (Value::Integer(lhs), Value::Integer(rhs)) = (&lhs, &rhs) {
        return eval_integer_infix_expression(op, *lhs, *rhs);
    }
    match op {
        InfixOp::Equal => return Value::Boolean(lhs.ref_eq(&rhs)),
        InfixOp::NotEqual => return Value::Boolean(!lhs.ref_eq(&rhs)),
        _ => {}
    }
    if lhs.get_type() != rhs.get_type() {
        return Value::Error(format!(
            "Type mismatch: {} {} {}",
            lhs.get_type(),
            op,
            rhs.get_type()
        ));
    }
    if let (Value::Str(lhs), Value::Str(rhs)) = (&lhs, &rhs) {
        if op == InfixOp::Plus {
            return Value::Str(Rc::new(format!("{}{}", lhs, rhs)));
        }
    }
    Value::Error(format!(
        "Unknown operator: {} {} {}",
        lhs.get_type(),
        op,
        rhs.get_type()
    ))
}

fn eval_integer_infix_expression(op: InfixOp, lhs: i64, rhs: i64) -> Value {
    match op {
        InfixOp::Plus => Value::Integer(lhs.wrapping_add(rhs)),
        InfixOp::Minus => Value::Integer(lhs.wrapping_sub(rhs)),
        InfixOp::Asterisk => Value::Integer(lhs.wrapping_mul(rhs)),
        InfixOp::Slash => {
            if rhs == 0 {
                Value::Error("Division by zero".to_string())
            } else {
                Value::Integer(lhs.wrapping_div(rhs))
            }
        }
        InfixOp::LessThan => Value::Boolean(lhs < rhs),
        InfixOp::GreaterThan => Value::Boolean(lhs > rhs),
        InfixOp::Equal => Value::Boolean(lhs == rhs),
        InfixOp::NotEqual => Value::Boolean(lhs != rhs),
    }
}

fn eval_if_expression(
    condition: &Expr,
    consequence: &Block,
    alternative: Option<&Block>,
    env: &Rc<Env>,
) -> Value {
    let condition = eval_expression(condition, env);
    if condition.is_error() {
        return condition;
    }
    if condition.is_truthy() {
        eval_block(consequence, env).unwrap_or(Value::Null)
    } else if let Some(alternative) = alternative {
        eval_block(alternative, env).unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}

/// Evaluate left to right, stopping at the first error.
fn eval_expressions(expressions: &[Expr], env: &Rc<Env>) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let value = eval_expression(expression, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn apply_function(callee: Value, arguments: Vec<Value>) -> Value {
    match callee {
        Value::Function(function) => {
            if arguments.len() != function.parameters.len() {
                return Value::Error(format!(
                    "Wrong number of arguments; got {}, expected {}.",
                    arguments.len(),
                    function.parameters.len()
                ));
            }
            let env = Env::with_parent(function.env.clone());
            for (parameter, argument) in function.parameters.iter().zip(arguments) {
                env.set(parameter.clone(), argument);
            }
            match eval_block(&function.body, &env) {
                Some(Value::Return(value)) => *value,
                Some(value) => value,
                None => Value::Null,
            }
        }
        Value::Native(native) => (native.function)(&arguments),
        other => Value::Error(format!("Not a function: {}", other.get_type())),
    }
}

fn eval_index_expression(left: Value, index: Value) -> Value {
    match (&left, &index) {
        (Value::Array(elements), Value::Integer(position)) => {
            if *position < 0 || *position as usize >= elements.len() {
                Value::Null
            } else {
                elements[*position as usize].clone()
            }
        }
        (Value::Hash(pairs), _) => match index.hash_key() {
            Some(key) => match pairs.get(&key) {
                Some(pair) => pair.value.clone(),
                None => Value::Null,
            },
            None => Value::Error(format!("Unusable as hash key: {}", index.get_type())),
        },
        _ => Value::Error(format!("Index operator not supported: {}", left.get_type())),
    }
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &Rc<Env>) -> Value {
    let mut entries = HashMap::new();
    for (key_expression, value_expression) in pairs {
        let key = eval_expression(key_expression, env);
        if key.is_error() {
            return key;
        }
        let hash_key = match key.hash_key() {
            Some(hash_key) => hash_key,
            None => return Value::Error(format!("Unusable as hash key: {}", key.get_type())),
        };
        let value = eval_expression(value_expression, env);
        if value.is_error() {
            return value;
        }
        entries.insert(hash_key, HashPair { key, value });
    }
    Value::Hash(Rc::new(entries))
}

/// The fixed native function table, consulted after an environment miss so
/// user bindings can shadow natives.
fn lookup_native(name: &str) -> Option<Native> {
    let native = match name {
        "len" => Native {
            name: "len",
            function: native_len,
        },
        "first" => Native {
            name: "first",
            function: native_first,
        },
        "last" => Native {
            name: "last",
            function: native_last,
        },
        "rest" => Native {
            name: "rest",
            function: native_rest,
        },
        "push" => Native {
            name: "push",
            function: native_push,
        },
        _ => return None,
    };
    Some(native)
}

fn wrong_argument_count(name: &str, got: usize, expected: usize) -> Value {
    Value::Error(format!(
        "Wrong number of arguments to {}(); got {}, expected {}.",
        name, got, expected
    ))
}

fn native_len(arguments: &[Value]) -> Value {
    if arguments.len() != 1 {
        return wrong_argument_count("len", arguments.len(), 1);
    }
    match &arguments[0] {
        Value::Str(value) => Value::Integer(value.len() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        other => Value::Error(format!(
            "Argument type to len() not supported; got {}, expected {}.",
            other.get_type(),
            Type::String
        )),
    }
}

fn native_first(arguments: &[Value]) -> Value {
    if arguments.len() != 1 {
        return wrong_argument_count("first", arguments.len(), 1);
    }
    match &arguments[0] {
        Value::Array(elements) => match elements.first() {
            Some(element) => element.clone(),
            None => Value::Null,
        },
        other => Value::Error(format!(
            "Argument type to first() not supported; got {}, expected {}",
            other.get_type(),
            Type::Array
        )),
    }
}

fn native_last(arguments: &[Value]) -> Value {
    if arguments.len() != 1 {
        return wrong_argument_count("last", arguments.len(), 1);
    }
    match &arguments[0] {
        Value::Array(elements) => match elements.last() {
            Some(element) => element.clone(),
            None => Value::Null,
        },
        other => Value::Error(format!(
            "Argument type to last() not supported; got {}, expected {}",
            other.get_type(),
            Type::Array
        )),
    }
}

fn native_rest(arguments: &[Value]) -> Value {
    if arguments.len() != 1 {
        return wrong_argument_count("rest", arguments.len(), 1);
    }
    match &arguments[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                Value::Null
            } else {
                Value::Array(Rc::new(elements[1..].to_vec()))
            }
        }
        other => Value::Error(format!(
            "Argument type to rest() not supported; got {}, expected {}",
            other.get_type(),
            Type::Array
        )),
    }
}

fn native_push(arguments: &[Value]) -> Value {
    if arguments.len() != 2 {
        return wrong_argument_count("push", arguments.len(), 2);
    }
    match &arguments[0] {
        Value::Array(elements) => {
            let mut elements = elements.as_ref().clone();
            elements.push(arguments[1].clone());
            Value::Array(Rc::new(elements))
        }
        other => Value::Error(format!(
            "Argument type to push() not supported; got {}, expected {}",
            other.get_type(),
            Type::Array
        )),
    }
}
