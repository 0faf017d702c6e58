//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::eval::eval_program;
use crate::lexer::Lexer;
use crate::object::Env;
use crate::parser::Parser;

pub use crate::object::Value;

/// Tree-walk interpreter session.
///
/// The root environment persists across `run` calls, so definitions from
/// one invocation are visible to the next.
///
/// # Example
///
/// ```
/// use rmonkey::interpreter::Interpreter;
///
/// let mut interp = Interpreter::new();
///
/// let func_def = r#"
///     let max = fn(x, y) {
///         if (x > y) {
///             return x;
///         } else {
///             return y;
///         }
///     };
/// "#;
/// interp.run(func_def).expect("parse error");
///
/// let value = interp.run("max(10, 20);").expect("parse error");
/// assert_eq!(value.unwrap().to_string(), "20");
/// ```
#[derive(Debug)]
pub struct Interpreter {
    env: Rc<Env>,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter { env: Env::new() }
    }

    /// Lex, parse and evaluate a source string.
    ///
    /// Parser failures come back as [`SyntaxErrors`]; the program is not
    /// evaluated in that case. Runtime failures are ordinary
    /// [`Value::Error`] results. `Ok(None)` means the program produced no
    /// observable value.
    pub fn run(&mut self, source: &str) -> Result<Option<Value>, SyntaxErrors> {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(SyntaxErrors {
                messages: parser.into_errors(),
            });
        }
        Ok(eval_program(&program, &self.env))
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

/// The parser's accumulated error messages, in parse order.
#[derive(Debug)]
pub struct SyntaxErrors {
    messages: Vec<String>,
}

impl SyntaxErrors {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("\n"))
    }
}

impl Error for SyntaxErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Value {
        Interpreter::new()
            .run(input)
            .expect("unexpected parse errors")
            .expect("program produced no value")
    }

    #[test]
    fn conditional_on_bound_comparison() {
        let input = "let a = 5; let b = a > 3; let c = a * 99; if (b) { 10 } else { 1 };";
        assert_eq!(run(input).to_string(), "10");
    }

    #[test]
    fn function_definition_and_call() {
        let input = "let add = fn(a, b) { a + b }; add(1, 2);";
        assert_eq!(run(input).to_string(), "3");
    }

    #[test]
    fn early_return_across_nested_blocks() {
        let input =
            "let counter = fn(x) { if (x > 100) { return true; } else { counter(x + 1); } }; counter(0);";
        assert_eq!(run(input).to_string(), "true");
    }

    #[test]
    fn array_natives_compose() {
        let input = "let arr = [1, 2, 3, 4]; let f = first(arr); let r = rest(arr); push(r, 99)";
        assert_eq!(run(input).to_string(), "[2,3,99]");
    }

    #[test]
    fn hash_lookup() {
        let input = r#"let h = {"name": "Jimmy", "age": 72, "band": "Zeppelin"}; h["name"]"#;
        assert_eq!(run(input).to_string(), "Jimmy");
    }

    #[test]
    fn runtime_errors_are_values() {
        assert_eq!(
            run("5 + true;").to_string(),
            "Error: Type mismatch: Integer + Boolean"
        );
        assert_eq!(
            run("foobar;").to_string(),
            "Error: Identifier not found: foobar"
        );
    }

    #[test]
    fn parse_errors_preempt_evaluation() {
        let mut interp = Interpreter::new();
        let errors = interp.run("let x 5;").unwrap_err();
        assert_eq!(
            errors.messages(),
            &["expected next token to be Equals, got Integer instead".to_string()]
        );
    }

    #[test]
    fn definitions_persist_across_runs() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.run("let x = 2;").expect("parse error"), None);
        let value = interp
            .run("x * 21")
            .expect("parse error")
            .expect("no value");
        assert_eq!(value.to_string(), "42");
    }

    #[test]
    fn empty_source_produces_no_value() {
        assert_eq!(Interpreter::new().run("").expect("parse error"), None);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let input = "let f = fn(x) { x * 2 }; f(3) + f(4);";
        assert_eq!(run(input), run(input));
    }
}
