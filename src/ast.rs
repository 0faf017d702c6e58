//! Syntax tree produced by the parser.
//!
//! Every node can reproduce the token text it sprang from (`code`) and a
//! canonical reconstruction of its source (`Display`). The reconstruction
//! is what the parser tests assert against.

use std::fmt;
use std::rc::Rc;

/// Root node: the ordered statements of a script.
#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn code(&self) -> String {
        match self.statements.first() {
            Some(statement) => statement.code(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let { name: String, value: Expr },
    Return(Expr),
    Expr(Expr),
}

impl Stmt {
    pub fn code(&self) -> String {
        match self {
            Stmt::Let { .. } => "let".to_string(),
            Stmt::Return(_) => "return".to_string(),
            Stmt::Expr(expression) => expression.code(),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value),
            Stmt::Return(expression) => write!(f, "return {};", expression),
            Stmt::Expr(expression) => write!(f, "{};", expression),
        }
    }
}

/// Brace-delimited statement sequence, as found in `if` arms and function
/// bodies. Blocks are not statements of their own in this language.
#[derive(Debug, PartialEq, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOp {
    Bang,
    Minus,
}

impl PrefixOp {
    pub fn code(self) -> &'static str {
        match self {
            PrefixOp::Bang => "!",
            PrefixOp::Minus => "-",
        }
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
}

impl InfixOp {
    pub fn code(self) -> &'static str {
        match self {
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Asterisk => "*",
            InfixOp::Slash => "/",
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
            InfixOp::LessThan => "<",
            InfixOp::GreaterThan => ">",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Identifier(String),
    Integer(i64),
    Boolean(bool),
    Str(String),
    Prefix {
        op: PrefixOp,
        rhs: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    // Parameter list and body are shared with the function values that
    // capture them at evaluation time.
    Function {
        parameters: Rc<Vec<String>>,
        body: Rc<Block>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Array(Vec<Expr>),
    // Source order of the pairs is preserved.
    Hash(Vec<(Expr, Expr)>),
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
}

impl Expr {
    pub fn code(&self) -> String {
        match self {
            Expr::Identifier(name) => name.clone(),
            Expr::Integer(value) => value.to_string(),
            Expr::Boolean(value) => value.to_string(),
            Expr::Str(value) => value.clone(),
            Expr::Prefix { op, .. } => op.code().to_string(),
            Expr::Infix { op, .. } => op.code().to_string(),
            Expr::If { .. } => "if".to_string(),
            Expr::Function { .. } => "fn".to_string(),
            Expr::Call { .. } => "(".to_string(),
            Expr::Array(_) => "[".to_string(),
            Expr::Hash(_) => "{".to_string(),
            Expr::Index { .. } => "[".to_string(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Integer(value) => write!(f, "{}", value),
            Expr::Boolean(value) => write!(f, "{}", value),
            Expr::Str(value) => write!(f, "{}", value),
            Expr::Prefix { op, rhs } => write!(f, "({}{})", op, rhs),
            Expr::Infix { op, lhs, rhs } => write!(f, "({}{}{})", lhs, op, rhs),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} then {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function { parameters, body } => {
                write!(f, "fn({}){}", parameters.join(", "), body)
            }
            Expr::Call { callee, arguments } => {
                write!(f, "{}({})", callee, join_expressions(arguments, ", "))
            }
            Expr::Array(elements) => write!(f, "[{}]", join_expressions(elements, ", ")),
            Expr::Hash(pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(key, value)| format!("{}:{}", key, value))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
        }
    }
}

fn join_expressions(expressions: &[Expr], separator: &str) -> String {
    expressions
        .iter()
        .map(Expr::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_statement_reconstruction() {
        let program = Program {
            statements: vec![Stmt::Let {
                name: "myVar".to_string(),
                value: Expr::Identifier("anotherVar".to_string()),
            }],
        };
        assert_eq!(program.to_string(), "let myVar = anotherVar;");
        assert_eq!(program.code(), "let");
    }

    #[test]
    fn infix_reconstruction_has_no_spaces() {
        let expression = Expr::Infix {
            op: InfixOp::Plus,
            lhs: Box::new(Expr::Integer(1)),
            rhs: Box::new(Expr::Integer(2)),
        };
        assert_eq!(expression.to_string(), "(1+2)");
    }

    #[test]
    fn if_reconstruction() {
        let expression = Expr::If {
            condition: Box::new(Expr::Identifier("x".to_string())),
            consequence: Block {
                statements: vec![Stmt::Expr(Expr::Integer(1))],
            },
            alternative: Some(Block {
                statements: vec![Stmt::Expr(Expr::Integer(2))],
            }),
        };
        assert_eq!(expression.to_string(), "if x then {1;} else {2;}");
    }

    #[test]
    fn function_reconstruction() {
        let expression = Expr::Function {
            parameters: Rc::new(vec!["a".to_string(), "b".to_string()]),
            body: Rc::new(Block {
                statements: vec![Stmt::Expr(Expr::Infix {
                    op: InfixOp::Plus,
                    lhs: Box::new(Expr::Identifier("a".to_string())),
                    rhs: Box::new(Expr::Identifier("b".to_string())),
                })],
            }),
        };
        assert_eq!(expression.to_string(), "fn(a, b){(a+b);}");
    }

    #[test]
    fn collection_reconstruction() {
        let array = Expr::Array(vec![Expr::Integer(1), Expr::Integer(2)]);
        assert_eq!(array.to_string(), "[1, 2]");

        let hash = Expr::Hash(vec![(
            Expr::Str("age".to_string()),
            Expr::Integer(72),
        )]);
        assert_eq!(hash.to_string(), "{age:72}");

        let index = Expr::Index {
            left: Box::new(Expr::Identifier("xs".to_string())),
            index: Box::new(Expr::Integer(0)),
        };
        assert_eq!(index.to_string(), "(xs[0])");
    }
}
