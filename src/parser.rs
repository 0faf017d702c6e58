//! Pratt parser building a [`Program`] from the token stream.
//!
//! Parsing always runs to the end of the input. Constructs that fail to
//! parse are dropped from the tree while a plain message is appended to the
//! error list; the driver decides whether the result is usable.

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Binding strength of operators, ascending.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum Precedence {
    Lowest,
    Equality,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::IsEqualTo | TokenKind::IsNotEqualTo => Precedence::Equality,
            TokenKind::LessThan | TokenKind::GreaterThan => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::ForwardSlash => Precedence::Product,
            TokenKind::LeftParenthesis => Precedence::Call,
            TokenKind::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

type PrefixFn = fn(&mut Parser) -> Option<Expr>;
type InfixFn = fn(&mut Parser, Expr) -> Option<Expr>;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<String>,
    prefix_fns: HashMap<TokenKind, PrefixFn>,
    infix_fns: HashMap<TokenKind, InfixFn>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Parser {
        let mut prefix_fns: HashMap<TokenKind, PrefixFn> = HashMap::new();
        prefix_fns.insert(TokenKind::Identifier, Parser::parse_identifier);
        prefix_fns.insert(TokenKind::Integer, Parser::parse_integer_literal);
        prefix_fns.insert(TokenKind::String, Parser::parse_string_literal);
        prefix_fns.insert(TokenKind::Bang, Parser::parse_prefix_expression);
        prefix_fns.insert(TokenKind::Minus, Parser::parse_prefix_expression);
        prefix_fns.insert(TokenKind::True, Parser::parse_boolean_literal);
        prefix_fns.insert(TokenKind::False, Parser::parse_boolean_literal);
        prefix_fns.insert(TokenKind::LeftParenthesis, Parser::parse_grouped_expression);
        prefix_fns.insert(TokenKind::If, Parser::parse_if_expression);
        prefix_fns.insert(TokenKind::Function, Parser::parse_function_literal);
        prefix_fns.insert(TokenKind::LeftBracket, Parser::parse_array_literal);
        prefix_fns.insert(TokenKind::LeftBrace, Parser::parse_hash_literal);

        let mut infix_fns: HashMap<TokenKind, InfixFn> = HashMap::new();
        infix_fns.insert(TokenKind::Plus, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::Minus, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::Asterisk, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::ForwardSlash, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::IsEqualTo, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::IsNotEqualTo, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::LessThan, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::GreaterThan, Parser::parse_infix_expression);
        infix_fns.insert(TokenKind::LeftParenthesis, Parser::parse_call_expression);
        infix_fns.insert(TokenKind::LeftBracket, Parser::parse_index_expression);

        let mut parser = Parser {
            lexer,
            current: Token::end(),
            peek: Token::end(),
            errors: vec![],
            prefix_fns,
            infix_fns,
        };

        // Prime both look-ahead slots.
        parser.advance();
        parser.advance();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = vec![];
        while self.current.kind != TokenKind::End {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }
        Program { statements }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.current.code.clone();
        if !self.expect_peek(TokenKind::Equals) {
            return None;
        }
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(Stmt::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        // The trailing semicolon is consumed even when the expression was
        // malformed, so parsing resumes cleanly at the next statement.
        let expression = self.parse_expression(Precedence::Lowest);
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        expression.map(Stmt::Expr)
    }

    /// The precedence-climbing core: parse a prefix, then fold in infix
    /// operators as long as they bind tighter than `precedence`.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let prefix = match self.prefix_fns.get(&self.current.kind) {
            Some(&function) => function,
            None => {
                self.errors.push(format!(
                    "no prefix parse function for {} found",
                    self.current.kind
                ));
                return None;
            }
        };
        let mut lhs = prefix(self)?;

        while self.peek.kind != TokenKind::Semicolon && precedence < Precedence::of(self.peek.kind)
        {
            let infix = match self.infix_fns.get(&self.peek.kind) {
                Some(&function) => function,
                None => return Some(lhs),
            };
            self.advance();
            lhs = infix(self, lhs)?;
        }
        Some(lhs)
    }

    fn parse_identifier(&mut self) -> Option<Expr> {
        Some(Expr::Identifier(self.current.code.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        match self.current.code.parse::<i64>() {
            Ok(value) => Some(Expr::Integer(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse \"{}\" as integer",
                    self.current.code
                ));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expr> {
        Some(Expr::Str(self.current.code.clone()))
    }

    fn parse_boolean_literal(&mut self) -> Option<Expr> {
        Some(Expr::Boolean(self.current.kind == TokenKind::True))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = match self.current.kind {
            TokenKind::Bang => PrefixOp::Bang,
            TokenKind::Minus => PrefixOp::Minus,
            _ => unreachable!("registered for Bang and Minus only"),
        };
        self.advance();
        let rhs = Box::new(self.parse_expression(Precedence::Prefix)?);
        Some(Expr::Prefix { op, rhs })
    }

    fn parse_infix_expression(&mut self, lhs: Expr) -> Option<Expr> {
        let op = match self.current.kind {
            TokenKind::Plus => InfixOp::Plus,
            TokenKind::Minus => InfixOp::Minus,
            TokenKind::Asterisk => InfixOp::Asterisk,
            TokenKind::ForwardSlash => InfixOp::Slash,
            TokenKind::IsEqualTo => InfixOp::Equal,
            TokenKind::IsNotEqualTo => InfixOp::NotEqual,
            TokenKind::LessThan => InfixOp::LessThan,
            TokenKind::GreaterThan => InfixOp::GreaterThan,
            _ => unreachable!("registered for binary operators only"),
        };
        let precedence = Precedence::of(self.current.kind);
        self.advance();
        let rhs = Box::new(self.parse_expression(precedence)?);
        Some(Expr::Infix {
            op,
            lhs: Box::new(lhs),
            rhs,
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.advance();
        let expression = self.parse_expression(Precedence::Lowest);
        if !self.expect_peek(TokenKind::RightParenthesis) {
            return None;
        }
        expression
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LeftParenthesis) {
            return None;
        }
        self.advance();
        let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
        if !self.expect_peek(TokenKind::RightParenthesis) {
            return None;
        }
        if !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let consequence = self.parse_block();
        let alternative = if self.peek.kind == TokenKind::Else {
            self.advance();
            if !self.expect_peek(TokenKind::LeftBrace) {
                return None;
            }
            Some(self.parse_block())
        } else {
            None
        };
        Some(Expr::If {
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LeftParenthesis) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let body = self.parse_block();
        Some(Expr::Function {
            parameters: Rc::new(parameters),
            body: Rc::new(body),
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = vec![];
        if self.peek.kind == TokenKind::RightParenthesis {
            self.advance();
            return Some(parameters);
        }
        self.advance();
        parameters.push(self.current.code.clone());
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            parameters.push(self.current.code.clone());
        }
        if !self.expect_peek(TokenKind::RightParenthesis) {
            return None;
        }
        Some(parameters)
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Option<Expr> {
        let arguments = self.parse_expression_list(TokenKind::RightParenthesis)?;
        Some(Expr::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        Some(Expr::Array(elements))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut expressions = vec![];
        if self.peek.kind == end {
            self.advance();
            return Some(expressions);
        }
        self.advance();
        expressions.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            expressions.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(expressions)
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.advance();
        let index = Box::new(self.parse_expression(Precedence::Lowest)?);
        if !self.expect_peek(TokenKind::RightBracket) {
            return None;
        }
        Some(Expr::Index {
            left: Box::new(left),
            index,
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = vec![];
        while self.peek.kind != TokenKind::RightBrace {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.peek.kind != TokenKind::RightBrace && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }
        if !self.expect_peek(TokenKind::RightBrace) {
            return None;
        }
        Some(Expr::Hash(pairs))
    }

    fn advance(&mut self) {
        self.current = mem::replace(&mut self.peek, self.lexer.next_token());
    }

    /// Advance over `kind` if it is next, or record an error and stay put.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek.kind == kind {
            self.advance();
            true
        } else {
            self.errors.push(format!(
                "expected next token to be {}, got {} instead",
                kind, self.peek.kind
            ));
            false
        }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("current", &self.current)
            .field("peek", &self.peek)
            .field("errors", &self.errors)
            .finish()
    }
}
