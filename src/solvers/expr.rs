//! Small recursive-descent evaluator for the arithmetic that shows up in quiz
//! questions: numbers, `+ - * / ^`, parentheses, unary sign, implicit
//! multiplication and at most one bound variable.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown variable '{0}'")]
    UnknownVariable(char),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Bracket and sign nesting allowed before evaluation gives up.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Var(char),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    Evaluator::new(expr, None)?.run()
}

/// Evaluates `expr` with `var` bound to `value`.
pub fn evaluate_with(expr: &str, var: char, value: f64) -> Result<f64, EvalError> {
    Evaluator::new(expr, Some((var, value)))?.run()
}

fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {}
            '0'..='9' | '.' => {
                let start = i;
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..=i].iter().collect();
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::BadNumber(literal.clone()))?;
                tokens.push(Token::Num(n));
            }
            '+' => tokens.push(Token::Plus),
            '-' | '−' => tokens.push(Token::Minus),
            '*' | '×' | '·' => tokens.push(Token::Star),
            '/' | '÷' => tokens.push(Token::Slash),
            '^' => tokens.push(Token::Caret),
            '²' => {
                tokens.push(Token::Caret);
                tokens.push(Token::Num(2.0));
            }
            '³' => {
                tokens.push(Token::Caret);
                tokens.push(Token::Num(3.0));
            }
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if c.is_alphabetic() => tokens.push(Token::Var(c)),
            other => return Err(EvalError::UnexpectedChar(other)),
        }
        i += 1;
    }
    Ok(tokens)
}

struct Evaluator {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    binding: Option<(char, f64)>,
}

impl Evaluator {
    fn new(expr: &str, binding: Option<(char, f64)>) -> Result<Self, EvalError> {
        Ok(Self {
            tokens: tokenize(expr)?,
            pos: 0,
            depth: 0,
            binding,
        })
    }

    fn run(mut self) -> Result<f64, EvalError> {
        let value = self.expr()?;
        if let Some(tok) = self.peek() {
            return Err(EvalError::UnexpectedChar(token_char(tok)));
        }
        if !value.is_finite() {
            return Err(EvalError::NonFinite);
        }
        Ok(value)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    acc *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    acc /= divisor;
                }
                // 2x, 3(x + 1), (x + 1)(x - 1)
                Some(Token::Num(_) | Token::Var(_) | Token::LParen) => {
                    acc *= self.power()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let value = -self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Var(v)) => match self.binding {
                Some((name, value)) if name == v => Ok(value),
                _ => Err(EvalError::UnknownVariable(v)),
            },
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(EvalError::UnexpectedChar(token_char(tok))),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(EvalError::UnexpectedChar(token_char(tok))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

fn token_char(tok: Token) -> char {
    match tok {
        Token::Num(_) => '0',
        Token::Var(v) => v,
        Token::Plus => '+',
        Token::Minus => '-',
        Token::Star => '*',
        Token::Slash => '/',
        Token::Caret => '^',
        Token::LParen => '(',
        Token::RParen => ')',
    }
}
